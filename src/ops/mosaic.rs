// ============================================================================
// MOSAIC ATLAS FILTER
// ============================================================================
//
// Replaces each grid block of the source with one of 16 horizontally tiled
// atlas cells. The cell is chosen by the luminance of a single representative
// source sample taken at the block's center, after the tint offset is
// subtracted, so every pixel of a block reads the same cell. The atlas glyph
// is emitted verbatim; tint and source color only select which cell is used.
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

use super::{
    ATLAS_CELLS, FilterError, GridSpec, Sampling, Tint, check_atlas, check_source, sample_uv,
};

/// Map a clamped luminance in [0,1] to an atlas cell index in [0,15].
/// Luminance exactly 1.0 lands in the last cell, not one past it.
#[inline]
pub fn cell_index(luminance: f32) -> u32 {
    let lum = luminance.clamp(0.0, 1.0);
    ((lum * ATLAS_CELLS as f32).floor() as u32).min(ATLAS_CELLS - 1)
}

/// Weighted luminance of a tint-adjusted sample. `sample` is in 0..=255 per
/// channel; the `(1 - tint)` offset is subtracted before weighting, so a white
/// tint is the identity and darker tint components pull the result down.
#[inline]
pub fn tinted_luminance(sample: [f32; 4], tint: Tint) -> f32 {
    let r = sample[0] / 255.0 - (1.0 - tint.r);
    let g = sample[1] / 255.0 - (1.0 - tint.g);
    let b = sample[2] / 255.0 - (1.0 - tint.b);
    (0.3 * r + 0.59 * g + 0.11 * b).clamp(0.0, 1.0)
}

/// Apply the mosaic atlas filter.
///
/// `atlas` must be 16 equal-width cells tiled horizontally; its height is the
/// cell height. `sampling` controls atlas lookup only — the per-block source
/// sample is always a nearest read at the block center, edges clamped.
pub fn mosaic_core(
    source: &RgbaImage,
    atlas: &RgbaImage,
    grid: GridSpec,
    tint: Tint,
    sampling: Sampling,
) -> Result<RgbaImage, FilterError> {
    check_source(source)?;
    check_atlas(atlas)?;
    if grid.columns == 0 || grid.rows == 0 {
        return Err(FilterError::InvalidParameter(format!(
            "grid dimensions must be at least 1x1, got {}x{}",
            grid.columns, grid.rows
        )));
    }

    let w = source.width();
    let h = source.height();
    let cols = grid.columns as f32;
    let rows = grid.rows as f32;
    let (bw, bh) = grid.block_size();
    let cells = ATLAS_CELLS as f32;

    let stride = w as usize * 4;
    let mut dst_raw = vec![0u8; w as usize * h as usize * 4];

    dst_raw
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let v = (y as f32 + 0.5) / h as f32;
            let by = (v * rows).floor().min(rows - 1.0);
            for x in 0..w as usize {
                let u = (x as f32 + 0.5) / w as f32;
                let bx = (u * cols).floor().min(cols - 1.0);

                // One representative sample per block, at its center.
                let center_u = (bx + 0.5) * bw;
                let center_v = (by + 0.5) * bh;
                let s = sample_uv(source, center_u, center_v, Sampling::Nearest);
                let cell = cell_index(tinted_luminance(s, tint));

                // Map the block's local UV into the chosen cell: horizontal
                // axis compressed to one cell width, vertical axis spans the
                // full atlas height.
                let local_u = u - bx * bw;
                let local_v = v - by * bh;
                let au = local_u * cols / cells + cell as f32 / cells;
                let av = local_v * rows;

                let p = sample_uv(atlas, au, av, sampling);
                let pi = x * 4;
                row_out[pi] = p[0].round().clamp(0.0, 255.0) as u8;
                row_out[pi + 1] = p[1].round().clamp(0.0, 255.0) as u8;
                row_out[pi + 2] = p[2].round().clamp(0.0, 255.0) as u8;
                row_out[pi + 3] = p[3].round().clamp(0.0, 255.0) as u8;
            }
        });

    Ok(RgbaImage::from_raw(w, h, dst_raw).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn cell_index_endpoints() {
        assert_eq!(cell_index(0.0), 0);
        assert_eq!(cell_index(1.0), 15);
        assert_eq!(cell_index(0.5), 8);
    }

    #[test]
    fn white_tint_is_identity_for_luminance() {
        let lum = tinted_luminance([255.0, 255.0, 255.0, 255.0], Tint::WHITE);
        assert!((lum - 1.0).abs() < 1e-6);
        let lum = tinted_luminance([0.0, 0.0, 0.0, 255.0], Tint::WHITE);
        assert_eq!(lum, 0.0);
    }

    #[test]
    fn darker_tint_lowers_luminance() {
        let s = [200.0, 200.0, 200.0, 255.0];
        let full = tinted_luminance(s, Tint::WHITE);
        let dimmed = tinted_luminance(s, Tint::new(0.5, 0.5, 0.5, 1.0));
        assert!(dimmed < full);
    }

    proptest! {
        #[test]
        fn cell_index_in_range(lum in 0.0f32..=1.0) {
            prop_assert!(cell_index(lum) <= 15);
        }

        #[test]
        fn cell_index_monotonic(a in 0.0f32..=1.0, b in 0.0f32..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(cell_index(lo) <= cell_index(hi));
        }

        #[test]
        fn luminance_always_clamped(
            r in 0.0f32..=255.0,
            g in 0.0f32..=255.0,
            b in 0.0f32..=255.0,
            tr in 0.0f32..=1.0,
            tg in 0.0f32..=1.0,
            tb in 0.0f32..=1.0,
        ) {
            let lum = tinted_luminance([r, g, b, 255.0], Tint::new(tr, tg, tb, 1.0));
            prop_assert!((0.0..=1.0).contains(&lum));
        }
    }
}
