// ============================================================================
// PLAIN PIXELATION FILTER
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

use super::{FilterError, GridSpec, Sampling, check_source, sample_uv};

/// Flood-fill each grid block with the source sample at its center.
///
/// Same block derivation as the mosaic filter, without the atlas indirection:
/// every pixel of a block emits the block-center sample directly, so the
/// output is piecewise-constant per block and re-applying the filter with the
/// same grid is a no-op.
pub fn pixelate_core(source: &RgbaImage, grid: GridSpec) -> Result<RgbaImage, FilterError> {
    check_source(source)?;
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

                let center_u = (bx + 0.5) * bw;
                let center_v = (by + 0.5) * bh;
                let p = sample_uv(source, center_u, center_v, Sampling::Nearest);

                let pi = x * 4;
                row_out[pi] = p[0] as u8;
                row_out[pi + 1] = p[1] as u8;
                row_out[pi + 2] = p[2] as u8;
                row_out[pi + 3] = p[3] as u8;
            }
        });

    Ok(RgbaImage::from_raw(w, h, dst_raw).unwrap())
}
