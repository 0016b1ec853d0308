// Integration tests for the mosaic / pixelation filters, built on small
// constructed images so every expected pixel is known exactly.

use chunky::ops::{GridSpec, Sampling, Tint, mosaic_core, pixelate_core};
use image::{Rgba, RgbaImage};

/// Solid fill of one color.
fn solid(w: u32, h: u32, px: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(w, h, px)
}

/// Distinct marker color for atlas cell `i`.
fn cell_color(i: u32) -> Rgba<u8> {
    Rgba([(i * 13) as u8, (255 - i * 9) as u8, (i * 17 + 5) as u8, 255])
}

/// Atlas of 16 horizontally tiled solid-color cells, `cell_w` pixels wide
/// each. With this atlas the mosaic output is piecewise-constant per block,
/// which makes cell selection directly observable.
fn solid_cell_atlas(cell_w: u32, height: u32) -> RgbaImage {
    let mut atlas = RgbaImage::new(cell_w * 16, height);
    for (x, _, px) in atlas.enumerate_pixels_mut() {
        *px = cell_color(x / cell_w);
    }
    atlas
}

fn grid(c: u32, r: u32) -> GridSpec {
    GridSpec::new(c, r).unwrap()
}

// ---------------------------------------------------------------------------
// Plain pixelation
// ---------------------------------------------------------------------------

#[test]
fn pixelate_uses_block_center_sample() {
    // 4x4 source with a unique color per pixel; grid (2,2) gives 2x2-pixel
    // blocks whose centers are UV (0.25, 0.25) etc., i.e. source pixel (1,1)
    // for block (0,0) and (3,3) for block (1,1).
    let mut source = RgbaImage::new(4, 4);
    for (x, y, px) in source.enumerate_pixels_mut() {
        *px = Rgba([(x * 4 + y) as u8 * 10, x as u8, y as u8, 255]);
    }

    let out = pixelate_core(&source, grid(2, 2)).unwrap();
    for y in 0..2 {
        for x in 0..2 {
            assert_eq!(out.get_pixel(x, y), source.get_pixel(1, 1));
            assert_eq!(out.get_pixel(x + 2, y + 2), source.get_pixel(3, 3));
        }
    }
}

#[test]
fn pixelate_is_piecewise_constant_per_block() {
    let mut source = RgbaImage::new(12, 12);
    for (x, y, px) in source.enumerate_pixels_mut() {
        *px = Rgba([(x * 21) as u8, (y * 21) as u8, (x + y) as u8, 255]);
    }

    let out = pixelate_core(&source, grid(3, 3)).unwrap();
    for by in 0..3u32 {
        for bx in 0..3u32 {
            let first = *out.get_pixel(bx * 4, by * 4);
            for y in by * 4..(by + 1) * 4 {
                for x in bx * 4..(bx + 1) * 4 {
                    assert_eq!(*out.get_pixel(x, y), first, "block ({},{})", bx, by);
                }
            }
        }
    }
}

#[test]
fn pixelate_is_idempotent() {
    let mut source = RgbaImage::new(10, 6);
    for (x, y, px) in source.enumerate_pixels_mut() {
        *px = Rgba([(x * 25) as u8, (y * 40) as u8, ((x * y) % 256) as u8, 255]);
    }

    let once = pixelate_core(&source, grid(3, 2)).unwrap();
    let twice = pixelate_core(&once, grid(3, 2)).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn pixelate_handles_grid_finer_than_source() {
    // More blocks than pixels on one axis: representative samples clamp
    // instead of reading out of range.
    let source = solid(3, 3, Rgba([7, 8, 9, 255]));
    let out = pixelate_core(&source, grid(4, 4)).unwrap();
    assert_eq!(out.dimensions(), (3, 3));
    assert!(out.pixels().all(|p| *p == Rgba([7, 8, 9, 255])));
}

#[test]
fn pixelate_rejects_zero_grid() {
    let source = solid(4, 4, Rgba([0, 0, 0, 255]));
    assert!(pixelate_core(&source, GridSpec { columns: 0, rows: 2 }).is_err());
    assert!(pixelate_core(&source, GridSpec { columns: 2, rows: 0 }).is_err());
}

// ---------------------------------------------------------------------------
// Mosaic atlas filter — cell selection
// ---------------------------------------------------------------------------

#[test]
fn mid_gray_selects_cell_eight() {
    // Luminance 128/255 ≈ 0.502 → floor(0.502 * 16) = 8, x-offset 8/16.
    let source = solid(16, 16, Rgba([128, 128, 128, 255]));
    let atlas = solid_cell_atlas(8, 8);

    let out = mosaic_core(&source, &atlas, grid(2, 2), Tint::WHITE, Sampling::Nearest).unwrap();
    assert!(out.pixels().all(|p| *p == cell_color(8)));
}

#[test]
fn full_white_clamps_to_last_cell() {
    // Luminance exactly 1.0 must land in cell 15, not one past the atlas.
    let source = solid(8, 8, Rgba([255, 255, 255, 255]));
    let atlas = solid_cell_atlas(4, 4);

    let out = mosaic_core(&source, &atlas, grid(2, 2), Tint::WHITE, Sampling::Nearest).unwrap();
    assert!(out.pixels().all(|p| *p == cell_color(15)));
}

#[test]
fn full_black_selects_first_cell() {
    let source = solid(8, 8, Rgba([0, 0, 0, 255]));
    let atlas = solid_cell_atlas(4, 4);

    let out = mosaic_core(&source, &atlas, grid(2, 2), Tint::WHITE, Sampling::Nearest).unwrap();
    assert!(out.pixels().all(|p| *p == cell_color(0)));
}

#[test]
fn darker_tint_selects_darker_cell() {
    let source = solid(8, 8, Rgba([255, 255, 255, 255]));
    let atlas = solid_cell_atlas(4, 4);

    // White source, 0.6-gray tint: luminance drops from 1.0 to ~0.6,
    // floor(0.6 * 16) = 9.
    let tint = Tint::new(0.6, 0.6, 0.6, 1.0);
    let out = mosaic_core(&source, &atlas, grid(2, 2), tint, Sampling::Nearest).unwrap();
    assert!(out.pixels().all(|p| *p == cell_color(9)));
}

#[test]
fn cell_selection_is_uniform_per_block() {
    // Each 4x4 block a different gray; with a solid-cell atlas the output
    // must be piecewise-constant per block.
    let mut source = RgbaImage::new(16, 8);
    for (x, y, px) in source.enumerate_pixels_mut() {
        let g = ((x / 4) * 60 + (y / 4) * 30) as u8;
        *px = Rgba([g, g, g, 255]);
    }
    let atlas = solid_cell_atlas(4, 4);

    let out = mosaic_core(&source, &atlas, grid(4, 2), Tint::WHITE, Sampling::Nearest).unwrap();
    for by in 0..2u32 {
        for bx in 0..4u32 {
            let first = *out.get_pixel(bx * 4, by * 4);
            for y in by * 4..(by + 1) * 4 {
                for x in bx * 4..(bx + 1) * 4 {
                    assert_eq!(*out.get_pixel(x, y), first, "block ({},{})", bx, by);
                }
            }
        }
    }
}

#[test]
fn single_block_grid_is_degenerate_solid_output() {
    let mut source = RgbaImage::new(8, 8);
    for (x, y, px) in source.enumerate_pixels_mut() {
        *px = Rgba([(x * 30) as u8, (y * 30) as u8, 0, 255]);
    }
    let atlas = solid_cell_atlas(4, 4);

    let out = mosaic_core(&source, &atlas, grid(1, 1), Tint::WHITE, Sampling::Nearest).unwrap();
    let first = *out.get_pixel(0, 0);
    assert!(out.pixels().all(|p| *p == first));
}

#[test]
fn output_matches_source_dimensions() {
    // Non-integer multiple of block size: 7x5 with a (2,2) grid still covers
    // every output pixel, blocks clamped at the edges.
    let source = solid(7, 5, Rgba([100, 100, 100, 255]));
    let atlas = solid_cell_atlas(8, 8);

    let out = mosaic_core(&source, &atlas, grid(2, 2), Tint::WHITE, Sampling::Nearest).unwrap();
    assert_eq!(out.dimensions(), (7, 5));
}

#[test]
fn bilinear_atlas_sampling_is_supported() {
    let source = solid(8, 8, Rgba([128, 128, 128, 255]));
    let atlas = solid_cell_atlas(8, 8);

    // Solid cells: bilinear interior samples match nearest in the cell body.
    let out = mosaic_core(&source, &atlas, grid(2, 2), Tint::WHITE, Sampling::Bilinear).unwrap();
    assert_eq!(*out.get_pixel(2, 2), cell_color(8));
}

// ---------------------------------------------------------------------------
// Mosaic atlas filter — parameter validation
// ---------------------------------------------------------------------------

#[test]
fn atlas_width_not_divisible_by_16_is_rejected() {
    let source = solid(8, 8, Rgba([0, 0, 0, 255]));
    let atlas = RgbaImage::new(100, 8);
    let err = mosaic_core(&source, &atlas, grid(2, 2), Tint::WHITE, Sampling::Nearest);
    assert!(err.is_err());
    assert!(err.unwrap_err().to_string().contains("invalid parameter"));
}

#[test]
fn zero_sized_images_are_rejected() {
    let atlas = solid_cell_atlas(4, 4);
    let empty = RgbaImage::new(0, 0);
    assert!(mosaic_core(&empty, &atlas, grid(2, 2), Tint::WHITE, Sampling::Nearest).is_err());
    assert!(
        mosaic_core(&solid(4, 4, Rgba([0; 4])), &empty, grid(2, 2), Tint::WHITE, Sampling::Nearest)
            .is_err()
    );
    assert!(pixelate_core(&empty, grid(2, 2)).is_err());
}

#[test]
fn zero_grid_is_rejected_without_clamping() {
    let source = solid(8, 8, Rgba([0, 0, 0, 255]));
    let atlas = solid_cell_atlas(4, 4);
    let bad = GridSpec { columns: 0, rows: 4 };
    assert!(mosaic_core(&source, &atlas, bad, Tint::WHITE, Sampling::Nearest).is_err());
}
