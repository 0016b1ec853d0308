// ============================================================================
// FILTER ENGINE — rayon-parallelized mosaic / pixelation filters
// ============================================================================
//
// Both filters are pure per-call transforms over RGBA buffers: every output
// pixel is an independent function of the inputs, so the kernels parallelize
// over output rows with no synchronization.
//
//   - Mosaic: each grid block is replaced by one of 16 atlas cells, chosen
//     by the block's luminance (see mosaic.rs).
//   - Pixelate: each grid block is flood-filled with its center sample.
// ============================================================================

pub mod mosaic;
pub mod pixelate;

pub use mosaic::mosaic_core;
pub use pixelate::pixelate_core;

use image::RgbaImage;

/// Number of horizontally tiled cells in a sprite atlas.
pub const ATLAS_CELLS: u32 = 16;

// ============================================================================
// PARAMETER TYPES
// ============================================================================

/// Mosaic grid resolution: how many blocks tile the output horizontally and
/// vertically. Both dimensions must be at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    pub columns: u32,
    pub rows: u32,
}

impl GridSpec {
    pub fn new(columns: u32, rows: u32) -> Result<Self, FilterError> {
        if columns == 0 || rows == 0 {
            return Err(FilterError::InvalidParameter(format!(
                "grid dimensions must be at least 1x1, got {}x{}",
                columns, rows
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Derive the grid from the ratio of output resolution to atlas-cell
    /// resolution, so each block maps 1:1 onto an atlas cell's pixels.
    /// Floors the ratio; images smaller than one cell get a 1-block axis.
    pub fn from_atlas(out_w: u32, out_h: u32, atlas: &RgbaImage) -> Result<Self, FilterError> {
        let cell_w = check_atlas(atlas)?;
        if out_w == 0 || out_h == 0 {
            return Err(FilterError::InvalidParameter(
                "output dimensions must be positive".to_string(),
            ));
        }
        Ok(Self {
            columns: (out_w / cell_w).max(1),
            rows: (out_h / atlas.height()).max(1),
        })
    }

    /// Block extent in normalized UV units: the exact reciprocal of the grid.
    pub fn block_size(&self) -> (f32, f32) {
        (1.0 / self.columns as f32, 1.0 / self.rows as f32)
    }
}

/// RGBA tint in [0,1]^4, applied as a subtractive offset against the sampled
/// source color: `sample - (1 - tint)`. White is the identity; darker tint
/// components pull the sample (and therefore its luminance) down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tint {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Tint {
    pub const WHITE: Tint = Tint { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: a.clamp(0.0, 1.0),
        }
    }
}

/// Atlas sampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sampling {
    #[default]
    Nearest,
    Bilinear,
}

// ============================================================================
// ERRORS
// ============================================================================

/// Error type for filter parameter validation. Validation runs before any
/// pixel work; a failed call produces no partial output.
#[derive(Debug)]
pub enum FilterError {
    InvalidParameter(String),
}

impl std::fmt::Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterError::InvalidParameter(msg) => write!(f, "invalid parameter: {}", msg),
        }
    }
}

impl std::error::Error for FilterError {}

/// Validate source dimensions. Shared by both filter entry points.
pub(crate) fn check_source(source: &RgbaImage) -> Result<(), FilterError> {
    if source.width() == 0 || source.height() == 0 {
        return Err(FilterError::InvalidParameter(
            "source image must have positive dimensions".to_string(),
        ));
    }
    Ok(())
}

/// Validate the atlas shape and return the cell width in pixels.
pub(crate) fn check_atlas(atlas: &RgbaImage) -> Result<u32, FilterError> {
    if atlas.width() == 0 || atlas.height() == 0 {
        return Err(FilterError::InvalidParameter(
            "atlas image must have positive dimensions".to_string(),
        ));
    }
    if atlas.width() % ATLAS_CELLS != 0 {
        return Err(FilterError::InvalidParameter(format!(
            "atlas width {} is not divisible by {} cells",
            atlas.width(),
            ATLAS_CELLS
        )));
    }
    Ok(atlas.width() / ATLAS_CELLS)
}

// ============================================================================
// SHARED SAMPLERS
// ============================================================================

/// Clamped integer-coordinate sample, as [f32; 4] in 0..=255.
#[inline]
pub(crate) fn sample_clamped(img: &RgbaImage, x: i32, y: i32) -> [f32; 4] {
    let cx = x.clamp(0, img.width() as i32 - 1) as u32;
    let cy = y.clamp(0, img.height() as i32 - 1) as u32;
    let p = img.get_pixel(cx, cy);
    [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32]
}

/// Bilinear-sample at fractional pixel coordinates, edges clamped.
#[inline]
pub(crate) fn sample_bilinear(img: &RgbaImage, fx: f32, fy: f32) -> [f32; 4] {
    let x0 = fx.floor() as i32;
    let y0 = fy.floor() as i32;
    let x1 = x0 + 1;
    let y1 = y0 + 1;
    let dx = fx - x0 as f32;
    let dy = fy - y0 as f32;

    let p00 = sample_clamped(img, x0, y0);
    let p10 = sample_clamped(img, x1, y0);
    let p01 = sample_clamped(img, x0, y1);
    let p11 = sample_clamped(img, x1, y1);

    let mut out = [0.0f32; 4];
    for c in 0..4 {
        out[c] = p00[c] * (1.0 - dx) * (1.0 - dy)
            + p10[c] * dx * (1.0 - dy)
            + p01[c] * (1.0 - dx) * dy
            + p11[c] * dx * dy;
    }
    out
}

/// Sample an image at normalized UV coordinates with the given filter,
/// returning [f32; 4] in 0..=255. UVs outside [0,1) resolve via clamping.
#[inline]
pub(crate) fn sample_uv(img: &RgbaImage, u: f32, v: f32, sampling: Sampling) -> [f32; 4] {
    let w = img.width() as f32;
    let h = img.height() as f32;
    match sampling {
        Sampling::Nearest => {
            let x = (u * w).floor() as i32;
            let y = (v * h).floor() as i32;
            sample_clamped(img, x, y)
        }
        Sampling::Bilinear => {
            // Pixel-center convention: UV 0.5/w lands exactly on texel 0.
            sample_bilinear(img, u * w - 0.5, v * h - 0.5)
        }
    }
}
