// ============================================================================
// IMAGE I/O — decode inputs to RGBA, encode filtered output per format
// ============================================================================

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tga::TgaEncoder;
use image::{DynamicImage, ImageError, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Raster output formats supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Png,
    Jpeg,
    Webp,
    Bmp,
    Tga,
    Tiff,
}

impl SaveFormat {
    /// Canonical file extension (lowercase, no dot).
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Webp => "webp",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Tga => "tga",
            SaveFormat::Tiff => "tiff",
        }
    }
}

/// TIFF compression mode for `encode_and_write`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    None,
    Lzw,
    Deflate,
}

/// Load any supported image file as an RGBA buffer.
pub fn load_rgba(path: &Path) -> Result<RgbaImage, String> {
    let img = image::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(img.to_rgba8())
}

/// Encode an RGBA image to `path` in the requested format.
/// `quality` applies to JPEG only (WEBP goes through the image crate's
/// lossless encoder); `tiff_compression` applies to TIFF only.
pub fn encode_and_write(
    image: &RgbaImage,
    path: &Path,
    format: SaveFormat,
    quality: u8,
    tiff_compression: TiffCompression,
) -> Result<(), ImageError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    match format {
        SaveFormat::Png => {
            let encoder = PngEncoder::new(&mut writer);
            #[allow(deprecated)]
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Jpeg => {
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
            encoder.encode(
                rgb_image.as_raw(),
                rgb_image.width(),
                rgb_image.height(),
                image::ColorType::Rgb8,
            )?;
        }
        SaveFormat::Webp => {
            let dyn_img = DynamicImage::ImageRgba8(image.clone());
            dyn_img.save(path)?;
        }
        SaveFormat::Bmp => {
            let mut encoder = BmpEncoder::new(&mut writer);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Tga => {
            let encoder = TgaEncoder::new(&mut writer);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Tiff => {
            let err_map = |e: tiff::TiffError| {
                ImageError::IoError(std::io::Error::other(format!("TIFF encode error: {}", e)))
            };
            let mut tiff_enc = tiff::encoder::TiffEncoder::new(&mut writer).map_err(err_map)?;
            match tiff_compression {
                TiffCompression::None => {
                    tiff_enc
                        .write_image::<tiff::encoder::colortype::RGBA8>(
                            image.width(),
                            image.height(),
                            image.as_raw(),
                        )
                        .map_err(err_map)?;
                }
                TiffCompression::Lzw => {
                    tiff_enc
                        .write_image_with_compression::<tiff::encoder::colortype::RGBA8, _>(
                            image.width(),
                            image.height(),
                            tiff::encoder::compression::Lzw,
                            image.as_raw(),
                        )
                        .map_err(err_map)?;
                }
                TiffCompression::Deflate => {
                    tiff_enc
                        .write_image_with_compression::<tiff::encoder::colortype::RGBA8, _>(
                            image.width(),
                            image.height(),
                            tiff::encoder::compression::Deflate::default(),
                            image.as_raw(),
                        )
                        .map_err(err_map)?;
                }
            }
        }
    }

    Ok(())
}
