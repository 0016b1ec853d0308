// ============================================================================
// chunky CLI — headless batch mosaic / pixelation processing
// ============================================================================
//
// Usage examples:
//   chunky --input photo.png --atlas glyphs.png --output result.png
//   chunky -i photo.png --atlas glyphs.png --columns 80 --rows 45 --tint "#c0ffee"
//   chunky -i "*.jpg" --atlas glyphs.png --output-dir processed/ --format png
//   chunky -i photo.png --effect pixelate --columns 64 --rows 36 -o blocky.png
//
// All processing runs on the current process; the filter kernels themselves
// parallelize across rows via rayon.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use image::RgbaImage;

use crate::io::{SaveFormat, TiffCompression, encode_and_write, load_rgba};
use crate::ops::{GridSpec, Sampling, Tint, mosaic_core, pixelate_core};
use crate::{log_err, log_info};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// chunky headless image processor.
///
/// Apply the mosaic atlas filter or plain pixelation to image files — no GUI,
/// batch-friendly.
#[derive(Parser, Debug)]
#[command(
    name = "chunky",
    about = "Mosaic / pixelation batch image processor",
    long_about = "Replace each block of an image with a sprite-atlas cell chosen by the\n\
                  block's luminance (mosaic), or flood-fill blocks with their center\n\
                  sample (pixelate). Supports PNG, JPEG, WEBP, BMP, TGA, and TIFF.\n\n\
                  Example:\n  \
                  chunky --input photo.png --atlas glyphs.png --output result.png\n  \
                  chunky -i \"*.jpg\" --atlas glyphs.png --output-dir out/ --format png"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Sprite atlas image: 16 equal-width cells tiled horizontally, ordered
    /// dark to bright. Required for the mosaic effect.
    #[arg(short, long, value_name = "ATLAS.png")]
    pub atlas: Option<PathBuf>,

    /// Effect to apply: mosaic (atlas lookup) or pixelate (block fill).
    #[arg(short, long, default_value = "mosaic", value_name = "EFFECT")]
    pub effect: String,

    /// Mosaic grid columns. For the mosaic effect this defaults to
    /// image-width / atlas-cell-width; pixelate requires it explicitly.
    #[arg(long, value_name = "N")]
    pub columns: Option<u32>,

    /// Mosaic grid rows. For the mosaic effect this defaults to
    /// image-height / atlas-height; pixelate requires it explicitly.
    #[arg(long, value_name = "N")]
    pub rows: Option<u32>,

    /// Tint color as #RRGGBB or #RRGGBBAA. Subtractively biases the sampled
    /// color before cell selection; white (the default) is a no-op.
    #[arg(short, long, default_value = "#ffffff", value_name = "COLOR")]
    pub tint: String,

    /// Atlas sampling filter: nearest or bilinear (default: nearest).
    #[arg(long, default_value = "nearest", value_name = "FILTER")]
    pub sampling: String,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here with the original stem and the target format's extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, jpeg, webp, bmp, tga, tiff.
    /// When omitted, the format is inferred from --output's extension, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1–100, default 90).
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// TIFF compression mode: none, lzw, deflate (default: none).
    #[arg(long, default_value = "none", value_name = "MODE")]
    pub tiff_compression: String,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Which filter the CLI dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    Mosaic,
    Pixelate,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    // Resolve glob patterns / literal paths → concrete PathBufs
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    // Multiple inputs require --output-dir, not --output
    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let effect = match args.effect.to_lowercase().as_str() {
        "mosaic" => Effect::Mosaic,
        "pixelate" => Effect::Pixelate,
        other => {
            eprintln!("error: unknown effect '{}' (expected mosaic or pixelate).", other);
            return ExitCode::FAILURE;
        }
    };

    let sampling = match args.sampling.to_lowercase().as_str() {
        "bilinear" => Sampling::Bilinear,
        _ => Sampling::Nearest,
    };

    let tint = match parse_tint(&args.tint) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: invalid --tint '{}': {}", args.tint, e);
            return ExitCode::FAILURE;
        }
    };

    // Parse format and compression settings
    let save_format = parse_format(args.format.as_deref(), args.output.as_deref());
    let tiff_compression = match args.tiff_compression.to_lowercase().as_str() {
        "lzw"     => TiffCompression::Lzw,
        "deflate" => TiffCompression::Deflate,
        _         => TiffCompression::None,
    };

    // Load the atlas once for the whole batch
    let atlas: Option<RgbaImage> = match (effect, &args.atlas) {
        (Effect::Mosaic, Some(path)) => match load_rgba(path) {
            Ok(img) => Some(img),
            Err(e) => {
                eprintln!("error: could not load atlas: {}", e);
                return ExitCode::FAILURE;
            }
        },
        (Effect::Mosaic, None) => {
            eprintln!("error: the mosaic effect requires --atlas.");
            return ExitCode::FAILURE;
        }
        (Effect::Pixelate, _) => {
            if args.columns.is_none() || args.rows.is_none() {
                eprintln!("error: the pixelate effect requires --columns and --rows.");
                return ExitCode::FAILURE;
            }
            None
        }
    };

    // Create output directory if specified
    if let Some(dir) = &args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "error: could not create output directory '{}': {}",
                dir.display(), e
            );
            return ExitCode::FAILURE;
        }
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;
    log_info!("batch start: {} file(s), effect={:?}", total, effect);

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();

        // Determine output path
        let output_path = match build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            save_format,
        ) {
            Some(p) => p,
            None => {
                eprintln!(
                    "  error: cannot determine output path for '{}'.",
                    input_path.display()
                );
                any_failure = true;
                continue;
            }
        };

        match run_one(
            input_path,
            &output_path,
            effect,
            atlas.as_ref(),
            args.columns,
            args.rows,
            tint,
            sampling,
            save_format,
            args.quality,
            tiff_compression,
        ) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                log_err!("{}: {}", input_path.display(), e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    input:            &Path,
    output:           &Path,
    effect:           Effect,
    atlas:            Option<&RgbaImage>,
    columns:          Option<u32>,
    rows:             Option<u32>,
    tint:             Tint,
    sampling:         Sampling,
    format:           SaveFormat,
    quality:          u8,
    tiff_compression: TiffCompression,
) -> Result<(), String> {
    // -- Step 1: Load ----------------------------------------------------
    let source = load_rgba(input).map_err(|e| format!("load failed: {}", e))?;

    // -- Step 2: Filter --------------------------------------------------
    let result = match effect {
        Effect::Mosaic => {
            let atlas = atlas.ok_or("atlas missing")?;
            let grid = resolve_grid(&source, atlas, columns, rows)
                .map_err(|e| e.to_string())?;
            mosaic_core(&source, atlas, grid, tint, sampling).map_err(|e| e.to_string())?
        }
        Effect::Pixelate => {
            // run() already guaranteed both dimensions are present.
            let grid = GridSpec::new(columns.unwrap_or(1), rows.unwrap_or(1))
                .map_err(|e| e.to_string())?;
            pixelate_core(&source, grid).map_err(|e| e.to_string())?
        }
    };

    // -- Step 3: Save ----------------------------------------------------
    encode_and_write(&result, output, format, quality, tiff_compression)
        .map_err(|e| format!("save failed: {}", e))?;

    Ok(())
}

/// Per-axis grid resolution: explicit flags win, missing axes derive from
/// the atlas-cell resolution of this image.
fn resolve_grid(
    source: &RgbaImage,
    atlas: &RgbaImage,
    columns: Option<u32>,
    rows: Option<u32>,
) -> Result<GridSpec, crate::ops::FilterError> {
    let derived = GridSpec::from_atlas(source.width(), source.height(), atlas)?;
    GridSpec::new(
        columns.unwrap_or(derived.columns),
        rows.unwrap_or(derived.rows),
    )
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            // Literal path — use directly
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        // Treat as glob pattern
        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Choose the [`SaveFormat`] from the `--format` string or infer it from the
/// output file extension. Defaults to PNG when neither is known.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> SaveFormat {
    if let Some(f) = format_arg {
        return match f.to_lowercase().as_str() {
            "jpeg" | "jpg" => SaveFormat::Jpeg,
            "webp"         => SaveFormat::Webp,
            "bmp"          => SaveFormat::Bmp,
            "tga"          => SaveFormat::Tga,
            "tiff" | "tif" => SaveFormat::Tiff,
            _              => SaveFormat::Png,
        };
    }

    if let Some(out) = output {
        return match out
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "jpg" | "jpeg" => SaveFormat::Jpeg,
            "webp"         => SaveFormat::Webp,
            "bmp"          => SaveFormat::Bmp,
            "tga"          => SaveFormat::Tga,
            "tiff" | "tif" => SaveFormat::Tiff,
            _              => SaveFormat::Png,
        };
    }

    SaveFormat::Png
}

/// Parse a `#RRGGBB` / `#RRGGBBAA` hex color into a [`Tint`].
fn parse_tint(s: &str) -> Result<Tint, String> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 && hex.len() != 8 {
        return Err("expected 6 or 8 hex digits".to_string());
    }
    let byte = |i: usize| -> Result<f32, String> {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map(|b| b as f32 / 255.0)
            .map_err(|_| format!("'{}' is not a hex byte", &hex[i..i + 2]))
    };
    let r = byte(0)?;
    let g = byte(2)?;
    let b = byte(4)?;
    let a = if hex.len() == 8 { byte(6)? } else { 1.0 };
    Ok(Tint::new(r, g, b, a))
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: same directory as input, same stem, new extension
///    (appends `_out` to stem if it would collide with the input path)
fn build_output_path(
    input:      &Path,
    output:     Option<&Path>,
    output_dir: Option<&Path>,
    format:     SaveFormat,
) -> Option<PathBuf> {
    // Explicit output path
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext  = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    // Write next to the input file
    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.{}", stem, ext));

    // Avoid silent overwrite of the input
    if candidate == input {
        Some(parent.join(format!("{}_out.{}", stem, ext)))
    } else {
        Some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tint_parses_hex_forms() {
        assert_eq!(parse_tint("#ffffff").unwrap(), Tint::WHITE);
        assert_eq!(parse_tint("ffffff").unwrap(), Tint::WHITE);
        let t = parse_tint("#00000080").unwrap();
        assert_eq!((t.r, t.g, t.b), (0.0, 0.0, 0.0));
        assert!((t.a - 128.0 / 255.0).abs() < 1e-6);
        assert!(parse_tint("#fff").is_err());
        assert!(parse_tint("#gggggg").is_err());
    }

    #[test]
    fn format_inferred_from_output_extension() {
        assert_eq!(parse_format(None, Some(Path::new("a.jpg"))), SaveFormat::Jpeg);
        assert_eq!(parse_format(None, Some(Path::new("a.tif"))), SaveFormat::Tiff);
        assert_eq!(parse_format(None, None), SaveFormat::Png);
        assert_eq!(parse_format(Some("webp"), Some(Path::new("a.png"))), SaveFormat::Webp);
    }

    #[test]
    fn output_path_avoids_clobbering_input() {
        let p = build_output_path(Path::new("dir/pic.png"), None, None, SaveFormat::Png);
        assert_eq!(p.unwrap(), PathBuf::from("dir/pic_out.png"));
        let p = build_output_path(Path::new("dir/pic.jpg"), None, None, SaveFormat::Png);
        assert_eq!(p.unwrap(), PathBuf::from("dir/pic.png"));
    }
}
