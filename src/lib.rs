//! chunky — mosaic / pixelation image filters with a headless batch CLI.
//!
//! The mosaic filter replaces each block of a grid laid over the source image
//! with one of 16 sprite-atlas cells, chosen by the block's tint-adjusted
//! luminance. The pixelation filter flood-fills each block with its center
//! sample. Both are pure per-call transforms over RGBA buffers.

pub mod cli;
pub mod io;
pub mod logger;
pub mod ops;

pub use ops::{FilterError, GridSpec, Sampling, Tint, mosaic_core, pixelate_core};
