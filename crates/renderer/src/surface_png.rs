//! Float surface → RGBA PNG packing.
//!
//! Each valid cell value is linearly quantized over the color range into a
//! 24-bit integer and stored big-endian in the R, G and B channels with
//! alpha 255. Masked cells are fully transparent. Image rows run north to
//! south, so grid row `nrow - 1` is the first scanline.

use rayon::prelude::*;
use tracing::debug;

use co2_common::{Co2Error, Co2Result, MaskedGrid};

use crate::png::create_png;

/// Largest quantized value that fits in 24 bits.
pub const MAX_QUANTIZED: u32 = (1 << 24) - 1;

/// Minimum pixels to benefit from parallel packing
const PARALLEL_THRESHOLD: usize = 4096;

/// Pack a grid into RGBA pixels using `color_range` for quantization.
pub fn encode_surface_rgba(grid: &MaskedGrid, color_range: (f64, f64)) -> Vec<u8> {
    let (ncol, nrow) = (grid.spec.ncol, grid.spec.nrow);
    let (lo, hi) = color_range;
    let span = hi - lo;

    let encode_row = |(image_row, out): (usize, &mut [u8])| {
        let grid_row = nrow - 1 - image_row;
        for col in 0..ncol {
            let px = &mut out[col * 4..col * 4 + 4];
            match grid.get(grid_row, col) {
                Some(v) => {
                    let t = if span > 0.0 {
                        ((v - lo) / span).clamp(0.0, 1.0)
                    } else {
                        0.0
                    };
                    let q = (t * MAX_QUANTIZED as f64).round() as u32;
                    px.copy_from_slice(&[(q >> 16) as u8, (q >> 8) as u8, q as u8, 255]);
                }
                None => px.copy_from_slice(&[0, 0, 0, 0]),
            }
        }
    };

    let mut pixels = vec![0u8; ncol * nrow * 4];
    if ncol == 0 || nrow == 0 {
        return pixels;
    }
    if ncol * nrow >= PARALLEL_THRESHOLD {
        pixels
            .par_chunks_mut(ncol * 4)
            .enumerate()
            .for_each(encode_row);
    } else {
        pixels.chunks_mut(ncol * 4).enumerate().for_each(encode_row);
    }
    pixels
}

/// Encode a grid as a PNG image.
pub fn encode_surface_png(grid: &MaskedGrid, color_range: (f64, f64)) -> Co2Result<Vec<u8>> {
    let pixels = encode_surface_rgba(grid, color_range);
    let png = create_png(&pixels, grid.spec.ncol, grid.spec.nrow).map_err(Co2Error::Encoding)?;
    debug!(
        width = grid.spec.ncol,
        height = grid.spec.nrow,
        bytes = png.len(),
        "Encoded surface PNG"
    );
    Ok(png)
}

/// Recover a value from an encoded pixel, `None` for transparent pixels.
pub fn decode_value(pixel: [u8; 4], color_range: (f64, f64)) -> Option<f64> {
    if pixel[3] == 0 {
        return None;
    }
    let q = (u32::from(pixel[0]) << 16) | (u32::from(pixel[1]) << 8) | u32::from(pixel[2]);
    let (lo, hi) = color_range;
    Some(lo + (hi - lo) * q as f64 / MAX_QUANTIZED as f64)
}
