//! Image encoding for published surfaces.
//!
//! - `png`: minimal RGBA PNG writer
//! - `surface_png`: packs a masked float grid into RGBA pixels so the
//!   client can recover values from the image and its color range

pub mod png;
pub mod surface_png;

pub use png::create_png;
pub use surface_png::{decode_value, encode_surface_png, encode_surface_rgba, MAX_QUANTIZED};
