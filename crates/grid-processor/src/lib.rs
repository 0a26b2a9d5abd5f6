//! Surface Grid Processing
//!
//! This crate holds the grid computations behind the CO2 leakage maps:
//!
//! - **Smoothing**: separable Gaussian filter over a masked surface
//! - **Plume truncation**: per-cell count of the realizations in which the
//!   smoothed plume indicator exceeds a threshold
//!
//! # Architecture
//!
//! ```text
//! Per-realization surfaces (missing ones already dropped)
//!      │
//!      ▼
//! truncate_surfaces(surfaces, threshold, smoothing)
//!      │
//!      ├─► (parallel) fill masked cells with 0
//!      │         │
//!      │         ├─► gaussian_smooth (skipped when smoothing <= 0)
//!      │         │
//!      │         └─► indicator: value > threshold
//!      │
//!      ├─► Sum indicators cell-wise
//!      │
//!      └─► Mask cells with count < 1e-4
//!               │
//!               ▼
//!          PlumeCount { grid, plume_count }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_processor::truncate_surfaces;
//!
//! if let Some(count) = truncate_surfaces(&surfaces, 0.01, 2.0)? {
//!     println!("{} realizations contributed", count.plume_count);
//! }
//! ```

pub mod smoothing;
pub mod truncation;

pub use smoothing::gaussian_smooth;
pub use truncation::{truncate_surfaces, PlumeCount, COUNT_EPSILON};
