//! CO2 leakage data core.
//!
//! Turns raw per-realization surfaces into published, display-ready
//! surfaces and turns raw containment tables into scaled summaries.
//!
//! - [`publishing`]: surface publish-and-describe over the write-once cache
//! - [`containment`]: containment table validation, menus and scaled views
//! - [`scale`]: unit and normalization factors
//! - [`config`]: visualization settings

pub mod config;
pub mod containment;
pub mod publishing;
pub mod scale;

pub use config::VisualizationConfig;
pub use containment::{ContainmentDataProvider, MenuOptions, REQUIRED_COLUMNS};
pub use publishing::{PublishedSurfaceInfo, SurfacePublisher, SurfaceRequest};
pub use scale::{apply_divisor, resolve};
