//! Storage abstractions for the CO2 leakage visualization services.
//!
//! Provides:
//! - Raw surface sources ([`SurfaceStore`])
//! - Ensemble table sources ([`EnsembleTableProvider`])
//! - The write-once publish cache for surface images ([`SurfaceImageServer`])

pub mod surface_server;
pub mod surface_store;
pub mod table_provider;

pub use surface_server::{
    PublishCacheStats, PublishOutcome, PublishedSurface, SurfaceImageMeta, SurfaceImageServer,
    DEFAULT_URL_PREFIX,
};
pub use surface_store::{DirectorySurfaceStore, InMemorySurfaceStore, SurfaceStore};
pub use table_provider::{EnsembleTableProvider, InMemoryTableProvider, REALIZATION_COLUMN};
