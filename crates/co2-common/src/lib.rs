//! Common types shared across the CO2 leakage crates.

pub mod address;
pub mod attribute;
pub mod error;
pub mod grid;
pub mod scale;
pub mod table;

pub use address::{
    QualifiedSurfaceAddress, SurfaceAddress, SurfaceKey, SurfaceSelector, SurfaceStatistic,
    TruncatedSurfaceAddress,
};
pub use attribute::{MapAttribute, MapAttributeNames, MapType};
pub use error::{Co2Error, Co2Result};
pub use grid::{GridSpec, MaskedGrid};
pub use scale::{Co2MassScale, Co2Scale, Co2VolumeScale, MapUnit};
pub use table::{Column, TableFrame};
