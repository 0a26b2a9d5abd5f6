//! Map attributes shown in the CO2 leakage views and their classification.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attributes that can be displayed as a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapAttribute {
    MigrationTimeSgas,
    MigrationTimeAmfg,
    MaxSgas,
    MaxAmfg,
    SgasPlume,
    AmfgPlume,
    Mass,
    Dissolved,
    Free,
}

/// Post-processing class of a map attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapType {
    MigrationTime,
    Max,
    Plume,
    Mass,
}

impl MapAttribute {
    pub const ALL: [MapAttribute; 9] = [
        MapAttribute::MigrationTimeSgas,
        MapAttribute::MigrationTimeAmfg,
        MapAttribute::MaxSgas,
        MapAttribute::MaxAmfg,
        MapAttribute::SgasPlume,
        MapAttribute::AmfgPlume,
        MapAttribute::Mass,
        MapAttribute::Dissolved,
        MapAttribute::Free,
    ];

    pub fn map_type(&self) -> MapType {
        match self {
            Self::MigrationTimeSgas | Self::MigrationTimeAmfg => MapType::MigrationTime,
            Self::MaxSgas | Self::MaxAmfg => MapType::Max,
            Self::SgasPlume | Self::AmfgPlume => MapType::Plume,
            Self::Mass | Self::Dissolved | Self::Free => MapType::Mass,
        }
    }
}

impl MapType {
    /// Plume indicators and migration times are never thresholded.
    pub fn is_thresholdable(&self) -> bool {
        !matches!(self, MapType::Plume | MapType::MigrationTime)
    }
}

/// Mapping from map attribute to the raw surface attribute name in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapAttributeNames {
    values: BTreeMap<MapAttribute, String>,
}

impl MapAttributeNames {
    pub fn get(&self, attribute: MapAttribute) -> Option<&str> {
        self.values.get(&attribute).map(String::as_str)
    }

    /// Find the map attribute whose raw surface name equals `surface_attribute`.
    pub fn find(&self, surface_attribute: &str) -> Option<MapAttribute> {
        self.values
            .iter()
            .find(|(_, name)| name.as_str() == surface_attribute)
            .map(|(attribute, _)| *attribute)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MapAttribute, &str)> {
        self.values.iter().map(|(a, n)| (*a, n.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for MapAttributeNames {
    fn default() -> Self {
        let values = [
            (MapAttribute::MigrationTimeSgas, "migrationtime_sgas"),
            (MapAttribute::MigrationTimeAmfg, "migrationtime_amfg"),
            (MapAttribute::MaxSgas, "max_sgas"),
            (MapAttribute::MaxAmfg, "max_amfg"),
            (MapAttribute::SgasPlume, "plume_sgas"),
            (MapAttribute::AmfgPlume, "plume_amfg"),
            (MapAttribute::Mass, "co2-mass-total"),
            (MapAttribute::Dissolved, "co2-mass-aqu-phase"),
            (MapAttribute::Free, "co2-mass-gas-phase"),
        ]
        .into_iter()
        .map(|(a, n)| (a, n.to_string()))
        .collect();
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_types() {
        assert_eq!(MapAttribute::Free.map_type(), MapType::Mass);
        assert_eq!(MapAttribute::AmfgPlume.map_type(), MapType::Plume);
        assert!(!MapType::MigrationTime.is_thresholdable());
        assert!(MapType::Max.is_thresholdable());
    }

    #[test]
    fn test_find_by_surface_attribute() {
        let names = MapAttributeNames::default();
        assert_eq!(names.find("co2-mass-total"), Some(MapAttribute::Mass));
        assert_eq!(names.find("max_sgas"), Some(MapAttribute::MaxSgas));
        assert_eq!(names.find("porosity"), None);
    }

    #[test]
    fn test_default_names_cover_every_attribute() {
        let names = MapAttributeNames::default();
        assert_eq!(names.len(), MapAttribute::ALL.len());
        for attribute in MapAttribute::ALL {
            let raw = names.get(attribute).unwrap();
            assert_eq!(names.find(raw), Some(attribute));
        }
        assert_eq!(names.find("plume_sgas"), Some(MapAttribute::SgasPlume));
    }

    #[test]
    fn test_deserialize_from_map() {
        let names: MapAttributeNames =
            serde_json::from_str(r#"{"max_sgas": "SGAS_MAX", "mass": "mass_total"}"#).unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names.get(MapAttribute::MaxSgas), Some("SGAS_MAX"));
        assert_eq!(names.find("mass_total"), Some(MapAttribute::Mass));
    }
}
