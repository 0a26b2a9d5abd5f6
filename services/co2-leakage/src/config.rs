//! Visualization configuration.
//!
//! Loaded from a YAML file, with a couple of environment overrides:
//!
//! ```yaml
//! unit: tons
//! image_url_prefix: /surface/image/
//! thresholds:
//!   max_sgas: 0.0000001
//!   mass: -1
//! attribute_names:
//!   max_sgas: max_sgas
//!   mass: co2-mass-total
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

use co2_common::{Co2Error, Co2Result, MapAttribute, MapAttributeNames, MapUnit};
use storage::DEFAULT_URL_PREFIX;

/// Settings shared by every surface published for one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    /// Unit mass surfaces are displayed in.
    pub unit: MapUnit,

    /// Prefix of image handles handed back to callers.
    pub image_url_prefix: String,

    /// Per-attribute display thresholds. Negative or absent means disabled.
    pub thresholds: BTreeMap<MapAttribute, f64>,

    /// Raw surface attribute name for each map attribute.
    pub attribute_names: MapAttributeNames,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            unit: MapUnit::default(),
            image_url_prefix: DEFAULT_URL_PREFIX.to_string(),
            thresholds: BTreeMap::new(),
            attribute_names: MapAttributeNames::default(),
        }
    }
}

impl VisualizationConfig {
    /// Load from a YAML file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Co2Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Co2Error::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_yaml(&contents)?;
        info!(path = %path.display(), unit = %config.unit, "Loaded visualization config");
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Co2Result<Self> {
        serde_yaml::from_str(contents).map_err(|e| Co2Error::Config(e.to_string()))
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Apply `CO2_MAP_UNIT` and `CO2_IMAGE_URL_PREFIX` if set.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("CO2_MAP_UNIT") {
            self.unit = MapUnit::from(val);
        }

        if let Ok(val) = std::env::var("CO2_IMAGE_URL_PREFIX") {
            self.image_url_prefix = val;
        }
    }

    /// Threshold for `attribute`, if enabled.
    pub fn threshold(&self, attribute: MapAttribute) -> Option<f64> {
        self.thresholds
            .get(&attribute)
            .copied()
            .filter(|t| *t >= 0.0)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Co2Result<()> {
        for (attribute, threshold) in &self.thresholds {
            if !threshold.is_finite() {
                return Err(Co2Error::Config(format!(
                    "threshold for {:?} must be finite, got {}",
                    attribute, threshold
                )));
            }
        }

        let mut seen = HashSet::new();
        for (attribute, name) in self.attribute_names.iter() {
            if !seen.insert(name) {
                return Err(Co2Error::Config(format!(
                    "surface attribute '{}' is mapped more than once (at {:?})",
                    name, attribute
                )));
            }
        }

        if let MapUnit::Other(tag) = &self.unit {
            warn!(unit = %tag, "Unknown map unit, mass surfaces will not be rescaled");
        }

        Ok(())
    }
}
