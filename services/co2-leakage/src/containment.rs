//! Containment table access.
//!
//! [`ContainmentDataProvider`] wraps an [`EnsembleTableProvider`] holding
//! per-realization CO2 containment amounts. The schema is checked once at
//! construction; menu options are derived from the first realization only.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use co2_common::{Co2Error, Co2MassScale, Co2Result, Co2Scale, Column, TableFrame};
use storage::EnsembleTableProvider;

use crate::scale::{apply_divisor, nonzero_max, resolve, AMOUNT_COLUMN};

/// Columns every containment table must have.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "date",
    "amount",
    "phase",
    "containment",
    "zone",
    "region",
    "plume_group",
];

/// Sentinel meaning "aggregated over this dimension".
pub const ALL: &str = "all";

const AGGREGATE_COLUMNS: [&str; 3] = ["zone", "region", "plume_group"];

/// Selectable values for each categorical filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuOptions {
    pub zones: Vec<String>,
    pub regions: Vec<String>,
    pub phases: Vec<String>,
    pub plume_groups: Vec<String>,
}

/// Validated view over a containment table.
pub struct ContainmentDataProvider {
    provider: Arc<dyn EnsembleTableProvider>,
    menu_options: MenuOptions,
}

impl ContainmentDataProvider {
    /// Validate the table and derive its menu options.
    ///
    /// Fails with [`Co2Error::EmptyTable`] when the provider has no
    /// realizations and [`Co2Error::ContainmentValidation`] when required
    /// columns are missing.
    pub fn new(provider: Arc<dyn EnsembleTableProvider>) -> Co2Result<Self> {
        let realization = provider
            .realizations()
            .first()
            .copied()
            .ok_or_else(|| Co2Error::EmptyTable(provider.provider_id().to_string()))?;

        validate(provider.as_ref(), realization)?;
        let menu_options = derive_menu_options(provider.as_ref(), realization)?;

        info!(
            provider = provider.provider_id(),
            zones = menu_options.zones.len(),
            regions = menu_options.regions.len(),
            plume_groups = menu_options.plume_groups.len(),
            "Containment table validated"
        );

        Ok(Self {
            provider,
            menu_options,
        })
    }

    pub fn menu_options(&self) -> &MenuOptions {
        &self.menu_options
    }

    pub fn realizations(&self) -> Vec<i32> {
        self.provider.realizations()
    }

    /// All rows of one realization with `amount` converted to `scale`.
    ///
    /// When no conversion is needed the provider's frame is returned as is.
    pub fn extract_dataframe(
        &self,
        realization: i32,
        scale: &Co2Scale,
    ) -> Co2Result<Arc<TableFrame>> {
        let frame = self
            .provider
            .get_column_data(&self.provider.column_names(), Some(&[realization]))?;
        let factor = resolve(scale, self.provider.as_ref())?;
        if factor == 1.0 || frame.is_empty() {
            return Ok(frame);
        }

        let mut scaled = TableFrame::clone(&frame);
        scaled.map_numeric(AMOUNT_COLUMN, |v| apply_divisor(v, factor))?;
        Ok(Arc::new(scaled))
    }

    /// Fully aggregated rows (zone, region and plume group all `"all"`)
    /// across every realization.
    ///
    /// `M tons` divides by 1e9 and `normalize` by the largest amount among
    /// these rows; every other scale leaves amounts untouched.
    pub fn extract_condensed_dataframe(&self, scale: &Co2Scale) -> Co2Result<TableFrame> {
        let frame = self
            .provider
            .get_column_data(&self.provider.column_names(), None)?;

        let mut keep = vec![true; frame.len()];
        for name in AGGREGATE_COLUMNS {
            for (k, value) in keep.iter_mut().zip(categorical(&frame, name)?) {
                *k &= value == ALL;
            }
        }
        let mut condensed = frame.filter(&keep);
        if condensed.is_empty() {
            return Ok(condensed);
        }

        let divisor = match scale {
            Co2Scale::Mass(Co2MassScale::MTons) => Some(1e9),
            s if s.is_normalize() => Some(nonzero_max(condensed.max(AMOUNT_COLUMN))),
            _ => None,
        };
        if let Some(divisor) = divisor {
            condensed.map_numeric(AMOUNT_COLUMN, |v| apply_divisor(v, divisor))?;
        }
        Ok(condensed)
    }
}

fn validate(provider: &dyn EnsembleTableProvider, realization: i32) -> Co2Result<()> {
    let found = provider.column_names();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !found.iter().any(|f| f.as_str() == **c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    Err(Co2Error::ContainmentValidation {
        provider: provider.provider_id().to_string(),
        realization: realization.to_string(),
        expected: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        found,
        missing,
    })
}

fn derive_menu_options(
    provider: &dyn EnsembleTableProvider,
    realization: i32,
) -> Co2Result<MenuOptions> {
    let frame = provider.get_column_data(&provider.column_names(), Some(&[realization]))?;

    let phases = if categorical(&frame, "phase")?.iter().any(|p| p == "free_gas") {
        vec!["total", "free_gas", "trapped_gas", "aqueous"]
    } else {
        vec!["total", "gas", "aqueous"]
    };

    Ok(MenuOptions {
        zones: filter_values(categorical(&frame, "zone")?),
        regions: filter_values(categorical(&frame, "region")?),
        phases: phases.into_iter().map(String::from).collect(),
        plume_groups: filter_values(categorical(&frame, "plume_group")?),
    })
}

/// `["all", first-seen distinct values...]`, or empty when fewer than two
/// distinct values besides `"all"` exist.
fn filter_values(values: Vec<String>) -> Vec<String> {
    let mut options = vec![ALL.to_string()];
    for value in values {
        if !options.contains(&value) {
            options.push(value);
        }
    }
    if options.len() > 2 {
        options
    } else {
        Vec::new()
    }
}

/// Column values as strings. Numeric categories (e.g. zone numbers) are formatted.
fn categorical(frame: &TableFrame, name: &str) -> Co2Result<Vec<String>> {
    let column = frame
        .column(name)
        .ok_or_else(|| Co2Error::TableRead(format!("missing column '{}'", name)))?;
    Ok(match column {
        Column::Text(values) => values.clone(),
        Column::Int(values) => values.iter().map(|v| v.to_string()).collect(),
        Column::Float(values) => values.iter().map(|v| v.to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_values() {
        let strings = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(
            filter_values(strings(&["A", "A", "B"])),
            strings(&["all", "A", "B"])
        );
        assert!(filter_values(strings(&["x", "x"])).is_empty());
        assert!(filter_values(strings(&["all", "x"])).is_empty());
        assert_eq!(
            filter_values(strings(&["all", "z1", "z2", "all"])),
            strings(&["all", "z1", "z2"])
        );
    }

    #[test]
    fn test_categorical_formats_numbers() {
        let frame = TableFrame::new()
            .with_column("zone", Column::Int(vec![1, 2]))
            .unwrap();
        assert_eq!(categorical(&frame, "zone").unwrap(), vec!["1", "2"]);
        assert!(categorical(&frame, "region").is_err());
    }
}
