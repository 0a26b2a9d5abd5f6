//! Scale factors for containment amounts.

use tracing::debug;

use co2_common::{Co2MassScale, Co2Result, Co2Scale, Co2VolumeScale};
use storage::EnsembleTableProvider;

/// Column holding the physical quantity in every containment table.
pub const AMOUNT_COLUMN: &str = "amount";

/// Divisor that converts base-unit amounts into `scale`.
///
/// `normalize` divides by the largest `amount` in the whole table, across
/// all realizations. An all-zero or empty table resolves to 0.0; pair the
/// factor with [`apply_divisor`] so such tables scale to zeros.
pub fn resolve(scale: &Co2Scale, table: &dyn EnsembleTableProvider) -> Co2Result<f64> {
    let factor = match scale {
        Co2Scale::Mass(Co2MassScale::Kg) => 0.001,
        Co2Scale::Mass(Co2MassScale::Tons) | Co2Scale::Volume(Co2VolumeScale::CubicMeters) => 1.0,
        Co2Scale::Mass(Co2MassScale::MTons) => 1e6,
        Co2Scale::Volume(Co2VolumeScale::BillionCubicMeters) => 1e9,
        Co2Scale::Mass(Co2MassScale::Normalize) | Co2Scale::Volume(Co2VolumeScale::Normalize) => {
            let frame = table.get_column_data(&[AMOUNT_COLUMN.to_string()], None)?;
            nonzero_max(frame.max(AMOUNT_COLUMN))
        }
        Co2Scale::Other(tag) => {
            debug!(scale = %tag, "Unrecognized scale, leaving amounts unscaled");
            1.0
        }
    };
    Ok(factor)
}

/// `value / factor`, or 0.0 when the factor is zero.
pub fn apply_divisor(value: f64, factor: f64) -> f64 {
    if factor == 0.0 {
        0.0
    } else {
        value / factor
    }
}

/// The maximum, or 0.0 when there is none or it is zero.
pub(crate) fn nonzero_max(max: Option<f64>) -> f64 {
    match max {
        Some(m) if m != 0.0 => m,
        _ => 0.0,
    }
}
