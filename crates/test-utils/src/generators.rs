//! Generators for synthetic surfaces and containment tables.
//!
//! These produce small, predictable data sets so tests can check exact
//! counts and sums.

use co2_common::{Column, GridSpec, MaskedGrid, TableFrame};

/// Unrotated grid geometry with 100 m cells starting at (1000, 2000).
pub fn test_spec(ncol: usize, nrow: usize) -> GridSpec {
    GridSpec::new(ncol, nrow, 1000.0, 2000.0, 100.0, 100.0)
}

/// A surface where every cell has the same value.
pub fn constant_surface(ncol: usize, nrow: usize, value: f64) -> MaskedGrid {
    MaskedGrid::from_values(test_spec(ncol, nrow), vec![value; ncol * nrow])
        .expect("constant surface geometry")
}

/// A surface from explicit row-major values; NaN marks a masked cell.
pub fn surface_from_rows(rows: &[&[f64]]) -> MaskedGrid {
    let nrow = rows.len();
    let ncol = rows.first().map_or(0, |r| r.len());
    let values: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    MaskedGrid::from_values(test_spec(ncol, nrow), values).expect("rows must have equal length")
}

/// A plume-like surface: `peak` inside a disc of `radius` cells around
/// (`center_row`, `center_col`), falling linearly to zero at twice the radius.
pub fn plume_disc_surface(
    ncol: usize,
    nrow: usize,
    center_row: usize,
    center_col: usize,
    radius: f64,
    peak: f64,
) -> MaskedGrid {
    let mut values = Vec::with_capacity(ncol * nrow);
    for row in 0..nrow {
        for col in 0..ncol {
            let dr = row as f64 - center_row as f64;
            let dc = col as f64 - center_col as f64;
            let dist = (dr * dr + dc * dc).sqrt();
            let v = if dist <= radius {
                peak
            } else if dist <= 2.0 * radius {
                peak * (2.0 * radius - dist) / radius
            } else {
                0.0
            };
            values.push(v);
        }
    }
    MaskedGrid::from_values(test_spec(ncol, nrow), values).expect("plume surface geometry")
}

/// One row of a synthetic containment table.
#[derive(Debug, Clone)]
pub struct ContainmentRecord {
    pub realization: i64,
    pub date: &'static str,
    pub amount: f64,
    pub phase: &'static str,
    pub containment: &'static str,
    pub zone: &'static str,
    pub region: &'static str,
    pub plume_group: &'static str,
}

impl ContainmentRecord {
    /// A fully aggregated total row.
    pub fn total(realization: i64, date: &'static str, amount: f64) -> Self {
        Self {
            realization,
            date,
            amount,
            phase: "total",
            containment: "total",
            zone: "all",
            region: "all",
            plume_group: "all",
        }
    }
}

/// Build a containment frame with a `REAL` column plus all required columns.
pub fn containment_frame(records: &[ContainmentRecord]) -> TableFrame {
    let text = |f: fn(&ContainmentRecord) -> &'static str| {
        Column::Text(records.iter().map(|r| f(r).to_string()).collect())
    };
    TableFrame::new()
        .with_column("REAL", Column::Int(records.iter().map(|r| r.realization).collect()))
        .and_then(|t| t.with_column("date", text(|r| r.date)))
        .and_then(|t| {
            t.with_column(
                "amount",
                Column::Float(records.iter().map(|r| r.amount).collect()),
            )
        })
        .and_then(|t| t.with_column("phase", text(|r| r.phase)))
        .and_then(|t| t.with_column("containment", text(|r| r.containment)))
        .and_then(|t| t.with_column("zone", text(|r| r.zone)))
        .and_then(|t| t.with_column("region", text(|r| r.region)))
        .and_then(|t| t.with_column("plume_group", text(|r| r.plume_group)))
        .expect("containment columns have equal length")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plume_disc_surface() {
        let s = plume_disc_surface(9, 9, 4, 4, 1.0, 1.0);
        assert_eq!(s.get(4, 4), Some(1.0));
        assert_eq!(s.get(0, 0), Some(0.0));
        assert!(s.get(4, 6).unwrap() <= 0.0 + f64::EPSILON);
    }

    #[test]
    fn test_surface_from_rows_masks_nan() {
        let s = surface_from_rows(&[&[1.0, f64::NAN], &[3.0, 4.0]]);
        assert_eq!(s.shape(), (2, 2));
        assert!(s.is_masked(0, 1));
        assert_eq!(s.get(1, 0), Some(3.0));
    }

    #[test]
    fn test_containment_frame() {
        let frame = containment_frame(&[
            ContainmentRecord::total(0, "2030", 10.0),
            ContainmentRecord::total(1, "2030", 12.0),
        ]);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.column_names().len(), 8);
        assert_eq!(frame.max("amount"), Some(12.0));
    }
}
