//! Common containment table fixtures.
//!
//! Amounts are in the canonical base unit (tons for mass tables).

use co2_common::TableFrame;

use crate::generators::{containment_frame, ContainmentRecord};

fn row(
    realization: i64,
    date: &'static str,
    amount: f64,
    phase: &'static str,
    zone: &'static str,
    region: &'static str,
    plume_group: &'static str,
) -> ContainmentRecord {
    ContainmentRecord {
        realization,
        date,
        amount,
        phase,
        containment: "contained",
        zone,
        region,
        plume_group,
    }
}

/// Two realizations, two dates, zones `z1`/`z2`, region `r1`, gas split present.
///
/// The global maximum `amount` (4000) is on a zone row of realization 1;
/// the maximum among fully aggregated rows is 2500.
pub fn standard_containment() -> TableFrame {
    let mut records = Vec::new();
    for (real, scale) in [(0_i64, 1.0), (1, 1.25)] {
        for (date, base) in [("2030-01-01", 1000.0), ("2040-01-01", 2000.0)] {
            records.push(ContainmentRecord::total(real, date, base * scale));
            records.push(row(real, date, base * 0.5 * scale, "free_gas", "all", "all", "all"));
            records.push(row(real, date, base * 0.2 * scale, "trapped_gas", "all", "all", "all"));
            records.push(row(real, date, base * 0.3 * scale, "aqueous", "all", "all", "all"));
            records.push(row(real, date, base * 0.6 * scale, "total", "z1", "all", "all"));
            records.push(row(real, date, base * 0.4 * scale, "total", "z2", "all", "all"));
            records.push(row(real, date, base * 0.9 * scale, "total", "all", "r1", "all"));
        }
    }
    // Outlier on a zone row so the global and condensed maxima differ
    records.push(row(1, "2040-01-01", 4000.0, "total", "z1", "all", "all"));
    containment_frame(&records)
}

/// Zones `A, A, B`, a single region `x`, a single plume group `p1`, free gas present.
pub fn menu_example() -> TableFrame {
    containment_frame(&[
        row(0, "2030", 1.0, "free_gas", "A", "x", "p1"),
        row(0, "2030", 2.0, "trapped_gas", "A", "x", "p1"),
        row(0, "2030", 3.0, "aqueous", "B", "x", "p1"),
        row(1, "2030", 4.0, "aqueous", "C", "y", "p2"),
    ])
}

/// A table where every amount is zero.
pub fn zero_containment() -> TableFrame {
    containment_frame(&[
        ContainmentRecord::total(0, "2030", 0.0),
        ContainmentRecord::total(1, "2030", 0.0),
    ])
}
