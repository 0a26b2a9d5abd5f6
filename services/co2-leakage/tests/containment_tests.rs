//! Containment provider behavior over synthetic tables.

use std::sync::Arc;

use co2_common::{Co2Error, Co2MassScale, Co2Scale, Column, TableFrame};
use co2_leakage::{ContainmentDataProvider, REQUIRED_COLUMNS};
use storage::{EnsembleTableProvider, InMemoryTableProvider};
use test_utils::{assert_approx_eq, containment_frame, fixtures, ContainmentRecord};

fn provider(frame: TableFrame) -> (Arc<InMemoryTableProvider>, ContainmentDataProvider) {
    let table = Arc::new(InMemoryTableProvider::from_frame("containment", frame).unwrap());
    let provider = ContainmentDataProvider::new(table.clone()).unwrap();
    (table, provider)
}

fn normalize() -> Co2Scale {
    Co2Scale::Mass(Co2MassScale::Normalize)
}

#[test]
fn test_menu_options_example() {
    let (_, provider) = provider(fixtures::menu_example());
    let menu = provider.menu_options();

    assert_eq!(menu.zones, vec!["all", "A", "B"]);
    assert!(menu.regions.is_empty());
    assert!(menu.plume_groups.is_empty());
    assert_eq!(menu.phases, vec!["total", "free_gas", "trapped_gas", "aqueous"]);
}

#[test]
fn test_menu_options_without_gas_split() {
    let (_, provider) = provider(containment_frame(&[
        ContainmentRecord::total(0, "2030", 1.0),
        ContainmentRecord {
            phase: "gas",
            zone: "z1",
            ..ContainmentRecord::total(0, "2030", 0.5)
        },
        ContainmentRecord {
            phase: "aqueous",
            zone: "z2",
            ..ContainmentRecord::total(0, "2030", 0.5)
        },
    ]));
    let menu = provider.menu_options();

    assert_eq!(menu.phases, vec!["total", "gas", "aqueous"]);
    assert_eq!(menu.zones, vec!["all", "z1", "z2"]);
}

#[test]
fn test_extract_dataframe_scales_amount() {
    let (_, provider) = provider(fixtures::standard_containment());

    let tons = provider.extract_dataframe(1, &Co2Scale::TONS).unwrap();
    let kg = provider.extract_dataframe(1, &Co2Scale::KG).unwrap();
    let mtons = provider.extract_dataframe(1, &Co2Scale::MTONS).unwrap();

    let tons_amount = tons.numeric("amount").unwrap();
    let kg_amount = kg.numeric("amount").unwrap();
    let mtons_amount = mtons.numeric("amount").unwrap();
    assert_eq!(tons_amount.len(), kg_amount.len());
    for ((t, k), m) in tons_amount.iter().zip(&kg_amount).zip(&mtons_amount) {
        assert_approx_eq!(*k, t * 1000.0, 1e-6);
        assert_approx_eq!(*m, t / 1e6, 1e-12);
    }

    // Only realization 1 rows
    let reals = match tons.column("REAL") {
        Some(Column::Int(values)) => values.clone(),
        other => panic!("unexpected REAL column: {:?}", other),
    };
    assert!(reals.iter().all(|r| *r == 1));
}

#[test]
fn test_extract_dataframe_unscaled_is_shared() {
    let (table, provider) = provider(fixtures::standard_containment());

    let frame = provider.extract_dataframe(0, &Co2Scale::TONS).unwrap();
    let direct = table
        .get_column_data(&table.column_names(), Some(&[0]))
        .unwrap();
    assert!(Arc::ptr_eq(&frame, &direct));
}

#[test]
fn test_extract_dataframe_normalizes_by_global_max() {
    let (_, provider) = provider(fixtures::standard_containment());

    let frame = provider.extract_dataframe(1, &normalize()).unwrap();
    let amounts = frame.numeric("amount").unwrap();
    assert_eq!(frame.max("amount"), Some(1.0));
    // 2500 total at 2040 over the 4000 outlier
    assert!(amounts.iter().any(|a| (*a - 0.625).abs() < 1e-12));
}

#[test]
fn test_zero_table_normalizes_to_zeros() {
    let (_, provider) = provider(fixtures::zero_containment());

    let frame = provider.extract_dataframe(0, &normalize()).unwrap();
    let amounts = frame.numeric("amount").unwrap();
    assert!(!amounts.is_empty());
    assert!(amounts.iter().all(|a| *a == 0.0));

    let condensed = provider.extract_condensed_dataframe(&normalize()).unwrap();
    assert!(condensed
        .numeric("amount")
        .unwrap()
        .iter()
        .all(|a| *a == 0.0));
}

#[test]
fn test_condensed_selects_aggregated_rows() {
    let (_, provider) = provider(fixtures::standard_containment());

    let condensed = provider.extract_condensed_dataframe(&Co2Scale::TONS).unwrap();
    // 2 realizations x 2 dates x 4 phases
    assert_eq!(condensed.len(), 16);
    for name in ["zone", "region", "plume_group"] {
        assert!(condensed.text(name).unwrap().iter().all(|v| v == "all"));
    }
    assert_eq!(condensed.max("amount"), Some(2500.0));
}

#[test]
fn test_condensed_normalizes_independently() {
    let (_, provider) = provider(fixtures::standard_containment());

    let condensed = provider.extract_condensed_dataframe(&normalize()).unwrap();
    assert_eq!(condensed.max("amount"), Some(1.0));
    let amounts = condensed.numeric("amount").unwrap();
    // 1000 / 2500, not 1000 / 4000
    assert!(amounts.iter().any(|a| (*a - 0.4).abs() < 1e-12));
}

#[test]
fn test_condensed_mtons_divides_by_1e9() {
    let (_, provider) = provider(fixtures::standard_containment());

    let condensed = provider
        .extract_condensed_dataframe(&Co2Scale::MTONS)
        .unwrap();
    assert_approx_eq!(condensed.max("amount").unwrap(), 2500.0 / 1e9, 1e-18);

    let kg = provider.extract_condensed_dataframe(&Co2Scale::KG).unwrap();
    assert_eq!(kg.max("amount"), Some(2500.0));
}

#[test]
fn test_validation_names_all_missing_columns() {
    let frame = fixtures::standard_containment().select(
        &["REAL", "date", "amount", "phase", "containment", "zone"]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>(),
    );
    let table = Arc::new(InMemoryTableProvider::from_frame("old-format", frame).unwrap());

    let err = match ContainmentDataProvider::new(table) {
        Err(err) => err,
        Ok(_) => panic!("validation should fail"),
    };
    match &err {
        Co2Error::ContainmentValidation {
            provider,
            realization,
            expected,
            missing,
            found,
        } => {
            assert_eq!(provider, "old-format");
            assert_eq!(realization, "0");
            assert_eq!(missing, &vec!["region".to_string(), "plume_group".to_string()]);
            assert_eq!(expected.len(), REQUIRED_COLUMNS.len());
            assert!(!found.contains(&"region".to_string()));
        }
        other => panic!("unexpected error: {}", other),
    }
    let message = err.to_string();
    assert!(message.contains("region"));
    assert!(message.contains("plume_group"));
}

#[test]
fn test_empty_table_is_rejected() {
    let frame = TableFrame::new()
        .with_column("REAL", Column::Int(Vec::new()))
        .unwrap();
    let table = Arc::new(InMemoryTableProvider::from_frame("empty", frame).unwrap());
    assert!(matches!(
        ContainmentDataProvider::new(table),
        Err(Co2Error::EmptyTable(_))
    ));
}

#[test]
fn test_realizations() {
    let (_, provider) = provider(fixtures::standard_containment());
    assert_eq!(provider.realizations(), vec![0, 1]);
}
