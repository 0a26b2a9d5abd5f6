//! Ensemble table sources.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use co2_common::{Co2Error, Co2Result, Column, TableFrame};

/// Name of the realization column in every frame.
pub const REALIZATION_COLUMN: &str = "REAL";

/// Source of a tabular dataset partitioned by realization.
pub trait EnsembleTableProvider: Send + Sync {
    /// Identifier used in diagnostics.
    fn provider_id(&self) -> &str;

    /// Realizations present, in ascending order.
    fn realizations(&self) -> Vec<i32>;

    /// Data column names, excluding the realization column.
    fn column_names(&self) -> Vec<String>;

    /// Rows for the given realizations (all when `None`), projected onto
    /// `columns` plus the realization column.
    ///
    /// Frames are shared; callers must not assume they own the data.
    fn get_column_data(
        &self,
        columns: &[String],
        realizations: Option<&[i32]>,
    ) -> Co2Result<Arc<TableFrame>>;
}

/// Table held in memory, pre-split by realization.
pub struct InMemoryTableProvider {
    provider_id: String,
    columns: Vec<String>,
    by_realization: BTreeMap<i32, Arc<TableFrame>>,
}

impl InMemoryTableProvider {
    /// Build from a frame that has an integer `REAL` column.
    pub fn from_frame(provider_id: impl Into<String>, frame: TableFrame) -> Co2Result<Self> {
        let provider_id = provider_id.into();
        let reals: Vec<i32> = match frame.column(REALIZATION_COLUMN) {
            Some(Column::Int(values)) => values.iter().map(|r| *r as i32).collect(),
            _ => {
                return Err(Co2Error::TableRead(format!(
                    "table '{}' has no integer {} column",
                    provider_id, REALIZATION_COLUMN
                )))
            }
        };

        let mut all_columns = vec![REALIZATION_COLUMN.to_string()];
        let columns: Vec<String> = frame
            .column_names()
            .iter()
            .filter(|c| c.as_str() != REALIZATION_COLUMN)
            .cloned()
            .collect();
        all_columns.extend(columns.iter().cloned());
        let frame = frame.select(&all_columns);

        let mut distinct: Vec<i32> = reals.clone();
        distinct.sort_unstable();
        distinct.dedup();

        let by_realization = distinct
            .into_iter()
            .map(|real| {
                let keep: Vec<bool> = reals.iter().map(|r| *r == real).collect();
                (real, Arc::new(frame.filter(&keep)))
            })
            .collect();

        Ok(Self {
            provider_id,
            columns,
            by_realization,
        })
    }

    /// Load a JSON array of row objects, each with a `REAL` field.
    pub fn from_json_file(
        provider_id: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Co2Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Co2Error::TableRead(format!("{}: {}", path.display(), e)))?;
        let records: Vec<Map<String, Value>> = serde_json::from_str(&contents)
            .map_err(|e| Co2Error::TableRead(format!("{}: {}", path.display(), e)))?;
        let frame = TableFrame::from_records(&records)?;
        let provider = Self::from_frame(provider_id, frame)?;
        info!(
            path = %path.display(),
            rows = records.len(),
            realizations = provider.by_realization.len(),
            "Loaded table"
        );
        Ok(provider)
    }
}

impl EnsembleTableProvider for InMemoryTableProvider {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn realizations(&self) -> Vec<i32> {
        self.by_realization.keys().copied().collect()
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn get_column_data(
        &self,
        columns: &[String],
        realizations: Option<&[i32]>,
    ) -> Co2Result<Arc<TableFrame>> {
        let wants_all_columns = columns.len() == self.columns.len()
            && columns.iter().zip(&self.columns).all(|(a, b)| a == b);

        let selected: Vec<&Arc<TableFrame>> = match realizations {
            None => self.by_realization.values().collect(),
            Some(reals) => reals
                .iter()
                .filter_map(|r| self.by_realization.get(r))
                .collect(),
        };

        // Whole single-realization frames are handed out without copying
        if wants_all_columns && selected.len() == 1 {
            return Ok(Arc::clone(selected[0]));
        }

        let mut projection = vec![REALIZATION_COLUMN.to_string()];
        projection.extend(
            columns
                .iter()
                .filter(|c| c.as_str() != REALIZATION_COLUMN)
                .cloned(),
        );

        let mut out = TableFrame::new();
        for frame in selected {
            out.append(&frame.select(&projection))?;
        }
        Ok(Arc::new(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures;

    fn provider() -> InMemoryTableProvider {
        InMemoryTableProvider::from_frame("containment", fixtures::standard_containment()).unwrap()
    }

    #[test]
    fn test_realizations_and_columns() {
        let p = provider();
        assert_eq!(p.realizations(), vec![0, 1]);
        assert!(!p.column_names().contains(&REALIZATION_COLUMN.to_string()));
        assert!(p.column_names().contains(&"amount".to_string()));
    }

    #[test]
    fn test_single_realization_frame_is_shared() {
        let p = provider();
        let cols = p.column_names();
        let a = p.get_column_data(&cols, Some(&[1])).unwrap();
        let b = p.get_column_data(&cols, Some(&[1])).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.column(REALIZATION_COLUMN).is_some());
    }

    #[test]
    fn test_projection_over_all_realizations() {
        let p = provider();
        let frame = p.get_column_data(&["amount".to_string()], None).unwrap();
        assert_eq!(frame.column_names(), &["REAL".to_string(), "amount".to_string()]);
        assert_eq!(frame.len(), fixtures::standard_containment().len());
        assert_eq!(frame.max("amount"), Some(4000.0));
    }

    #[test]
    fn test_missing_realization_column() {
        let frame = TableFrame::new()
            .with_column("amount", Column::Float(vec![1.0]))
            .unwrap();
        assert!(InMemoryTableProvider::from_frame("t", frame).is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.json");
        std::fs::write(
            &path,
            r#"[{"REAL": 2, "date": "2030", "amount": 5.5},
                {"REAL": 0, "date": "2030", "amount": 1}]"#,
        )
        .unwrap();

        let p = InMemoryTableProvider::from_json_file("t", &path).unwrap();
        assert_eq!(p.realizations(), vec![0, 2]);
        let frame = p.get_column_data(&["amount".to_string()], Some(&[2])).unwrap();
        assert_eq!(frame.numeric("amount"), Some(vec![5.5]));
    }
}
