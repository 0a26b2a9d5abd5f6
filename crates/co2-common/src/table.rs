//! A small column-oriented table used for containment data.

use serde_json::{Map, Number, Value};

use crate::{Co2Error, Co2Result};

/// One typed column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Int(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn filter(&self, keep: &[bool]) -> Column {
        fn pick<T: Clone>(values: &[T], keep: &[bool]) -> Vec<T> {
            values
                .iter()
                .zip(keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| v.clone())
                .collect()
        }
        match self {
            Column::Int(v) => Column::Int(pick(v, keep)),
            Column::Float(v) => Column::Float(pick(v, keep)),
            Column::Text(v) => Column::Text(pick(v, keep)),
        }
    }

    fn append(&mut self, other: &Column) -> Co2Result<()> {
        if matches!((&*self, other), (Column::Int(_), Column::Float(_))) {
            *self = Column::Float(self.to_floats());
        }
        match (self, other) {
            (Column::Int(a), Column::Int(b)) => a.extend_from_slice(b),
            (Column::Float(a), Column::Float(b)) => a.extend_from_slice(b),
            (Column::Text(a), Column::Text(b)) => a.extend_from_slice(b),
            (Column::Float(a), Column::Int(b)) => a.extend(b.iter().map(|v| *v as f64)),
            _ => return Err(Co2Error::TableRead("column type mismatch".to_string())),
        }
        Ok(())
    }

    fn to_floats(&self) -> Vec<f64> {
        match self {
            Column::Int(v) => v.iter().map(|x| *x as f64).collect(),
            Column::Float(v) => v.clone(),
            Column::Text(_) => Vec::new(),
        }
    }

    fn value(&self, row: usize) -> Value {
        match self {
            Column::Int(v) => Value::from(v[row]),
            Column::Float(v) => Number::from_f64(v[row]).map_or(Value::Null, Value::Number),
            Column::Text(v) => Value::String(v[row].clone()),
        }
    }
}

/// Named columns of equal length, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableFrame {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl TableFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column; its length must match existing columns.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Co2Result<Self> {
        let name = name.into();
        if let Some(first) = self.columns.first() {
            if first.len() != column.len() {
                return Err(Co2Error::TableRead(format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    column.len(),
                    first.len()
                )));
            }
        }
        if self.names.contains(&name) {
            return Err(Co2Error::TableRead(format!("duplicate column '{}'", name)));
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }

    /// Text column values, `None` if missing or not text.
    pub fn text(&self, name: &str) -> Option<&[String]> {
        match self.column(name)? {
            Column::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric column values as floats, `None` if missing or not numeric.
    pub fn numeric(&self, name: &str) -> Option<Vec<f64>> {
        match self.column(name)? {
            Column::Text(_) => None,
            column => Some(column.to_floats()),
        }
    }

    /// Maximum of a numeric column, ignoring NaN. `None` if empty or not numeric.
    pub fn max(&self, name: &str) -> Option<f64> {
        self.numeric(name)?
            .into_iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
    }

    /// Replace a numeric column by applying `f` to each value. Integer columns become floats.
    pub fn map_numeric(&mut self, name: &str, f: impl Fn(f64) -> f64) -> Co2Result<()> {
        let i = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| Co2Error::TableRead(format!("missing column '{}'", name)))?;
        if matches!(self.columns[i], Column::Text(_)) {
            return Err(Co2Error::TableRead(format!("column '{}' is not numeric", name)));
        }
        let values = self.columns[i].to_floats().into_iter().map(f).collect();
        self.columns[i] = Column::Float(values);
        Ok(())
    }

    /// Rows where `keep` is true.
    pub fn filter(&self, keep: &[bool]) -> TableFrame {
        TableFrame {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.filter(keep)).collect(),
        }
    }

    /// Project onto the named columns, in the given order. Unknown names are skipped.
    pub fn select(&self, names: &[String]) -> TableFrame {
        let mut out = TableFrame::new();
        for name in names {
            if let Some(column) = self.column(name) {
                out.names.push(name.clone());
                out.columns.push(column.clone());
            }
        }
        out
    }

    /// Append the rows of `other`, which must have the same columns.
    pub fn append(&mut self, other: &TableFrame) -> Co2Result<()> {
        if self.names.is_empty() {
            *self = other.clone();
            return Ok(());
        }
        if self.names != other.names {
            return Err(Co2Error::TableRead(
                "cannot append frames with different columns".to_string(),
            ));
        }
        for (a, b) in self.columns.iter_mut().zip(&other.columns) {
            a.append(b)?;
        }
        Ok(())
    }

    /// Rows as JSON objects.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        (0..self.len())
            .map(|row| {
                self.names
                    .iter()
                    .zip(&self.columns)
                    .map(|(n, c)| (n.clone(), c.value(row)))
                    .collect()
            })
            .collect()
    }

    /// Build a frame from JSON objects.
    ///
    /// Column types are inferred: all-integer columns become `Int`, other
    /// numeric columns `Float`, and anything else `Text`. Every record must
    /// have the same keys as the first.
    pub fn from_records(records: &[Map<String, Value>]) -> Co2Result<TableFrame> {
        let Some(first) = records.first() else {
            return Ok(TableFrame::new());
        };
        let mut frame = TableFrame::new();
        for name in first.keys() {
            let mut values = Vec::with_capacity(records.len());
            for (i, record) in records.iter().enumerate() {
                let value = record.get(name).ok_or_else(|| {
                    Co2Error::TableRead(format!("record {} is missing '{}'", i, name))
                })?;
                values.push(value);
            }
            frame = frame.with_column(name.clone(), infer_column(&values))?;
        }
        Ok(frame)
    }
}

fn infer_column(values: &[&Value]) -> Column {
    if values.iter().all(|v| v.is_i64()) {
        return Column::Int(values.iter().filter_map(|v| v.as_i64()).collect());
    }
    if values.iter().all(|v| v.is_number()) {
        return Column::Float(values.iter().filter_map(|v| v.as_f64()).collect());
    }
    Column::Text(
        values
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
    )
}
