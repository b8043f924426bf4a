//! Schema Inspector - bounded schema detection from CSV files
//!
//! Reads only a prefix of the file (never the whole thing) and derives
//! column names, pandas-style dtype tags, shape, and a small row preview.
//! This is the only stage that can fail the pipeline: an unreadable or
//! non-tabular file surfaces as `NbError::Read`.

use crate::error::{NbError, Result};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

const PREVIEW_ROWS: usize = 3;

/// Immutable schema record derived from a sampled prefix of the dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSchema {
    /// Column names in file order.
    pub columns: Vec<String>,
    /// Column name -> pandas-style dtype tag (int64, float64, bool, object).
    pub dtypes: HashMap<String, String>,
    /// (rows sampled, columns) shape of the inspected prefix.
    pub shape: (usize, usize),
    /// First few rows as JSON objects, for prompt context.
    pub sample: Vec<Map<String, Value>>,
}

impl DatasetSchema {
    pub fn dtype(&self, column: &str) -> Option<&str> {
        self.dtypes.get(column).map(|s| s.as_str())
    }
}

/// Inspect a CSV file, reading at most `row_cap` data rows.
pub fn inspect(path: &Path, row_cap: usize) -> Result<DatasetSchema> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| NbError::Read(format!("{}: {}", path.display(), e)))?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| NbError::Read(format!("Failed to read CSV headers: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if columns.is_empty() {
        return Err(NbError::Read(format!(
            "{}: no header row found",
            path.display()
        )));
    }

    let mut cell_types: Vec<Option<CellType>> = vec![None; columns.len()];
    let mut sample: Vec<Map<String, Value>> = Vec::new();
    let mut rows_read = 0usize;

    for record in reader.records().take(row_cap) {
        let record = record.map_err(|e| NbError::Read(format!("Failed to read CSV record: {}", e)))?;
        rows_read += 1;

        if sample.len() < PREVIEW_ROWS {
            let mut row = Map::new();
            for (idx, col) in columns.iter().enumerate() {
                let cell = record.get(idx).unwrap_or("");
                row.insert(col.clone(), coerce_cell(cell));
            }
            sample.push(row);
        }

        for (idx, slot) in cell_types.iter_mut().enumerate() {
            let cell = record.get(idx).unwrap_or("").trim();
            // Empty cells never narrow a column's type
            if cell.is_empty() {
                continue;
            }
            let observed = CellType::of(cell);
            *slot = Some(match slot.take() {
                Some(existing) => existing.merge(observed),
                None => observed,
            });
        }
    }

    let dtypes: HashMap<String, String> = columns
        .iter()
        .zip(cell_types.iter().copied())
        .map(|(col, ty)| {
            let tag = ty.unwrap_or(CellType::Object).dtype_tag();
            (col.clone(), tag.to_string())
        })
        .collect();

    let shape = (rows_read, columns.len());

    Ok(DatasetSchema {
        columns,
        dtypes,
        shape,
        sample,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellType {
    Int,
    Float,
    Bool,
    Object,
}

impl CellType {
    fn of(cell: &str) -> CellType {
        if cell.parse::<i64>().is_ok() {
            return CellType::Int;
        }
        if cell.parse::<f64>().is_ok() {
            return CellType::Float;
        }
        if cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("false") {
            return CellType::Bool;
        }
        CellType::Object
    }

    fn merge(self, other: CellType) -> CellType {
        use CellType::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Int, Float) | (Float, Int) => Float,
            _ => Object,
        }
    }

    fn dtype_tag(self) -> &'static str {
        match self {
            CellType::Int => "int64",
            CellType::Float => "float64",
            CellType::Bool => "bool",
            CellType::Object => "object",
        }
    }
}

fn coerce_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(trimmed.to_string())
}
