//! Chart row import from host-supplied JSON.
//!
//! Rows arrive as a JSON array of flat objects. Every cell must be a
//! scalar: nested arrays or objects are rejected with the offending row
//! index, before the document is touched.

use serde_json::Value as Json;
use thiserror::Error;
use vd_core::{Row, Value};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected an array of rows")]
    NotAnArray,

    #[error("row {index} is not an object")]
    NotAnObject { index: usize },

    #[error("row {index}, column `{key}`: cells must be strings, numbers, booleans, or null")]
    NonScalarCell { index: usize, key: String },
}

/// Parse `source` into chart rows.
pub fn rows_from_json(source: &str) -> Result<Vec<Row>, ImportError> {
    let Json::Array(items) = serde_json::from_str::<Json>(source)? else {
        return Err(ImportError::NotAnArray);
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let Json::Object(fields) = item else {
                return Err(ImportError::NotAnObject { index });
            };
            fields
                .into_iter()
                .map(|(key, cell)| match scalar(cell) {
                    Some(value) => Ok((key, value)),
                    None => Err(ImportError::NonScalarCell { index, key }),
                })
                .collect::<Result<Row, _>>()
        })
        .collect()
}

fn scalar(cell: Json) -> Option<Value> {
    match cell {
        Json::Null => Some(Value::Null),
        Json::Bool(b) => Some(Value::Bool(b)),
        Json::Number(n) => n.as_f64().map(Value::Number),
        Json::String(s) => Some(Value::Text(s)),
        Json::Array(_) | Json::Object(_) => None,
    }
}
