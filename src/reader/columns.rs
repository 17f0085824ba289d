//! DataFrame column decoding
//!
//! Query results arrive as Polars DataFrames whose physical types depend on
//! the backend (DuckDB sums integers into HUGEINT, decimals into DOUBLE, ...).
//! These helpers cast a named column to one logical type and hand it back as a
//! plain vector, so row structs never touch Polars directly.

use crate::{DataFrame, PopdashError, Result};
use polars::prelude::*;

fn cast_column(df: &DataFrame, name: &str, dtype: &DataType) -> Result<Series> {
    let column = df.column(name).map_err(|e| {
        PopdashError::ReaderError(format!("Missing column '{}' in query result: {}", name, e))
    })?;
    column
        .as_materialized_series()
        .cast(dtype)
        .map_err(|e| PopdashError::ReaderError(format!("Failed to cast column '{}': {}", name, e)))
}

/// Values of a column as nullable f64
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = cast_column(df, name, &DataType::Float64)?;
    let ca = series
        .f64()
        .map_err(|e| PopdashError::ReaderError(format!("Failed to cast to f64: {}", e)))?;
    Ok(ca.into_iter().collect())
}

/// Values of a column as nullable i64
pub fn i64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let series = cast_column(df, name, &DataType::Int64)?;
    let ca = series
        .i64()
        .map_err(|e| PopdashError::ReaderError(format!("Failed to cast to i64: {}", e)))?;
    Ok(ca.into_iter().collect())
}

/// Values of a column as nullable strings
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = cast_column(df, name, &DataType::String)?;
    let ca = series
        .str()
        .map_err(|e| PopdashError::ReaderError(format!("Failed to cast to string: {}", e)))?;
    Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
}

/// Unwrap a value that the query guarantees to be non-null
pub fn required<T>(value: Option<T>, column: &str, row: usize) -> Result<T> {
    value.ok_or_else(|| {
        PopdashError::ReaderError(format!(
            "Unexpected NULL in column '{}' at row {}",
            column, row
        ))
    })
}
