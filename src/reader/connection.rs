//! Connection string parsing for the population store
//!
//! Parses URI-style connection strings to determine how the store opens
//! connections.

use crate::{PopdashError, Result};

/// Parsed connection information
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionInfo {
    /// DuckDB in-memory database
    DuckDBMemory,
    /// DuckDB file-based database
    DuckDBFile(String),
}

/// Parse a connection string into connection information
///
/// # Supported Formats
///
/// - `duckdb://memory` - DuckDB in-memory database
/// - `duckdb:///absolute/path/file.db` - DuckDB file (absolute path)
/// - `duckdb://relative/file.db` - DuckDB file (relative path)
///
/// # Examples
///
/// ```
/// use popdash::reader::connection::{parse_connection_string, ConnectionInfo};
///
/// let info = parse_connection_string("duckdb://memory").unwrap();
/// assert_eq!(info, ConnectionInfo::DuckDBMemory);
///
/// let info = parse_connection_string("duckdb://wpp.db").unwrap();
/// assert_eq!(info, ConnectionInfo::DuckDBFile("wpp.db".to_string()));
/// ```
pub fn parse_connection_string(uri: &str) -> Result<ConnectionInfo> {
    if uri == "duckdb://memory" {
        return Ok(ConnectionInfo::DuckDBMemory);
    }

    if let Some(path) = uri.strip_prefix("duckdb://") {
        // Absolute paths keep their leading slash
        if path.trim_start_matches('/').is_empty() {
            return Err(PopdashError::ReaderError(
                "DuckDB file path cannot be empty".to_string(),
            ));
        }
        return Ok(ConnectionInfo::DuckDBFile(path.to_string()));
    }

    Err(PopdashError::ReaderError(format!(
        "Unsupported connection string format: {}. Supported: duckdb://memory, duckdb://<path>",
        uri
    )))
}
