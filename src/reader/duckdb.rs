//! DuckDB data source implementation
//!
//! Provides the store and reader for DuckDB databases with direct Polars
//! DataFrame integration.

use crate::reader::{connection::ConnectionInfo, Reader, Store};
use crate::{DataFrame, PopdashError, Result};
use duckdb::types::ValueRef;
use duckdb::{params, AccessMode, Config, Connection};
use std::sync::Mutex;

/// DuckDB-backed population store
///
/// File databases are opened read-only, once per acquired reader. An
/// in-memory database only exists while a connection to it is open, so the
/// store keeps a seed connection and hands out clones of it.
///
/// # Examples
///
/// ```rust,ignore
/// use popdash::reader::{DuckDBStore, Store, Reader};
///
/// let store = DuckDBStore::from_connection_string("duckdb://wpp.db")?;
/// let df = store.acquire()?.execute("SELECT name FROM region")?;
/// ```
pub struct DuckDBStore {
    info: ConnectionInfo,
    seed: Option<Mutex<Connection>>,
}

impl DuckDBStore {
    /// Create a store from a connection string
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The connection string format is invalid
    /// - The database file cannot be opened
    pub fn from_connection_string(uri: &str) -> Result<Self> {
        let info = super::connection::parse_connection_string(uri)?;

        let seed = match &info {
            ConnectionInfo::DuckDBMemory => {
                let conn = Connection::open_in_memory().map_err(|e| {
                    PopdashError::ReaderError(format!("Failed to open in-memory DuckDB: {}", e))
                })?;
                Some(Mutex::new(conn))
            }
            ConnectionInfo::DuckDBFile(path) => {
                // Fail at startup rather than on the first request
                drop(open_read_only(path)?);
                None
            }
        };

        Ok(Self { info, seed })
    }

    /// Run setup statements (schema creation, data loading) on a writable
    /// connection to the store's database
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        match (&self.info, &self.seed) {
            (_, Some(seed)) => {
                let conn = seed.lock().map_err(|e| {
                    PopdashError::InternalError(format!("Failed to lock seed connection: {}", e))
                })?;
                f(&conn)
            }
            (ConnectionInfo::DuckDBFile(path), None) => {
                let conn = Connection::open(path).map_err(|e| {
                    PopdashError::ReaderError(format!(
                        "Failed to open DuckDB file '{}': {}",
                        path, e
                    ))
                })?;
                f(&conn)
            }
            (ConnectionInfo::DuckDBMemory, None) => Err(PopdashError::InternalError(
                "In-memory store has no seed connection".to_string(),
            )),
        }
    }
}

fn open_read_only(path: &str) -> Result<Connection> {
    let config = Config::default()
        .access_mode(AccessMode::ReadOnly)
        .map_err(|e| PopdashError::ReaderError(format!("Invalid DuckDB config: {}", e)))?;
    Connection::open_with_flags(path, config).map_err(|e| {
        PopdashError::ReaderError(format!("Failed to open DuckDB file '{}': {}", path, e))
    })
}

impl Store for DuckDBStore {
    type Reader = DuckDBReader;

    fn acquire(&self) -> Result<DuckDBReader> {
        let conn = match (&self.info, &self.seed) {
            (_, Some(seed)) => {
                let seed = seed.lock().map_err(|e| {
                    PopdashError::InternalError(format!("Failed to lock seed connection: {}", e))
                })?;
                seed.try_clone().map_err(|e| {
                    PopdashError::ReaderError(format!("Failed to clone DuckDB connection: {}", e))
                })?
            }
            (ConnectionInfo::DuckDBFile(path), None) => open_read_only(path)?,
            (ConnectionInfo::DuckDBMemory, None) => {
                return Err(PopdashError::InternalError(
                    "In-memory store has no seed connection".to_string(),
                ))
            }
        };
        tracing::debug!("Acquired DuckDB connection");
        Ok(DuckDBReader { conn })
    }
}

/// DuckDB database reader
///
/// Wraps one connection. The connection is closed when the reader is dropped.
pub struct DuckDBReader {
    conn: Connection,
}

impl DuckDBReader {
    /// Get a reference to the underlying DuckDB connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Drop for DuckDBReader {
    fn drop(&mut self) {
        tracing::debug!("Released DuckDB connection");
    }
}

/// Helper struct for building typed columns from rows
///
/// Integer widths collapse to i64 and every fractional type (including
/// DECIMAL, which is what DuckDB produces for `SUM` over decimals) to f64.
enum ColumnBuilder {
    Integer(Vec<Option<i64>>),
    HugeInt(Vec<Option<i128>>), // Will check overflow
    UBigInt(Vec<Option<u64>>),  // Keep as u64, check overflow
    Double(Vec<Option<f64>>),
    Boolean(Vec<Option<bool>>),
    Text(Vec<Option<String>>),
    Fallback(Vec<Option<String>>), // Fallback for unsupported types
}

impl ColumnBuilder {
    fn new(duckdb_type: duckdb::types::Type) -> Self {
        use duckdb::types::Type;
        match duckdb_type {
            Type::TinyInt
            | Type::SmallInt
            | Type::Int
            | Type::BigInt
            | Type::UTinyInt
            | Type::USmallInt
            | Type::UInt => ColumnBuilder::Integer(Vec::new()),
            Type::UBigInt => ColumnBuilder::UBigInt(Vec::new()),
            Type::HugeInt => ColumnBuilder::HugeInt(Vec::new()),
            Type::Float | Type::Double | Type::Decimal => ColumnBuilder::Double(Vec::new()),
            Type::Boolean => ColumnBuilder::Boolean(Vec::new()),
            Type::Text => ColumnBuilder::Text(Vec::new()),
            _ => ColumnBuilder::Fallback(Vec::new()),
        }
    }

    fn add_value(&mut self, row: &duckdb::Row, col_idx: usize) {
        use ColumnBuilder::*;
        match self {
            Integer(values) => {
                let val = match row.get_ref(col_idx) {
                    Ok(ValueRef::TinyInt(i)) => Some(i as i64),
                    Ok(ValueRef::SmallInt(i)) => Some(i as i64),
                    Ok(ValueRef::Int(i)) => Some(i as i64),
                    Ok(ValueRef::BigInt(i)) => Some(i),
                    Ok(ValueRef::UTinyInt(i)) => Some(i as i64),
                    Ok(ValueRef::USmallInt(i)) => Some(i as i64),
                    Ok(ValueRef::UInt(i)) => Some(i as i64),
                    _ => None,
                };
                values.push(val);
            }
            HugeInt(values) => values.push(row.get(col_idx).ok()),
            UBigInt(values) => values.push(row.get(col_idx).ok()),
            Double(values) => {
                let val = match row.get_ref(col_idx) {
                    Ok(ValueRef::Decimal(d)) => {
                        // Convert Decimal to string, then parse as f64
                        d.to_string().parse::<f64>().ok()
                    }
                    Ok(ValueRef::Null) => None,
                    Ok(ValueRef::TinyInt(i)) => Some(i as f64),
                    Ok(ValueRef::SmallInt(i)) => Some(i as f64),
                    Ok(ValueRef::Int(i)) => Some(i as f64),
                    Ok(ValueRef::BigInt(i)) => Some(i as f64),
                    Ok(ValueRef::HugeInt(i)) => Some(i as f64),
                    Ok(ValueRef::UTinyInt(i)) => Some(i as f64),
                    Ok(ValueRef::USmallInt(i)) => Some(i as f64),
                    Ok(ValueRef::UInt(i)) => Some(i as f64),
                    Ok(ValueRef::UBigInt(i)) => Some(i as f64),
                    Ok(ValueRef::Float(f)) => Some(f as f64),
                    Ok(ValueRef::Double(f)) => Some(f),
                    _ => None,
                };
                values.push(val);
            }
            Boolean(values) => values.push(row.get(col_idx).ok()),
            Text(values) => values.push(row.get(col_idx).ok()),
            Fallback(values) => {
                // Fallback: try to get as String, or use empty string
                let val: Option<String> = row.get(col_idx).ok();
                values.push(val.or(Some(String::new())));
            }
        }
    }

    fn build(self, column_name: &str) -> polars::prelude::Column {
        use polars::prelude::*;
        use ColumnBuilder::*;

        let series = match self {
            Integer(values) => Series::new(column_name.into(), values),
            HugeInt(values) => {
                let all_fit = values.iter().all(|opt_val| {
                    opt_val
                        .map(|val| val >= i64::MIN as i128 && val <= i64::MAX as i128)
                        .unwrap_or(true)
                });

                if all_fit {
                    let i64_values: Vec<Option<i64>> = values
                        .into_iter()
                        .map(|opt_val| opt_val.map(|val| val as i64))
                        .collect();
                    Series::new(column_name.into(), i64_values)
                } else {
                    tracing::warn!(
                        "HugeInt overflow in column '{}', converting to float",
                        column_name
                    );
                    let f64_values: Vec<Option<f64>> = values
                        .into_iter()
                        .map(|opt_val| opt_val.map(|val| val as f64))
                        .collect();
                    Series::new(column_name.into(), f64_values)
                }
            }
            UBigInt(values) => {
                let all_fit = values
                    .iter()
                    .all(|opt_val| opt_val.map(|val| val <= i64::MAX as u64).unwrap_or(true));

                if all_fit {
                    let i64_values: Vec<Option<i64>> = values
                        .into_iter()
                        .map(|opt_val| opt_val.map(|val| val as i64))
                        .collect();
                    Series::new(column_name.into(), i64_values)
                } else {
                    tracing::warn!(
                        "UBigInt overflow in column '{}', converting to float",
                        column_name
                    );
                    let f64_values: Vec<Option<f64>> = values
                        .into_iter()
                        .map(|opt_val| opt_val.map(|val| val as f64))
                        .collect();
                    Series::new(column_name.into(), f64_values)
                }
            }
            Double(values) => Series::new(column_name.into(), values),
            Boolean(values) => Series::new(column_name.into(), values),
            Text(values) => Series::new(column_name.into(), values),
            Fallback(values) => {
                tracing::warn!(
                    "Using fallback string conversion for column '{}'",
                    column_name
                );
                Series::new(column_name.into(), values)
            }
        };
        Column::from(series)
    }
}

impl Reader for DuckDBReader {
    fn execute(&self, sql: &str) -> Result<DataFrame> {
        // Prepare and execute statement to get schema
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| PopdashError::ReaderError(format!("Failed to prepare SQL: {}", e)))?;

        // Execute to populate schema info
        stmt.execute(params![])
            .map_err(|e| PopdashError::ReaderError(format!("Failed to execute SQL: {}", e)))?;

        // Get column metadata BEFORE creating iterator
        let column_count = stmt.column_count();
        if column_count == 0 {
            return Err(PopdashError::ReaderError(
                "Query returned no columns".to_string(),
            ));
        }

        let mut column_names = Vec::with_capacity(column_count);
        let mut column_builders = Vec::with_capacity(column_count);
        for i in 0..column_count {
            column_names.push(
                stmt.column_name(i)
                    .map_err(|e| {
                        PopdashError::ReaderError(format!("Failed to get column name: {}", e))
                    })?
                    .to_string(),
            );
            let data_type = stmt.column_type(i);
            column_builders.push(ColumnBuilder::new(duckdb::types::Type::from(&data_type)));
        }

        // Collect all values using query_map (which borrows stmt mutably during iteration)
        let builders_cell = std::cell::RefCell::new(column_builders);

        stmt.query_map(params![], |row| {
            let mut builders = builders_cell.borrow_mut();
            for (col_idx, builder) in builders.iter_mut().enumerate() {
                builder.add_value(row, col_idx);
            }
            Ok(())
        })
        .map_err(|e| PopdashError::ReaderError(format!("Failed to iterate rows: {}", e)))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| PopdashError::ReaderError(format!("Failed to process rows: {}", e)))?;

        // Zero rows still yields typed, empty columns
        let columns = builders_cell
            .into_inner()
            .into_iter()
            .zip(column_names.iter())
            .map(|(builder, name)| builder.build(name))
            .collect();

        DataFrame::new(columns)
            .map_err(|e| PopdashError::ReaderError(format!("Failed to create DataFrame: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_create_in_memory() {
        let store = DuckDBStore::from_connection_string("duckdb://memory");
        assert!(store.is_ok());
    }

    #[test]
    fn test_simple_query() {
        let store = DuckDBStore::from_connection_string("duckdb://memory").unwrap();
        let df = store.acquire().unwrap().execute("SELECT 1 as x, 2 as y").unwrap();

        assert_eq!(df.shape(), (1, 2));
        assert_eq!(names(&df), vec!["x", "y"]);
    }

    #[test]
    fn test_memory_store_shares_database_between_readers() {
        let store = DuckDBStore::from_connection_string("duckdb://memory").unwrap();
        store
            .with_connection(|conn| {
                conn.execute_batch(
                    "CREATE TABLE region(location_code INTEGER, name VARCHAR);
                     INSERT INTO region VALUES (908, 'Europe'), (935, 'Asia');",
                )
                .map_err(|e| PopdashError::ReaderError(e.to_string()))
            })
            .unwrap();

        let first = store.acquire().unwrap();
        let second = store.acquire().unwrap();
        assert_eq!(first.execute("SELECT * FROM region").unwrap().height(), 2);
        assert_eq!(second.execute("SELECT * FROM region").unwrap().height(), 2);
    }

    #[test]
    fn test_empty_result_keeps_columns() {
        let store = DuckDBStore::from_connection_string("duckdb://memory").unwrap();
        let df = store
            .acquire()
            .unwrap()
            .execute("SELECT 1 AS year, 'x' AS name WHERE 1 = 0")
            .unwrap();

        assert_eq!(df.height(), 0);
        assert_eq!(names(&df), vec!["year", "name"]);
    }

    #[test]
    fn test_invalid_sql() {
        let store = DuckDBStore::from_connection_string("duckdb://memory").unwrap();
        let result = store.acquire().unwrap().execute("INVALID SQL SYNTAX");
        assert!(matches!(result, Err(PopdashError::ReaderError(_))));
    }

    #[test]
    fn test_sum_over_integers_is_widened() {
        let store = DuckDBStore::from_connection_string("duckdb://memory").unwrap();
        let df = store
            .acquire()
            .unwrap()
            .execute(
                "SELECT SUM(v) AS total FROM (VALUES (CAST(1 AS BIGINT)), (CAST(2 AS BIGINT))) AS t(v)",
            )
            .unwrap();

        let totals = crate::reader::columns::f64_values(&df, "total").unwrap();
        assert_eq!(totals, vec![Some(3.0)]);
    }

    #[test]
    fn test_file_store_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wpp.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch("CREATE TABLE continent(location_code INTEGER, name VARCHAR);")
                .unwrap();
        }

        let uri = format!("duckdb://{}", path.display());
        let store = DuckDBStore::from_connection_string(&uri).unwrap();
        let reader = store.acquire().unwrap();

        assert!(reader.execute("SELECT * FROM continent").is_ok());
        assert!(reader
            .connection()
            .execute("INSERT INTO continent VALUES (1, 'x')", params![])
            .is_err());
    }
}
