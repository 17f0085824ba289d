//! Data source abstraction layer for popdash
//!
//! The reader module provides the store handle that query functions receive,
//! and the readers it hands out for executing SQL and returning Polars
//! DataFrames.
//!
//! # Architecture
//!
//! - A [`Store`] is injected into every query function. It owns whatever is
//!   needed to open connections but never runs SQL itself.
//! - [`Store::acquire`] hands out a [`Reader`] scoped to one query. Dropping
//!   the reader releases its connection, so every exit path (success or `?`)
//!   gives the connection back.
//! - [`columns`] decodes DataFrame columns into plain Rust vectors for the
//!   typed row structs of the query layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use popdash::reader::{DuckDBStore, Reader, Store};
//!
//! let store = DuckDBStore::from_connection_string("duckdb://wpp.db")?;
//! let reader = store.acquire()?;
//! let df = reader.execute("SELECT * FROM region")?;
//! ```

use crate::{DataFrame, Result};

pub mod columns;
pub mod connection;

#[cfg(feature = "duckdb")]
pub mod duckdb;

#[cfg(feature = "duckdb")]
pub use duckdb::{DuckDBReader, DuckDBStore};

/// Trait for data source readers
///
/// Readers execute SQL queries and return Polars DataFrames.
/// A reader holds one open connection for as long as it lives.
pub trait Reader {
    /// Execute a SQL query and return the result as a DataFrame
    ///
    /// An empty result set is not an error: the DataFrame has the query's
    /// columns and zero rows.
    ///
    /// # Errors
    ///
    /// Returns `PopdashError::ReaderError` if:
    /// - The SQL is invalid
    /// - The connection fails
    /// - The table or columns don't exist
    fn execute(&self, sql: &str) -> Result<DataFrame>;
}

/// Handle on the population store, injected into the query layer
///
/// Implementations decide how a connection is obtained (new file connection,
/// clone of a shared in-memory database, test double) but every reader they
/// return must release its connection when dropped.
pub trait Store {
    type Reader: Reader;

    /// Acquire a reader for a single query
    fn acquire(&self) -> Result<Self::Reader>;
}
