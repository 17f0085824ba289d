//! Population store schema and data loading
//!
//! The dashboard only reads from the store. These helpers exist so a DuckDB
//! database can be bootstrapped (`popdash init`, `popdash-rest --load-data`)
//! and so tests get a known fixture.

use crate::{PopdashError, Result};
use duckdb::{params, Connection};
use std::path::Path;
use tracing::info;

/// Tables of the geographic hierarchy plus the fact table, in load order
pub const TABLES: [&str; 5] = [
    "continent",
    "region",
    "subregion",
    "country",
    "fact_population",
];

/// DDL for the population store
///
/// Population columns are in thousands of persons, density in persons per
/// square kilometre.
pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS continent (
    location_code INTEGER PRIMARY KEY,
    name VARCHAR NOT NULL
);
CREATE TABLE IF NOT EXISTS region (
    location_code INTEGER PRIMARY KEY,
    name VARCHAR NOT NULL,
    parent_code INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS subregion (
    location_code INTEGER PRIMARY KEY,
    name VARCHAR NOT NULL,
    parent_code INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS country (
    location_code INTEGER PRIMARY KEY,
    name VARCHAR NOT NULL,
    parent_code INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS fact_population (
    location_code INTEGER NOT NULL,
    year INTEGER NOT NULL,
    male_population DOUBLE,
    female_population DOUBLE,
    total_population DOUBLE,
    population_density DOUBLE,
    PRIMARY KEY (location_code, year)
);
";

/// Create every table of the schema (idempotent)
pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| PopdashError::ReaderError(format!("Failed to create schema: {}", e)))
}

/// Load a CSV, Parquet or JSON file into the schema table named by its stem
///
/// `data/country.csv` is appended to `country`. Files whose stem is not one
/// of [`TABLES`] are rejected.
pub fn load_table_file(conn: &Connection, file_path: &str) -> Result<()> {
    let path = Path::new(file_path);

    if !path.exists() {
        return Err(PopdashError::ReaderError(format!(
            "File not found: {}",
            file_path
        )));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let table_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .replace('-', "_")
        .to_lowercase();

    if !TABLES.contains(&table_name.as_str()) {
        return Err(PopdashError::ValidationError(format!(
            "File '{}' does not name a schema table (expected one of: {})",
            file_path,
            TABLES.join(", ")
        )));
    }

    let source = match extension.as_str() {
        "csv" => format!("read_csv_auto('{}')", escape_literal(file_path)),
        "parquet" => format!("read_parquet('{}')", escape_literal(file_path)),
        "json" | "jsonl" | "ndjson" => format!("read_json_auto('{}')", escape_literal(file_path)),
        _ => {
            return Err(PopdashError::ReaderError(format!(
                "Unsupported file format: {} (supported: csv, parquet, json, jsonl, ndjson)",
                extension
            )));
        }
    };

    info!("Loading {} into table '{}'", file_path, table_name);

    let sql = format!(
        "INSERT INTO {} BY NAME SELECT * FROM {}",
        table_name, source
    );
    let inserted = conn.execute(&sql, params![]).map_err(|e| {
        PopdashError::ReaderError(format!("Failed to load {}: {}", file_path, e))
    })?;

    info!("Loaded {} row(s) into '{}'", inserted, table_name);
    Ok(())
}

/// Load several files, in the order of [`TABLES`] so parents precede children
pub fn load_table_files(conn: &Connection, files: &[String]) -> Result<()> {
    let mut ordered: Vec<&String> = files.iter().collect();
    ordered.sort_by_key(|file| {
        let stem = Path::new(file.as_str())
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        TABLES
            .iter()
            .position(|t| *t == stem)
            .unwrap_or(TABLES.len())
    });
    for file in ordered {
        load_table_file(conn, file)?;
    }
    Ok(())
}

pub(crate) fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Small demonstration dataset: two regions, eight countries, 2022-2023
///
/// Figures are rounded WPP 2024 estimates (thousands of persons).
pub fn load_sample_data(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        INSERT INTO continent VALUES (900, 'World');

        INSERT INTO region VALUES
            (908, 'Europe', 900),
            (935, 'Asia', 900);

        INSERT INTO subregion VALUES
            (155, 'Western Europe', 908),
            (151, 'Eastern Europe', 908),
            (39, 'Southern Europe', 908),
            (30, 'Eastern Asia', 935),
            (34, 'Southern Asia', 935);

        INSERT INTO country VALUES
            (250, 'France', 155),
            (276, 'Germany', 155),
            (492, 'Monaco', 155),
            (616, 'Poland', 151),
            (380, 'Italy', 39),
            (156, 'China', 30),
            (392, 'Japan', 30),
            (356, 'India', 34);

        INSERT INTO fact_population VALUES
            (908, 2022, 359000.0, 384000.0, 743000.0, 33.6),
            (908, 2023, 358600.0, 383700.0, 742300.0, 33.5),
            (935, 2022, 2405000.0, 2317000.0, 4722000.0, 152.1),
            (935, 2023, 2417000.0, 2336000.0, 4753000.0, 153.0),
            (250, 2022, 32900.0, 35100.0, 68000.0, 124.2),
            (250, 2023, 32950.0, 35220.0, 68170.0, 124.5),
            (276, 2022, 41500.0, 42300.0, 83800.0, 240.0),
            (276, 2023, 41700.0, 42480.0, 84180.0, 241.1),
            (492, 2022, 18.6, 19.8, 38.4, 19170.0),
            (492, 2023, 18.7, 19.9, 38.6, 19300.0),
            (616, 2022, 19300.0, 20500.0, 39800.0, 129.8),
            (616, 2023, 18900.0, 20000.0, 38900.0, 126.9),
            (380, 2022, 28900.0, 30100.0, 59000.0, 200.4),
            (380, 2023, 28800.0, 30050.0, 58850.0, 199.9),
            (156, 2022, 720000.0, 705000.0, 1425000.0, 151.6),
            (156, 2023, 719000.0, 703000.0, 1422000.0, 151.3),
            (392, 2022, 60400.0, 63600.0, 124000.0, 340.0),
            (392, 2023, 60000.0, 63300.0, 123300.0, 338.2),
            (356, 2022, 737000.0, 688000.0, 1425000.0, 479.2),
            (356, 2023, 743000.0, 695000.0, 1438000.0, 483.6);
        ",
    )
    .map_err(|e| PopdashError::ReaderError(format!("Failed to insert sample data: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        conn
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), params![], |row| {
            row.get(0)
        })
        .unwrap()
    }

    #[test]
    fn test_create_schema_is_idempotent() {
        let conn = memory();
        create_schema(&conn).unwrap();
        for table in TABLES {
            assert_eq!(count(&conn, table), 0);
        }
    }

    #[test]
    fn test_sample_data() {
        let conn = memory();
        load_sample_data(&conn).unwrap();
        assert_eq!(count(&conn, "country"), 8);
        assert_eq!(count(&conn, "fact_population"), 20);
    }

    #[test]
    fn test_load_csv_by_table_name() {
        let conn = memory();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("continent.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "location_code,name").unwrap();
        writeln!(file, "900,World").unwrap();
        drop(file);

        load_table_file(&conn, path.to_str().unwrap()).unwrap();
        assert_eq!(count(&conn, "continent"), 1);
    }

    #[test]
    fn test_load_rejects_unknown_table() {
        let conn = memory();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        let err = load_table_file(&conn, path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, PopdashError::ValidationError(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let conn = memory();
        let err = load_table_file(&conn, "/nonexistent/country.csv").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal("O'Brien"), "O''Brien");
    }
}
