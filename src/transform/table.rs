//! Labeled tables
//!
//! Every row type has a fixed, ordered header list; a table is just the
//! headers plus one cell vector per row.

use crate::query::{EuropeRow, RegionRow, TopCountryRow, WorldRow};
use serde::Serialize;
use serde_json::{json, Value};

/// Headers and cells ready for display
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// A table with no headers and no rows
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A row type that can be displayed as a table row
pub trait TableRow {
    /// Column labels, in cell order
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<Value>;
}

impl TableRow for WorldRow {
    const HEADERS: &'static [&'static str] = &["Year", "Male", "Female", "Total"];

    fn cells(&self) -> Vec<Value> {
        vec![
            json!(self.year),
            json!(self.male),
            json!(self.female),
            json!(self.total),
        ]
    }
}

impl TableRow for RegionRow {
    const HEADERS: &'static [&'static str] = &["Region", "Year", "Population"];

    fn cells(&self) -> Vec<Value> {
        vec![json!(self.region), json!(self.year), json!(self.population)]
    }
}

impl TableRow for TopCountryRow {
    const HEADERS: &'static [&'static str] = &[
        "Year",
        "Country",
        "Subregion",
        "Region",
        "Continent",
        "Population",
    ];

    fn cells(&self) -> Vec<Value> {
        vec![
            json!(self.year),
            json!(self.country),
            json!(self.subregion),
            json!(self.region),
            json!(self.continent),
            json!(self.population),
        ]
    }
}

impl TableRow for EuropeRow {
    const HEADERS: &'static [&'static str] =
        &["Year", "Country", "Population", "Density (inh/km²)"];

    fn cells(&self) -> Vec<Value> {
        vec![
            json!(self.year),
            json!(self.country),
            json!(self.population),
            self.density.map(|d| json!(d)).unwrap_or(Value::Null),
        ]
    }
}

/// Build a table from typed rows
pub fn build_table<R: TableRow>(rows: &[R]) -> Table {
    Table {
        headers: R::HEADERS.iter().map(|h| h.to_string()).collect(),
        rows: rows.iter().map(TableRow::cells).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_table() {
        let rows = vec![WorldRow {
            year: 2023,
            male: 4.0e9,
            female: 4.1e9,
            total: 8.1e9,
        }];
        let table = build_table(&rows);

        assert_eq!(table.headers, vec!["Year", "Male", "Female", "Total"]);
        assert_eq!(table.rows[0][0], json!(2023));
        assert_eq!(table.rows[0][3], json!(8.1e9));
    }

    #[test]
    fn test_cells_match_headers() {
        let top = TopCountryRow {
            year: 2023,
            country: "India".to_string(),
            subregion: "Southern Asia".to_string(),
            region: "Asia".to_string(),
            continent: "World".to_string(),
            population: 1.438e9,
        };
        assert_eq!(top.cells().len(), TopCountryRow::HEADERS.len());

        let region = RegionRow {
            region: "Asia".to_string(),
            year: 2023,
            population: 4.7e9,
        };
        assert_eq!(region.cells().len(), RegionRow::HEADERS.len());
    }

    #[test]
    fn test_missing_density_is_null() {
        let rows = vec![EuropeRow {
            year: 2023,
            country: "Kosovo".to_string(),
            population: 1.7e6,
            density: None,
        }];
        let table = build_table(&rows);
        assert_eq!(table.rows[0][3], Value::Null);
    }

    #[test]
    fn test_empty_rows_keep_headers() {
        let table = build_table::<RegionRow>(&[]);
        assert_eq!(table.headers.len(), 3);
        assert!(table.is_empty());
    }
}
