//! Static project information shown by the `about` query

use crate::transform::Table;
use crate::VERSION;
use serde_json::json;

pub const ABOUT_HEADERS: [&str; 2] = ["Item", "Details"];

const ABOUT_ROWS: [(&str, &str); 8] = [
    ("Project", "popdash, a dashboard of world population figures"),
    (
        "Data source",
        "United Nations, Department of Economic and Social Affairs, World Population Prospects",
    ),
    (
        "Data download",
        "https://population.un.org/wpp/downloads?folder=Standard",
    ),
    ("Period", "1950 to 2023"),
    (
        "Population",
        "Persons, stored in thousands; the total is male plus female",
    ),
    ("Density", "Inhabitants per square kilometre"),
    (
        "Country borders",
        "GeoJSON feature collection matched on the NAME_ENGL property",
    ),
    (
        "Density map",
        "Micro-states are left out so that they do not flatten the colour scale",
    ),
];

/// The about table, version row included
pub fn about_table() -> Table {
    let mut rows: Vec<_> = ABOUT_ROWS
        .iter()
        .map(|(item, details)| vec![json!(item), json!(details)])
        .collect();
    rows.insert(1, vec![json!("Version"), json!(VERSION)]);

    Table {
        headers: ABOUT_HEADERS.iter().map(|h| h.to_string()).collect(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_about_table_shape() {
        let table = about_table();
        assert_eq!(table.headers, vec!["Item", "Details"]);
        assert_eq!(table.len(), ABOUT_ROWS.len() + 1);
        assert!(table.rows.iter().all(|row| row.len() == 2));
        assert_eq!(table.rows[1][1], json!(VERSION));
    }
}
