/*!
# popdash - World population dashboard

Queries a relational store of UN World Population Prospects data and turns the
result into tables, Vega-Lite charts and a choropleth density map.

## Architecture

A request carries two parameters, `query` and `view`:
- **Dispatcher** → looks the pair up in a static route table
- **Query layer** → acquires one reader from the injected [`reader::Store`],
  runs one aggregation and decodes typed rows
- **Transforms** → rows become a [`transform::Table`], a [`plot::ChartSpec`]
  or a [`plot::MapSpec`]
- **Writer** → chart and map specs are rendered to Vega-Lite JSON and
  embeddable HTML

## Core Components

- [`reader`] - Store handle, readers and DataFrame decoding
- [`query`] - The four aggregation queries
- [`transform`] - Tables, chart specs and the density map join
- [`writer`] - Vega-Lite and HTML output
- [`dispatch`] - `(query, view)` routing
*/

pub mod about;
pub mod dispatch;
pub mod geo;
pub mod plot;
pub mod query;
pub mod reader;
pub mod transform;
pub mod writer;

#[cfg(feature = "duckdb")]
pub mod schema;

pub use dispatch::{dispatch, QueryKind, ViewContext, ViewKind, ViewResponse};
pub use geo::GeoSource;
pub use transform::map::MapPolicy;

// DataFrame abstraction (wraps Polars)
pub use polars::prelude::DataFrame;

/// Main library error type
#[derive(thiserror::Error, Debug)]
pub enum PopdashError {
    #[error("Data source error: {0}")]
    ReaderError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Output generation error: {0}")]
    WriterError(String),

    #[error("GeoJSON error: {0}")]
    GeoError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, PopdashError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
#[cfg(feature = "duckdb")]
mod integration_tests {
    use super::*;
    use crate::reader::DuckDBStore;
    use serde_json::{json, Value};

    fn sample_store() -> DuckDBStore {
        let store = DuckDBStore::from_connection_string("duckdb://memory").unwrap();
        store
            .with_connection(|conn| {
                schema::create_schema(conn)?;
                schema::load_sample_data(conn)
            })
            .unwrap();
        store
    }

    fn europe_borders() -> GeoSource {
        let features: Vec<Value> = ["France", "Germany", "Italy", "Poland", "Monaco", "Spain"]
            .iter()
            .map(|name| {
                json!({
                    "type": "Feature",
                    "properties": { "NAME_ENGL": name },
                    "geometry": { "type": "Point", "coordinates": [0.0, 0.0] }
                })
            })
            .collect();
        GeoSource::from_value(json!({ "type": "FeatureCollection", "features": features }))
    }

    fn context<'a>(
        store: &'a DuckDBStore,
        geo: &'a GeoSource,
        policy: &'a MapPolicy,
    ) -> ViewContext<'a, DuckDBStore> {
        ViewContext::new(store, geo, policy)
    }

    #[test]
    fn test_end_to_end_world_graph() {
        let store = sample_store();
        let geo = GeoSource::empty();
        let policy = MapPolicy::default();
        let ctx = context(&store, &geo, &policy);

        let response = dispatch(&ctx, Some("world"), Some("graph")).unwrap();

        assert_eq!(response.table.headers, vec!["Year", "Male", "Female", "Total"]);
        assert_eq!(response.table.rows.len(), 2);

        let chart = response.chart.expect("world graph has a chart");
        let layers = chart["layer"].as_array().unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0]["mark"]["type"], "area");
        assert_eq!(layers[1]["mark"]["type"], "line");
        assert!(response.plot_html.unwrap().contains("vegaEmbed"));
    }

    #[test]
    fn test_end_to_end_top10_table_only() {
        let store = sample_store();
        let geo = GeoSource::empty();
        let policy = MapPolicy::default();
        let ctx = context(&store, &geo, &policy);

        let response = dispatch(&ctx, Some("top10"), None).unwrap();

        assert_eq!(response.query, QueryKind::Top10);
        assert_eq!(response.view, ViewKind::Table);
        assert_eq!(response.table.headers.len(), 6);
        assert!(response.chart.is_none());
        assert!(response.plot_html.is_none());
    }

    #[test]
    fn test_end_to_end_europe_density_map() {
        let store = sample_store();
        let geo = europe_borders();
        let policy = MapPolicy::default();
        let ctx = context(&store, &geo, &policy);

        let response = dispatch(&ctx, Some("europe"), Some("dens_map")).unwrap();
        let map = response.chart.expect("europe map");

        let features = map["data"]["values"]["features"]
            .as_array()
            .unwrap();
        let names: Vec<&str> = features
            .iter()
            .map(|f| f["properties"]["NAME_ENGL"].as_str().unwrap())
            .collect();

        assert!(names.contains(&"France"));
        assert!(!names.contains(&"Monaco"));
        // Spain has a border but no facts in the sample data
        assert!(!names.contains(&"Spain"));
    }

    #[test]
    fn test_end_to_end_unknown_query() {
        let store = sample_store();
        let geo = GeoSource::empty();
        let policy = MapPolicy::default();
        let ctx = context(&store, &geo, &policy);

        let response = dispatch(&ctx, Some("foo"), Some("graph")).unwrap();

        assert_eq!(response.query, QueryKind::Unknown);
        assert!(response.table.headers.is_empty());
        assert!(response.table.rows.is_empty());
        assert!(response.chart.is_none());
    }

    #[test]
    fn test_end_to_end_missing_schema_is_reader_error() {
        let store = DuckDBStore::from_connection_string("duckdb://memory").unwrap();
        let geo = GeoSource::empty();
        let policy = MapPolicy::default();
        let ctx = context(&store, &geo, &policy);

        let err = dispatch(&ctx, Some("region"), Some("table")).unwrap_err();
        assert!(matches!(err, PopdashError::ReaderError(_)));
    }
}
