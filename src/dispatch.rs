//! Request dispatch
//!
//! A request names a query and a view. The pair is looked up in a static
//! route table; each route runs exactly one query against the injected store
//! and derives the table and, for chart and map views, the rendered artifact
//! from the same rows.
//!
//! Lookup order:
//! 1. the exact `(query, view)` route
//! 2. the query's table route
//! 3. the empty "No data" view
//!
//! None of these fallbacks is an error; only store failures are.

use crate::about::about_table;
use crate::geo::GeoSource;
use crate::query;
use crate::reader::Store;
use crate::transform::{
    build_table, europe_density_map, region_chart, top10_chart, world_chart, MapPolicy, Table,
};
use crate::writer::html::embed_fragment;
use crate::writer::{VegaLiteWriter, Writer};
use crate::Result;
use serde::Serialize;
use serde_json::Value;

/// Data query named by the `query` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    World,
    Region,
    Top10,
    Europe,
    About,
    Unknown,
}

impl QueryKind {
    pub const DEFAULT: QueryKind = QueryKind::World;

    /// Parse the parameter; absent means `world`
    pub fn parse(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            None | Some("") => Self::DEFAULT,
            Some("world") => Self::World,
            Some("region") => Self::Region,
            Some("top10") => Self::Top10,
            Some("europe") => Self::Europe,
            Some("about") => Self::About,
            Some(_) => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::World => "world",
            Self::Region => "region",
            Self::Top10 => "top10",
            Self::Europe => "europe",
            Self::About => "about",
            Self::Unknown => "unknown",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::World => "World population by year",
            Self::Region => "Population by region",
            Self::Top10 => "Ten most populous countries",
            Self::Europe => "Population of European countries",
            Self::About => "About",
            Self::Unknown => "No data",
        }
    }
}

/// Presentation named by the `view` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Table,
    Graph,
    Map,
    DensMap,
    /// A value no route knows; served as the table
    Unspecified,
}

impl ViewKind {
    pub const DEFAULT: ViewKind = ViewKind::Table;

    /// Parse the parameter; absent means `table`
    pub fn parse(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            None | Some("") => Self::DEFAULT,
            Some("table") => Self::Table,
            Some("graph") => Self::Graph,
            Some("map") => Self::Map,
            Some("dens_map") => Self::DensMap,
            Some(_) => Self::Unspecified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Graph => "graph",
            Self::Map => "map",
            Self::DensMap => "dens_map",
            Self::Unspecified => "unspecified",
        }
    }
}

/// Everything a view needs to answer a request
pub struct ViewContext<'a, S: Store> {
    pub store: &'a S,
    pub geo: &'a GeoSource,
    pub policy: &'a MapPolicy,
    pub writer: VegaLiteWriter,
}

impl<'a, S: Store> ViewContext<'a, S> {
    pub fn new(store: &'a S, geo: &'a GeoSource, policy: &'a MapPolicy) -> Self {
        Self {
            store,
            geo,
            policy,
            writer: VegaLiteWriter::new(),
        }
    }
}

/// Answer to one request
#[derive(Debug, Clone, Serialize)]
pub struct ViewResponse {
    pub title: String,
    pub query: QueryKind,
    pub view: ViewKind,
    pub table: Table,
    /// Vega-Lite document of the chart or map, when the view has one
    pub chart: Option<Value>,
    /// Embeddable fragment drawing `chart`
    pub plot_html: Option<String>,
}

/// Table plus optional Vega-Lite artifact produced by a route
struct Rendered {
    table: Table,
    chart: Option<Value>,
}

impl Rendered {
    fn table(table: Table) -> Self {
        Self { table, chart: None }
    }
}

type ViewFn<S> = fn(&ViewContext<'_, S>) -> Result<Rendered>;

struct Route<S: Store> {
    query: QueryKind,
    view: ViewKind,
    render: ViewFn<S>,
}

fn route<S: Store>(query: QueryKind, view: ViewKind, render: ViewFn<S>) -> Route<S> {
    Route {
        query,
        view,
        render,
    }
}

fn routes<S: Store>() -> [Route<S>; 10] {
    use QueryKind as Q;
    use ViewKind as V;
    [
        route(Q::World, V::Table, world_table::<S>),
        route(Q::World, V::Graph, world_graph::<S>),
        route(Q::Region, V::Table, region_table::<S>),
        route(Q::Region, V::Graph, region_graph::<S>),
        route(Q::Top10, V::Table, top10_table::<S>),
        route(Q::Top10, V::Graph, top10_graph::<S>),
        route(Q::Europe, V::Table, europe_table::<S>),
        route(Q::Europe, V::Map, europe_map::<S>),
        route(Q::Europe, V::DensMap, europe_map::<S>),
        route(Q::About, V::Table, about::<S>),
    ]
}

fn world_table<S: Store>(ctx: &ViewContext<'_, S>) -> Result<Rendered> {
    let rows = query::world_population_by_year(ctx.store)?;
    Ok(Rendered::table(build_table(&rows)))
}

fn world_graph<S: Store>(ctx: &ViewContext<'_, S>) -> Result<Rendered> {
    let rows = query::world_population_by_year(ctx.store)?;
    Ok(Rendered {
        table: build_table(&rows),
        chart: Some(ctx.writer.write_chart(&world_chart(&rows))?),
    })
}

fn region_table<S: Store>(ctx: &ViewContext<'_, S>) -> Result<Rendered> {
    let rows = query::population_by_region(ctx.store)?;
    Ok(Rendered::table(build_table(&rows)))
}

fn region_graph<S: Store>(ctx: &ViewContext<'_, S>) -> Result<Rendered> {
    let rows = query::population_by_region(ctx.store)?;
    Ok(Rendered {
        table: build_table(&rows),
        chart: Some(ctx.writer.write_chart(&region_chart(&rows))?),
    })
}

fn top10_table<S: Store>(ctx: &ViewContext<'_, S>) -> Result<Rendered> {
    let rows = query::top10_countries_by_year(ctx.store)?;
    Ok(Rendered::table(build_table(&rows)))
}

fn top10_graph<S: Store>(ctx: &ViewContext<'_, S>) -> Result<Rendered> {
    let rows = query::top10_countries_by_year(ctx.store)?;
    Ok(Rendered {
        table: build_table(&rows),
        chart: Some(ctx.writer.write_chart(&top10_chart(&rows))?),
    })
}

fn europe_table<S: Store>(ctx: &ViewContext<'_, S>) -> Result<Rendered> {
    let rows = query::europe_population_by_year(ctx.store)?;
    Ok(Rendered::table(build_table(&rows)))
}

fn europe_map<S: Store>(ctx: &ViewContext<'_, S>) -> Result<Rendered> {
    let rows = query::europe_population_by_year(ctx.store)?;
    let map = europe_density_map(&rows, ctx.geo, ctx.policy);
    Ok(Rendered {
        table: build_table(&rows),
        chart: Some(ctx.writer.write_map(&map)?),
    })
}

fn about<S: Store>(_ctx: &ViewContext<'_, S>) -> Result<Rendered> {
    Ok(Rendered::table(about_table()))
}

/// Resolve a `(query, view)` pair to its route, applying the table fallback
fn lookup<S: Store>(query: QueryKind, view: ViewKind) -> Option<ViewFn<S>> {
    let table = routes::<S>();
    table
        .iter()
        .find(|r| r.query == query && r.view == view)
        .or_else(|| {
            table
                .iter()
                .find(|r| r.query == query && r.view == ViewKind::Table)
        })
        .map(|r| r.render)
}

/// Answer one request
///
/// Both parameters are optional; see [`QueryKind::parse`] and
/// [`ViewKind::parse`] for the defaults.
pub fn dispatch<S: Store>(
    ctx: &ViewContext<'_, S>,
    query: Option<&str>,
    view: Option<&str>,
) -> Result<ViewResponse> {
    let query = QueryKind::parse(query);
    let view = ViewKind::parse(view);

    let rendered = match lookup::<S>(query, view) {
        Some(render) => render(ctx)?,
        None => Rendered::table(Table::empty()),
    };

    let plot_html = rendered.chart.as_ref().map(embed_fragment).transpose()?;

    tracing::debug!(
        "Dispatched query={} view={}: {} row(s), artifact={}",
        query.as_str(),
        view.as_str(),
        rendered.table.len(),
        rendered.chart.is_some()
    );

    Ok(ViewResponse {
        title: query.title().to_string(),
        query,
        view,
        table: rendered.table,
        chart: rendered.chart,
        plot_html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        assert_eq!(QueryKind::parse(None), QueryKind::World);
        assert_eq!(ViewKind::parse(None), ViewKind::Table);
        assert_eq!(QueryKind::parse(Some("")), QueryKind::World);
        assert_eq!(QueryKind::parse(Some("foo")), QueryKind::Unknown);
        assert_eq!(ViewKind::parse(Some("pie")), ViewKind::Unspecified);
        assert_eq!(ViewKind::parse(Some("dens_map")), ViewKind::DensMap);
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(serde_json::to_value(ViewKind::DensMap).unwrap(), "dens_map");
        assert_eq!(serde_json::to_value(QueryKind::Top10).unwrap(), "top10");
    }

    #[cfg(feature = "duckdb")]
    mod with_store {
        use super::*;
        use crate::query::test_support::{empty_store, store_with, HIERARCHY};
        use crate::reader::DuckDBStore;

        fn route_of(query: QueryKind, view: ViewKind) -> Option<ViewFn<DuckDBStore>> {
            lookup::<DuckDBStore>(query, view)
        }

        #[test]
        fn test_every_query_has_a_table_route() {
            for query in [
                QueryKind::World,
                QueryKind::Region,
                QueryKind::Top10,
                QueryKind::Europe,
                QueryKind::About,
            ] {
                assert!(route_of(query, ViewKind::Table).is_some(), "{:?}", query);
            }
            assert!(route_of(QueryKind::Unknown, ViewKind::Table).is_none());
        }

        #[test]
        fn test_inapplicable_view_falls_back_to_table() {
            let store = empty_store();
            let geo = GeoSource::empty();
            let policy = MapPolicy::default();
            let ctx = ViewContext::new(&store, &geo, &policy);

            for (query, view) in [
                ("world", "map"),
                ("region", "dens_map"),
                ("europe", "graph"),
                ("about", "graph"),
                ("top10", "pie"),
            ] {
                let response = dispatch(&ctx, Some(query), Some(view)).unwrap();
                assert!(response.chart.is_none(), "{} {}", query, view);
                assert!(response.plot_html.is_none());
                assert!(!response.table.headers.is_empty());
            }
        }

        #[test]
        fn test_unknown_query_is_empty() {
            let store = empty_store();
            let geo = GeoSource::empty();
            let policy = MapPolicy::default();
            let ctx = ViewContext::new(&store, &geo, &policy);

            let response = dispatch(&ctx, Some("foo"), None).unwrap();
            assert_eq!(response.title, "No data");
            assert_eq!(response.table, Table::empty());
            assert!(response.chart.is_none());
        }

        #[test]
        fn test_map_and_dens_map_are_the_same_view() {
            let store = store_with(&format!(
                "{}
                INSERT INTO country VALUES (250, 'France', 155);
                INSERT INTO fact_population VALUES
                    (250, 2023, 33000, 35000, NULL, 122.0);",
                HIERARCHY
            ));
            let geo = GeoSource::from_value(serde_json::json!({
                "type": "FeatureCollection",
                "features": [{ "type": "Feature", "properties": { "NAME_ENGL": "France" } }]
            }));
            let policy = MapPolicy::default();
            let ctx = ViewContext::new(&store, &geo, &policy);

            let map = dispatch(&ctx, Some("europe"), Some("map")).unwrap();
            let dens_map = dispatch(&ctx, Some("europe"), Some("dens_map")).unwrap();

            assert_eq!(map.chart, dens_map.chart);
            assert_eq!(map.table, dens_map.table);
            assert_eq!(map.view, ViewKind::Map);
            assert_eq!(dens_map.view, ViewKind::DensMap);
        }

        #[test]
        fn test_about_needs_no_schema() {
            let store = empty_store();
            let geo = GeoSource::empty();
            let policy = MapPolicy::default();
            let ctx = ViewContext::new(&store, &geo, &policy);

            let response = dispatch(&ctx, Some("about"), None).unwrap();
            assert_eq!(response.table.headers, vec!["Item", "Details"]);
        }
    }
}
