//! Aggregation queries over the population store
//!
//! Each query acquires one reader from the injected [`Store`], runs a single
//! statement, decodes the typed rows and releases the reader before
//! returning. Failures surface as `PopdashError::ReaderError`; there is no
//! retry and no partial result.

pub mod sql;

use crate::reader::columns::{f64_values, i64_values, required, string_values};
use crate::reader::{Reader, Store};
use crate::{DataFrame, PopdashError, Result};
use serde::Serialize;

pub use sql::{EUROPE_REGION, TOP_N};

/// World population by sex for one year, in persons
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldRow {
    pub year: i32,
    pub male: f64,
    pub female: f64,
    pub total: f64,
}

/// Population of one region for one year, in persons
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionRow {
    pub region: String,
    pub year: i32,
    pub population: f64,
}

/// One ranked country for one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCountryRow {
    pub year: i32,
    pub country: String,
    pub subregion: String,
    pub region: String,
    pub continent: String,
    pub population: f64,
}

/// Population and density of one European country for one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EuropeRow {
    pub year: i32,
    pub country: String,
    pub population: f64,
    /// Persons per km²; absent when the store has no figure
    pub density: Option<f64>,
}

fn run<S: Store + ?Sized>(store: &S, name: &str, sql: &str) -> Result<DataFrame> {
    let reader = store.acquire()?;
    let df = reader.execute(sql)?;
    tracing::debug!("Query '{}' returned {} row(s)", name, df.height());
    Ok(df)
}

fn years(df: &DataFrame) -> Result<Vec<i32>> {
    i64_values(df, "year")?
        .into_iter()
        .enumerate()
        .map(|(row, year)| {
            let year = required(year, "year", row)?;
            i32::try_from(year).map_err(|_| {
                PopdashError::ReaderError(format!("Year {} out of range at row {}", year, row))
            })
        })
        .collect()
}

fn required_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    f64_values(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| required(v, name, row))
        .collect()
}

fn required_strings(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    string_values(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| required(v, name, row))
        .collect()
}

/// World population by sex and year, summed over every region-level fact row
///
/// `total` is `male + female` of the same row.
pub fn world_population_by_year<S: Store + ?Sized>(store: &S) -> Result<Vec<WorldRow>> {
    let df = run(store, "world", &sql::world_population_by_year())?;

    let years = years(&df)?;
    let male = required_f64(&df, "male")?;
    let female = required_f64(&df, "female")?;
    let total = required_f64(&df, "total")?;

    Ok(years
        .into_iter()
        .zip(male)
        .zip(female)
        .zip(total)
        .map(|(((year, male), female), total)| WorldRow {
            year,
            male,
            female,
            total,
        })
        .collect())
}

/// Population per region and year, summed over the region's countries
pub fn population_by_region<S: Store + ?Sized>(store: &S) -> Result<Vec<RegionRow>> {
    let df = run(store, "region", &sql::population_by_region())?;

    let regions = required_strings(&df, "region")?;
    let years = years(&df)?;
    let population = required_f64(&df, "population")?;

    Ok(regions
        .into_iter()
        .zip(years)
        .zip(population)
        .map(|((region, year), population)| RegionRow {
            region,
            year,
            population,
        })
        .collect())
}

/// The [`TOP_N`] most populous countries of every year
pub fn top10_countries_by_year<S: Store + ?Sized>(store: &S) -> Result<Vec<TopCountryRow>> {
    let df = run(store, "top10", &sql::top_countries_by_year())?;

    let years = years(&df)?;
    let countries = required_strings(&df, "country")?;
    let subregions = required_strings(&df, "subregion")?;
    let regions = required_strings(&df, "region")?;
    let continents = required_strings(&df, "continent")?;
    let population = required_f64(&df, "population")?;

    Ok(years
        .into_iter()
        .zip(countries)
        .zip(subregions)
        .zip(regions)
        .zip(continents)
        .zip(population)
        .map(
            |(((((year, country), subregion), region), continent), population)| TopCountryRow {
                year,
                country,
                subregion,
                region,
                continent,
                population,
            },
        )
        .collect())
}

/// Population and density of every country of the [`EUROPE_REGION`]
pub fn europe_population_by_year<S: Store + ?Sized>(store: &S) -> Result<Vec<EuropeRow>> {
    let df = run(store, "europe", &sql::europe_population_by_year())?;

    let years = years(&df)?;
    let countries = required_strings(&df, "country")?;
    let population = required_f64(&df, "population")?;
    let density = f64_values(&df, "density")?;

    Ok(years
        .into_iter()
        .zip(countries)
        .zip(population)
        .zip(density)
        .map(|(((year, country), population), density)| EuropeRow {
            year,
            country,
            population,
            density,
        })
        .collect())
}

#[cfg(all(test, feature = "duckdb"))]
pub(crate) mod test_support {
    //! In-memory store fixtures shared by query and dispatch tests

    use crate::reader::DuckDBStore;
    use crate::{schema, PopdashError};

    /// Empty schema in a fresh in-memory database
    pub fn empty_store() -> DuckDBStore {
        let store = DuckDBStore::from_connection_string("duckdb://memory").unwrap();
        store.with_connection(schema::create_schema).unwrap();
        store
    }

    /// Schema plus the given INSERT statements
    pub fn store_with(sql: &str) -> DuckDBStore {
        let store = empty_store();
        store
            .with_connection(|conn| {
                conn.execute_batch(sql)
                    .map_err(|e| PopdashError::ReaderError(e.to_string()))
            })
            .unwrap();
        store
    }

    /// Hierarchy with one continent, two regions (Europe, Asia) and their
    /// subregions; callers add countries and facts
    pub const HIERARCHY: &str = "
        INSERT INTO continent VALUES (900, 'World');
        INSERT INTO region VALUES (908, 'Europe', 900), (935, 'Asia', 900);
        INSERT INTO subregion VALUES (155, 'Western Europe', 908), (30, 'Eastern Asia', 935);
    ";
}
