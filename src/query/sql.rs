//! SQL text for the aggregation queries
//!
//! Fact population columns hold thousands of persons; every query scales to
//! persons. A fact row's person total is always derived from the sex split
//! (NULL counted as zero), never from the stored `total_population` column,
//! so world, region, ranking and Europe figures agree with each other.

/// Name of the region whose countries feed the Europe views
pub const EUROPE_REGION: &str = "Europe";

/// Number of countries kept per year in the ranking
pub const TOP_N: usize = 10;

/// Persons per unit of the fact table's population columns
pub const PERSONS_PER_UNIT: u32 = 1000;

fn male_persons() -> String {
    format!("COALESCE(fp.male_population, 0) * {}", PERSONS_PER_UNIT)
}

fn female_persons() -> String {
    format!("COALESCE(fp.female_population, 0) * {}", PERSONS_PER_UNIT)
}

/// Canonical person total of one fact row
pub fn total_persons() -> String {
    format!(
        "(COALESCE(fp.male_population, 0) + COALESCE(fp.female_population, 0)) * {}",
        PERSONS_PER_UNIT
    )
}

/// Joins a fact row to its country and the country's subregion and region
const COUNTRY_JOINS: &str = "
    JOIN country c ON fp.location_code = c.location_code
    JOIN subregion sr ON c.parent_code = sr.location_code
    JOIN region r ON sr.parent_code = r.location_code";

pub fn world_population_by_year() -> String {
    format!(
        "SELECT
            CAST(fp.year AS INTEGER) AS year,
            CAST(SUM({male}) AS DOUBLE) AS male,
            CAST(SUM({female}) AS DOUBLE) AS female,
            CAST(SUM({male}) + SUM({female}) AS DOUBLE) AS total
        FROM fact_population fp
        WHERE fp.location_code IN (SELECT location_code FROM region)
        GROUP BY fp.year
        ORDER BY fp.year",
        male = male_persons(),
        female = female_persons(),
    )
}

pub fn population_by_region() -> String {
    format!(
        "SELECT
            r.name AS region,
            CAST(fp.year AS INTEGER) AS year,
            CAST(SUM({total}) AS DOUBLE) AS population
        FROM fact_population fp{joins}
        GROUP BY r.name, fp.year
        ORDER BY r.name, fp.year",
        total = total_persons(),
        joins = COUNTRY_JOINS,
    )
}

/// Equal populations within a year are ranked by country name
pub fn top_countries_by_year() -> String {
    format!(
        "SELECT year, country, subregion, region, continent, population
        FROM (
            SELECT
                CAST(fp.year AS INTEGER) AS year,
                c.name AS country,
                sr.name AS subregion,
                r.name AS region,
                ct.name AS continent,
                CAST({total} AS DOUBLE) AS population,
                ROW_NUMBER() OVER (
                    PARTITION BY fp.year
                    ORDER BY {total} DESC, c.name ASC
                ) AS rn
            FROM fact_population fp{joins}
            JOIN continent ct ON r.parent_code = ct.location_code
        ) ranked
        WHERE rn <= {top_n}
        ORDER BY year, population DESC, country",
        total = total_persons(),
        joins = COUNTRY_JOINS,
        top_n = TOP_N,
    )
}

pub fn europe_population_by_year() -> String {
    format!(
        "SELECT
            CAST(fp.year AS INTEGER) AS year,
            c.name AS country,
            CAST({total} AS DOUBLE) AS population,
            CAST(fp.population_density AS DOUBLE) AS density
        FROM fact_population fp{joins}
        WHERE r.name = '{region}'
        ORDER BY c.name, fp.year",
        total = total_persons(),
        joins = COUNTRY_JOINS,
        region = EUROPE_REGION.replace('\'', "''"),
    )
}
