//! Density map: spatial join of European densities into country borders
//!
//! 1. keep the rows of the reference year
//! 2. drop the excluded micro-states
//! 3. build a name → density lookup (NULL densities are left out)
//! 4. keep only border features whose `NAME_ENGL` is in the lookup and copy
//!    the density into their properties
//!
//! A country without a figure is never drawn, not even with a placeholder.

use crate::geo::{feature_collection, feature_name, GeoSource, NAME_PROPERTY};
use crate::plot::MapSpec;
use crate::query::EuropeRow;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Year shown by the density map unless configured otherwise
pub const DEFAULT_REFERENCE_YEAR: i32 = 2023;

/// Territories whose density on a tiny area would flatten the colour scale
pub const EXCLUDED_MICRO_STATES: [&str; 7] = [
    "Monaco",
    "Gibraltar",
    "Holy See",
    "Malta",
    "San Marino",
    "Guernsey",
    "Jersey",
];

/// Fixed lower bin edges; the upper edge is the largest density shown
pub const DENSITY_BIN_EDGES: [f64; 5] = [0.0, 50.0, 100.0, 200.0, 400.0];

/// Feature property receiving the injected density
pub const DENSITY_PROPERTY: &str = "DENSITY";

/// Sequential colour scheme (yellow → green → blue)
pub const DENSITY_SCHEME: &str = "yellowgreenblue";

/// Which rows the density map keeps
#[derive(Debug, Clone, PartialEq)]
pub struct MapPolicy {
    pub reference_year: i32,
    pub excluded: Vec<String>,
}

impl Default for MapPolicy {
    fn default() -> Self {
        Self {
            reference_year: DEFAULT_REFERENCE_YEAR,
            excluded: EXCLUDED_MICRO_STATES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl MapPolicy {
    pub fn is_excluded(&self, country: &str) -> bool {
        self.excluded.iter().any(|c| c == country)
    }
}

/// Name → density for the reference year, exclusions applied
pub fn density_lookup(rows: &[EuropeRow], policy: &MapPolicy) -> HashMap<String, f64> {
    rows.iter()
        .filter(|row| row.year == policy.reference_year)
        .filter(|row| !policy.is_excluded(&row.country))
        .filter_map(|row| row.density.map(|d| (row.country.clone(), d)))
        .collect()
}

/// Border features of the looked-up countries, each enriched with its density
pub fn join_densities(geo: &GeoSource, lookup: &HashMap<String, f64>) -> Vec<Value> {
    geo.features()
        .iter()
        .filter_map(|feature| {
            let density = *lookup.get(feature_name(feature)?)?;
            let mut feature = feature.clone();
            feature["properties"][DENSITY_PROPERTY] = json!(density);
            Some(feature)
        })
        .collect()
}

/// Bin edges `[0, 50, 100, 200, 400, max]`
///
/// With no data the top edge repeats the last fixed edge.
pub fn density_bins(lookup: &HashMap<String, f64>) -> Vec<f64> {
    let last_fixed = DENSITY_BIN_EDGES[DENSITY_BIN_EDGES.len() - 1];
    let max = lookup.values().copied().fold(f64::NAN, f64::max);
    let mut bins = DENSITY_BIN_EDGES.to_vec();
    bins.push(if max.is_nan() { last_fixed } else { max });
    bins
}

/// Choropleth of European population density in the reference year
pub fn europe_density_map(rows: &[EuropeRow], geo: &GeoSource, policy: &MapPolicy) -> MapSpec {
    let lookup = density_lookup(rows, policy);
    let features = join_densities(geo, &lookup);

    tracing::debug!(
        "Density map {}: {} countries with data, {} features drawn",
        policy.reference_year,
        lookup.len(),
        features.len()
    );

    MapSpec {
        title: format!(
            "Population density of European countries in {}",
            policy.reference_year
        ),
        features: feature_collection(features),
        name_property: NAME_PROPERTY.to_string(),
        value_property: DENSITY_PROPERTY.to_string(),
        bins: density_bins(&lookup),
        scheme: DENSITY_SCHEME.to_string(),
        legend_title: format!(
            "Density in {} (inh/km²)",
            policy.reference_year
        ),
        name_label: "Country".to_string(),
    }
}
