//! Choropleth map specification

use serde::Serialize;
use serde_json::Value;

/// A choropleth over an enriched GeoJSON FeatureCollection
///
/// Every feature in `features` carries `properties[name_property]` and a
/// numeric `properties[value_property]`; features lacking data were dropped
/// before the spec was built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSpec {
    pub title: String,
    pub features: Value,
    pub name_property: String,
    pub value_property: String,
    /// Bin edges, ascending; `n` edges give `n - 1` colour classes
    pub bins: Vec<f64>,
    /// Named sequential colour scheme
    pub scheme: String,
    pub legend_title: String,
    /// Tooltip label for the name property
    pub name_label: String,
}

impl MapSpec {
    /// Number of features that will be drawn
    pub fn feature_count(&self) -> usize {
        self.features["features"]
            .as_array()
            .map(|f| f.len())
            .unwrap_or(0)
    }
}
