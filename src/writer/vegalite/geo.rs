//! Choropleth rendering for the Vega-Lite writer

use crate::plot::MapSpec;
use crate::{PopdashError, Result};
use serde_json::{json, Value};

/// Threshold scale domain: the interior bin edges
///
/// `n` edges define `n - 1` classes; a threshold scale with `n - 2` cut
/// points yields exactly those classes. The top edge only closes the last
/// class and may sit below the fixed edges when every value is small.
pub(super) fn threshold_domain(bins: &[f64]) -> Vec<f64> {
    match bins.len() {
        0..=2 => Vec::new(),
        n => bins[1..n - 1].to_vec(),
    }
}

pub(super) fn validate_map(spec: &MapSpec) -> Result<()> {
    if spec.bins.len() < 2 {
        return Err(PopdashError::ValidationError(format!(
            "A choropleth needs at least two bin edges, got {}",
            spec.bins.len()
        )));
    }
    if spec.bins.iter().any(|edge| !edge.is_finite()) {
        return Err(PopdashError::ValidationError(
            "Choropleth bin edges must be finite".to_string(),
        ));
    }
    if !spec.features["features"].is_array() {
        return Err(PopdashError::ValidationError(
            "Choropleth data must be a FeatureCollection".to_string(),
        ));
    }
    Ok(())
}

/// Border features shared by every map layer
pub(super) fn map_data(spec: &MapSpec) -> Value {
    json!({
        "values": spec.features,
        "format": { "type": "json", "property": "features" }
    })
}

/// Fill layer coloured by binned value
pub(super) fn build_choropleth_layer(spec: &MapSpec) -> Value {
    json!({
        "mark": {
            "type": "geoshape",
            "fillOpacity": 0.6,
            "stroke": "#FFFFFF",
            "strokeOpacity": 0.4
        },
        "encoding": {
            "color": {
                "field": format!("properties.{}", spec.value_property),
                "type": "quantitative",
                "title": spec.legend_title,
                "scale": {
                    "type": "threshold",
                    "domain": threshold_domain(&spec.bins),
                    "scheme": spec.scheme
                }
            }
        }
    })
}

/// Unfilled country outlines carrying the name/value tooltip
pub(super) fn build_outline_layer(spec: &MapSpec) -> Value {
    json!({
        "mark": {
            "type": "geoshape",
            "filled": false,
            "stroke": "#000000",
            "strokeWidth": 1
        },
        "encoding": {
            "tooltip": [
                {
                    "field": format!("properties.{}", spec.name_property),
                    "type": "nominal",
                    "title": spec.name_label
                },
                {
                    "field": format!("properties.{}", spec.value_property),
                    "type": "quantitative",
                    "title": spec.legend_title,
                    "format": ",.1f"
                }
            ]
        }
    })
}
