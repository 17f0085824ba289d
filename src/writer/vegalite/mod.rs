//! Vega-Lite JSON writer implementation
//!
//! Converts chart and map specifications into Vega-Lite JSON for
//! web-based interactive visualizations.
//!
//! # Mapping Strategy
//!
//! - chart layers -> Vega-Lite layer composition, each with inline data
//! - Mark -> Vega-Lite mark type
//! - series field -> color channel
//! - Animation -> slider parameter plus a per-layer filter
//! - MapSpec -> shared GeoJSON data, a threshold-coloured fill layer and an
//!   outline layer with tooltips
//!
//! # Example
//!
//! ```rust,ignore
//! use popdash::writer::{Writer, VegaLiteWriter};
//!
//! let writer = VegaLiteWriter::new();
//! let vega_json = writer.write_chart(&chart)?;
//! // Can be rendered in browser with vega-embed
//! ```

mod geo;
mod layer;

use crate::plot::{ChartSpec, MapSpec};
use crate::writer::Writer;
use crate::{PopdashError, Result};
use serde_json::{json, Value};

use geo::{build_choropleth_layer, build_outline_layer, map_data, validate_map};
use layer::{build_layer, FRAME_PARAM};

/// Chart height in pixels; width follows the container
const CHART_HEIGHT: u32 = 420;
const MAP_HEIGHT: u32 = 560;

/// Vega-Lite JSON writer
///
/// Generates Vega-Lite v5 specifications.
#[derive(Debug, Clone)]
pub struct VegaLiteWriter {
    /// Vega-Lite schema version
    schema: String,
}

impl VegaLiteWriter {
    /// Create a new Vega-Lite writer with default settings
    pub fn new() -> Self {
        Self {
            schema: "https://vega.github.io/schema/vega-lite/v5.json".to_string(),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Light theme shared by charts and maps
    fn default_theme_config(&self) -> Value {
        json!({
            "view": {
                "stroke": null
            },
            "axis": {
                "grid": true,
                "gridColor": "#E5E5E5",
                "labelColor": "#4D4D4D",
                "labelFontSize": 12,
                "titleColor": "#000000",
                "titleFontSize": 14,
                "titleFontWeight": "normal",
                "titlePadding": 10
            },
            "legend": {
                "labelColor": "#4D4D4D",
                "labelFontSize": 12,
                "titleFontSize": 13,
                "titleFontWeight": "normal"
            },
            "title": {
                "fontSize": 18,
                "fontWeight": "normal",
                "anchor": "start",
                "offset": 10
            }
        })
    }

    fn base_spec(&self, title: &str, height: u32) -> Value {
        json!({
            "$schema": self.schema,
            "title": title,
            "width": "container",
            "height": height,
        })
    }
}

impl Default for VegaLiteWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer for VegaLiteWriter {
    type Output = Value;

    fn write_chart(&self, spec: &ChartSpec) -> Result<Value> {
        // 1. Validate spec
        self.validate_chart(spec)?;

        // 2. Base spec
        let mut vl_spec = self.base_spec(&spec.title, CHART_HEIGHT);

        // 3. Layers
        let layers: Vec<Value> = spec
            .layers
            .iter()
            .map(|layer| build_layer(spec, layer))
            .collect();
        if layers.len() > 1 {
            // Series legends and named single-series layers use separate scales
            vl_spec["resolve"] = json!({ "scale": { "color": "independent" } });
        }
        vl_spec["layer"] = json!(layers);

        // 4. Frame slider
        if let Some(animation) = &spec.animation {
            if let (Some(first), Some(last)) = (animation.frames.first(), animation.frames.last())
            {
                vl_spec["params"] = json!([{
                    "name": FRAME_PARAM,
                    "value": first,
                    "bind": {
                        "input": "range",
                        "min": first,
                        "max": last,
                        "step": 1,
                        "name": format!("{} ", animation.label)
                    }
                }]);
            }
        }

        // 5. Theme
        vl_spec["config"] = self.default_theme_config();

        Ok(vl_spec)
    }

    fn write_map(&self, spec: &MapSpec) -> Result<Value> {
        validate_map(spec)?;

        let mut vl_spec = self.base_spec(&spec.title, MAP_HEIGHT);
        vl_spec["projection"] = json!({ "type": "mercator" });
        vl_spec["data"] = map_data(spec);
        vl_spec["layer"] = json!([build_choropleth_layer(spec), build_outline_layer(spec)]);
        vl_spec["config"] = self.default_theme_config();

        Ok(vl_spec)
    }

    fn validate_chart(&self, spec: &ChartSpec) -> Result<()> {
        if spec.layers.is_empty() {
            return Err(PopdashError::ValidationError(
                "VegaLiteWriter requires at least one layer".to_string(),
            ));
        }
        for (idx, layer) in spec.layers.iter().enumerate() {
            if layer.series_field.is_some() && layer.series_title.is_none() {
                return Err(PopdashError::ValidationError(format!(
                    "Layer {} has a series field but no series title",
                    idx + 1
                )));
            }
        }
        Ok(())
    }
}

/// Serialize a Vega-Lite document for transport
pub fn to_json_string(spec: &Value) -> Result<String> {
    serde_json::to_string(spec).map_err(|e| {
        PopdashError::WriterError(format!("Failed to serialize Vega-Lite JSON: {}", e))
    })
}
