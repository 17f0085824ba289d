//! Chart and map specifications
//!
//! Backend-neutral descriptions produced by the transforms and consumed by
//! the writers. A chart is a stack of layers sharing two axes; every layer
//! carries its own long-form records.
//!
//! ```text
//! ChartSpec
//! ├─ title
//! ├─ x, y: Axis                 (field, title, type, domain, sort)
//! ├─ layers: Vec<Layer>         (mark, records, colour field, style)
//! └─ animation: Option<Animation>  (one frame per value of a field)
//!
//! MapSpec
//! ├─ features: FeatureCollection   (already filtered and enriched)
//! ├─ value_property / name_property
//! └─ bins: [edge0, edge1, ...]
//! ```

pub mod map;

pub use map::MapSpec;

use serde::Serialize;
use serde_json::Value;

/// Measurement type of an axis field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Quantitative,
    Ordinal,
    Nominal,
}

/// Ordering of categories along an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AxisSort {
    /// Data order
    None,
    /// Categories ordered by descending value on the other axis
    DescendingByValue,
}

/// One chart axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub field: String,
    pub title: String,
    pub field_type: FieldType,
    /// Fixed `[min, max]`; free when absent
    pub domain: Option<[f64; 2]>,
    pub sort: AxisSort,
    pub label_angle: Option<i32>,
}

impl Axis {
    pub fn new(field: &str, title: &str, field_type: FieldType) -> Self {
        Self {
            field: field.to_string(),
            title: title.to_string(),
            field_type,
            domain: None,
            sort: AxisSort::None,
            label_angle: None,
        }
    }

    pub fn with_domain(mut self, min: f64, max: f64) -> Self {
        self.domain = Some([min, max]);
        self
    }

    pub fn with_sort(mut self, sort: AxisSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_label_angle(mut self, angle: i32) -> Self {
        self.label_angle = Some(angle);
        self
    }
}

/// Geometric mark of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mark {
    /// Filled area; stacked across series when `stacked`
    Area { stacked: bool },
    /// Polyline, optionally with a marker per point
    Line { points: bool },
    Bar,
}

/// Fixed visual properties of a layer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayerStyle {
    pub color: Option<String>,
    pub stroke_width: Option<f64>,
    pub opacity: Option<f64>,
}

/// One layer of a chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    /// Legend label for single-series layers
    pub name: Option<String>,
    pub mark: Mark,
    /// Long-form records, one JSON object per point
    pub values: Vec<Value>,
    /// Field splitting the records into coloured series
    pub series_field: Option<String>,
    pub series_title: Option<String>,
    pub style: LayerStyle,
}

impl Layer {
    pub fn new(mark: Mark, values: Vec<Value>) -> Self {
        Self {
            name: None,
            mark,
            values,
            series_field: None,
            series_title: None,
            style: LayerStyle::default(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_series(mut self, field: &str, title: &str) -> Self {
        self.series_field = Some(field.to_string());
        self.series_title = Some(title.to_string());
        self
    }

    pub fn with_style(mut self, style: LayerStyle) -> Self {
        self.style = style;
        self
    }
}

/// Frame-by-frame display: only records whose `field` equals the current
/// frame are drawn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Animation {
    pub field: String,
    pub label: String,
    /// Frame values in display order
    pub frames: Vec<i64>,
}

/// Complete chart specification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x: Axis,
    pub y: Axis,
    pub layers: Vec<Layer>,
    pub animation: Option<Animation>,
    /// Tooltips show every series at the hovered x position
    pub unified_hover: bool,
}

impl ChartSpec {
    pub fn new(title: &str, x: Axis, y: Axis) -> Self {
        Self {
            title: title.to_string(),
            x,
            y,
            layers: Vec::new(),
            animation: None,
            unified_hover: false,
        }
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }
}
