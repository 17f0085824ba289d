//! Layer rendering for the Vega-Lite writer
//!
//! Each chart layer becomes one entry of the top-level `layer` array with
//! its own inline data, mark and encoding.

use crate::plot::{Axis, AxisSort, ChartSpec, Layer, LayerStyle, Mark};
use serde_json::{json, Map, Value};

/// Name of the slider parameter driving animated charts
pub(super) const FRAME_PARAM: &str = "frame";

/// Map a chart mark to a Vega-Lite mark definition, style included
pub(super) fn mark_to_vegalite(mark: &Mark, style: &LayerStyle) -> Value {
    let mut def = match mark {
        Mark::Area { .. } => json!({ "type": "area", "line": false }),
        Mark::Line { points } => json!({ "type": "line", "point": points }),
        Mark::Bar => json!({ "type": "bar" }),
    };
    if let Some(color) = &style.color {
        def["color"] = json!(color);
    }
    if let Some(width) = style.stroke_width {
        def["strokeWidth"] = json!(width);
    }
    if let Some(opacity) = style.opacity {
        def["opacity"] = json!(opacity);
    }
    def
}

/// Positional channel for one axis
fn axis_channel(axis: &Axis, other: &str) -> Value {
    let mut channel = json!({
        "field": axis.field,
        "type": axis.field_type,
        "title": axis.title,
    });
    if let Some([min, max]) = axis.domain {
        channel["scale"] = json!({ "domain": [min, max] });
    }
    if axis.sort == AxisSort::DescendingByValue {
        channel["sort"] = json!(format!("-{}", other));
    }
    if let Some(angle) = axis.label_angle {
        channel["axis"] = json!({ "labelAngle": angle });
    }
    channel
}

/// Tooltip fields: x, series when present, y
fn tooltip(spec: &ChartSpec, layer: &Layer) -> Value {
    let mut fields = vec![json!({
        "field": spec.x.field,
        "type": spec.x.field_type,
        "title": spec.x.title,
    })];
    if let (Some(field), Some(title)) = (&layer.series_field, &layer.series_title) {
        fields.push(json!({ "field": field, "type": "nominal", "title": title }));
    }
    fields.push(json!({
        "field": spec.y.field,
        "type": spec.y.field_type,
        "title": layer.name.as_deref().unwrap_or(&spec.y.title),
        "format": ",.0f",
    }));
    json!(fields)
}

/// Build the encoding block of one layer
pub(super) fn build_layer_encoding(spec: &ChartSpec, layer: &Layer) -> Map<String, Value> {
    let mut encoding = Map::new();
    encoding.insert("x".to_string(), axis_channel(&spec.x, "y"));

    let mut y = axis_channel(&spec.y, "x");
    if let Mark::Area { stacked } = layer.mark {
        y["stack"] = if stacked { json!("zero") } else { Value::Null };
    }
    encoding.insert("y".to_string(), y);

    match (&layer.series_field, &layer.name) {
        (Some(field), _) => {
            encoding.insert(
                "color".to_string(),
                json!({
                    "field": field,
                    "type": "nominal",
                    "title": layer.series_title,
                }),
            );
        }
        (None, Some(name)) => {
            // Single named series: a constant datum gives it a legend entry
            let mut color = json!({ "datum": name, "type": "nominal", "title": null });
            if let Some(fixed) = &layer.style.color {
                color["scale"] = json!({ "range": [fixed] });
            }
            encoding.insert("color".to_string(), color);
        }
        (None, None) => {}
    }

    if spec.unified_hover || layer.series_field.is_some() || matches!(layer.mark, Mark::Bar) {
        encoding.insert("tooltip".to_string(), tooltip(spec, layer));
    }

    encoding
}

/// Render one layer, data included
pub(super) fn build_layer(spec: &ChartSpec, layer: &Layer) -> Value {
    let mut layer_spec = json!({
        "data": { "values": layer.values },
        "mark": mark_to_vegalite(&layer.mark, &layer.style),
        "encoding": Value::Object(build_layer_encoding(spec, layer)),
    });

    if let Some(animation) = &spec.animation {
        if !animation.frames.is_empty() {
            layer_spec["transform"] = json!([{
                "filter": format!(
                    "datum['{}'] == {}",
                    animation.field.replace('\'', "\\'"),
                    FRAME_PARAM
                )
            }]);
        }
    }

    layer_spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::FieldType;

    fn chart(layer: Layer) -> ChartSpec {
        ChartSpec::new(
            "t",
            Axis::new("year", "Year", FieldType::Ordinal),
            Axis::new("population", "Population", FieldType::Quantitative),
        )
        .with_layer(layer)
    }

    #[test]
    fn test_mark_mapping() {
        let style = LayerStyle::default();
        assert_eq!(
            mark_to_vegalite(&Mark::Area { stacked: true }, &style)["type"],
            "area"
        );
        assert_eq!(
            mark_to_vegalite(&Mark::Line { points: true }, &style)["point"],
            true
        );
        assert_eq!(mark_to_vegalite(&Mark::Bar, &style)["type"], "bar");
    }

    #[test]
    fn test_mark_style() {
        let style = LayerStyle {
            color: Some("black".to_string()),
            stroke_width: Some(4.0),
            opacity: Some(0.7),
        };
        let mark = mark_to_vegalite(&Mark::Line { points: false }, &style);
        assert_eq!(mark["color"], "black");
        assert_eq!(mark["strokeWidth"], 4.0);
        assert_eq!(mark["opacity"], 0.7);
    }

    #[test]
    fn test_stacked_area_encoding() {
        let spec = chart(
            Layer::new(Mark::Area { stacked: true }, vec![]).with_series("sex", "Sex"),
        );
        let encoding = build_layer_encoding(&spec, &spec.layers[0]);

        assert_eq!(encoding["y"]["stack"], "zero");
        assert_eq!(encoding["color"]["field"], "sex");
        assert_eq!(encoding["tooltip"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_named_layer_gets_datum_color() {
        let spec = chart(
            Layer::new(Mark::Line { points: false }, vec![])
                .with_name("Total")
                .with_style(LayerStyle {
                    color: Some("black".to_string()),
                    ..LayerStyle::default()
                }),
        );
        let encoding = build_layer_encoding(&spec, &spec.layers[0]);

        assert_eq!(encoding["color"]["datum"], "Total");
        assert_eq!(encoding["color"]["scale"]["range"][0], "black");
    }

    #[test]
    fn test_sorted_axis_with_domain() {
        let mut spec = chart(Layer::new(Mark::Bar, vec![]));
        spec.x = Axis::new("country", "Country", FieldType::Nominal)
            .with_sort(AxisSort::DescendingByValue)
            .with_label_angle(10);
        spec.y = spec.y.clone().with_domain(0.0, 120.0);
        let encoding = build_layer_encoding(&spec, &spec.layers[0]);

        assert_eq!(encoding["x"]["sort"], "-y");
        assert_eq!(encoding["x"]["axis"]["labelAngle"], 10);
        assert_eq!(encoding["y"]["scale"]["domain"], json!([0.0, 120.0]));
    }
}
