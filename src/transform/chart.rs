//! Chart specifications for the numeric views
//!
//! Pure functions from typed rows to [`ChartSpec`]s. Rows are already in
//! persons; nothing here rescales.

use crate::plot::{Animation, Axis, AxisSort, ChartSpec, FieldType, Layer, LayerStyle, Mark};
use crate::query::{RegionRow, TopCountryRow, WorldRow};
use serde_json::{json, Value};
use std::collections::BTreeSet;

/// Headroom above the largest bar of the ranking chart
pub const Y_HEADROOM: f64 = 1.2;

/// Bar colour of the ranking chart
pub const TOP10_BAR_COLOR: &str = "#F3B94E";

/// Legend label of the total line on the world chart
pub const TOTAL_LINE_NAME: &str = "Total (M+F)";

/// Stacked male/female areas by year with the total drawn on top
pub fn world_chart(rows: &[WorldRow]) -> ChartSpec {
    let by_sex: Vec<Value> = rows
        .iter()
        .flat_map(|row| {
            [
                json!({ "year": row.year, "sex": "Male", "population": row.male }),
                json!({ "year": row.year, "sex": "Female", "population": row.female }),
            ]
        })
        .collect();

    let totals: Vec<Value> = rows
        .iter()
        .map(|row| json!({ "year": row.year, "population": row.total }))
        .collect();

    let mut chart = ChartSpec::new(
        "World population by sex",
        Axis::new("year", "Year", FieldType::Ordinal),
        Axis::new("population", "World population", FieldType::Quantitative),
    )
    .with_layer(Layer::new(Mark::Area { stacked: true }, by_sex).with_series("sex", "Sex"))
    .with_layer(
        Layer::new(Mark::Line { points: false }, totals)
            .with_name(TOTAL_LINE_NAME)
            .with_style(LayerStyle {
                color: Some("black".to_string()),
                stroke_width: Some(4.0),
                opacity: Some(0.7),
            }),
    );
    chart.unified_hover = true;
    chart
}

/// One line with point markers per region
pub fn region_chart(rows: &[RegionRow]) -> ChartSpec {
    let values: Vec<Value> = rows
        .iter()
        .map(|row| json!({ "year": row.year, "region": row.region, "population": row.population }))
        .collect();

    let mut chart = ChartSpec::new(
        "Population by region",
        Axis::new("year", "Year", FieldType::Ordinal),
        Axis::new("population", "Population", FieldType::Quantitative),
    )
    .with_layer(Layer::new(Mark::Line { points: true }, values).with_series("region", "Region"));
    chart.unified_hover = true;
    chart
}

/// Ranking bars with one frame per year
///
/// The y-axis is fixed to `[0, Y_HEADROOM × max]` over all years so bars
/// stay comparable between frames.
pub fn top10_chart(rows: &[TopCountryRow]) -> ChartSpec {
    let values: Vec<Value> = rows
        .iter()
        .map(|row| {
            json!({
                "year": row.year,
                "country": row.country,
                "region": row.region,
                "population": row.population,
            })
        })
        .collect();

    let global_max = rows
        .iter()
        .map(|row| row.population)
        .fold(0.0_f64, f64::max);

    let frames: Vec<i64> = rows
        .iter()
        .map(|row| row.year as i64)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut chart = ChartSpec::new(
        "Ten most populous countries by year",
        Axis::new("country", "Country", FieldType::Nominal)
            .with_sort(AxisSort::DescendingByValue)
            .with_label_angle(10),
        Axis::new("population", "Population", FieldType::Quantitative)
            .with_domain(0.0, Y_HEADROOM * global_max),
    )
    .with_layer(Layer::new(Mark::Bar, values).with_style(LayerStyle {
        color: Some(TOP10_BAR_COLOR.to_string()),
        ..LayerStyle::default()
    }));
    chart.animation = Some(Animation {
        field: "year".to_string(),
        label: "Year".to_string(),
        frames,
    });
    chart
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top(year: i32, country: &str, population: f64) -> TopCountryRow {
        TopCountryRow {
            year,
            country: country.to_string(),
            subregion: "Eastern Asia".to_string(),
            region: "Asia".to_string(),
            continent: "World".to_string(),
            population,
        }
    }

    #[test]
    fn test_world_chart_layers() {
        let rows = vec![
            WorldRow {
                year: 2022,
                male: 4.0e9,
                female: 3.9e9,
                total: 7.9e9,
            },
            WorldRow {
                year: 2023,
                male: 4.05e9,
                female: 4.0e9,
                total: 8.05e9,
            },
        ];
        let chart = world_chart(&rows);

        assert_eq!(chart.layers.len(), 2);
        assert_eq!(chart.layers[0].mark, Mark::Area { stacked: true });
        assert_eq!(chart.layers[0].values.len(), 4);
        assert_eq!(chart.layers[0].series_field.as_deref(), Some("sex"));
        assert_eq!(chart.layers[1].name.as_deref(), Some(TOTAL_LINE_NAME));
        assert_eq!(chart.layers[1].values[1]["population"], json!(8.05e9));
        assert!(chart.unified_hover);
    }

    #[test]
    fn test_region_chart_series_per_region() {
        let rows = vec![
            RegionRow {
                region: "Asia".to_string(),
                year: 2023,
                population: 4.7e9,
            },
            RegionRow {
                region: "Europe".to_string(),
                year: 2023,
                population: 7.4e8,
            },
        ];
        let chart = region_chart(&rows);

        assert_eq!(chart.layers.len(), 1);
        assert_eq!(chart.layers[0].mark, Mark::Line { points: true });
        assert_eq!(chart.layers[0].series_field.as_deref(), Some("region"));
        assert_eq!(chart.layers[0].values.len(), 2);
    }

    #[test]
    fn test_top10_chart_fixed_domain_and_frames() {
        let rows = vec![
            top(2022, "China", 1.425e9),
            top(2022, "India", 1.42e9),
            top(2023, "India", 1.438e9),
            top(2023, "China", 1.422e9),
        ];
        let chart = top10_chart(&rows);

        let [min, max] = chart.y.domain.unwrap();
        assert_eq!(min, 0.0);
        assert!((max - 1.2 * 1.438e9).abs() < 1.0);
        assert_eq!(chart.x.sort, AxisSort::DescendingByValue);

        let animation = chart.animation.unwrap();
        assert_eq!(animation.field, "year");
        assert_eq!(animation.frames, vec![2022, 2023]);
    }

    #[test]
    fn test_top10_chart_empty_rows() {
        let chart = top10_chart(&[]);
        assert_eq!(chart.y.domain, Some([0.0, 0.0]));
        assert!(chart.animation.unwrap().frames.is_empty());
    }
}
