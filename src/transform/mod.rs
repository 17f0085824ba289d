//! Row set transforms
//!
//! Pure reshaping of query rows: labeled tables for every view, chart
//! specifications for the numeric views, and the density map join. Nothing
//! in this module performs I/O or mutates its input.

pub mod chart;
pub mod map;
pub mod table;

pub use chart::{region_chart, top10_chart, world_chart};
pub use map::{europe_density_map, MapPolicy};
pub use table::{build_table, Table, TableRow};
