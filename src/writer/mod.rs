//! Output writer abstraction layer
//!
//! The writer module turns the backend-neutral [`ChartSpec`] and [`MapSpec`]
//! into something a browser can draw.
//!
//! # Architecture
//!
//! All writers implement the `Writer` trait, which provides:
//! - Spec → Output conversion for charts and maps
//! - Validation for writer compatibility
//!
//! The HTML helpers in [`html`] wrap writer output and tables into page
//! fragments for the REST frontend.
//!
//! # Example
//!
//! ```rust,ignore
//! use popdash::writer::{Writer, VegaLiteWriter};
//!
//! let writer = VegaLiteWriter::new();
//! let spec = writer.write_chart(&chart)?;
//! ```

pub mod html;
pub mod vegalite;

pub use vegalite::VegaLiteWriter;

use crate::plot::{ChartSpec, MapSpec};
use crate::Result;

/// Trait for visualization output writers
pub trait Writer {
    /// Output format (JSON document, source code, ...)
    type Output;

    /// Render a layered chart
    ///
    /// # Errors
    ///
    /// Returns `PopdashError::ValidationError` if the chart cannot be drawn
    /// by this writer and `PopdashError::WriterError` if output generation
    /// fails.
    fn write_chart(&self, spec: &ChartSpec) -> Result<Self::Output>;

    /// Render a choropleth map
    fn write_map(&self, spec: &MapSpec) -> Result<Self::Output>;

    /// Check that a chart is drawable without producing output
    fn validate_chart(&self, spec: &ChartSpec) -> Result<()>;
}
