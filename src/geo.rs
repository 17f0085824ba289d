//! Country borders (GeoJSON)
//!
//! The borders file is parsed once at startup and shared read-only between
//! requests. Problems with the file never fail a request: an unreadable or
//! malformed file leaves the source empty and every map has zero features.

use crate::{PopdashError, Result};
use serde_json::{json, Value};
use std::path::Path;
use tracing::{info, warn};

/// Feature property holding the English country name
pub const NAME_PROPERTY: &str = "NAME_ENGL";

/// Parsed GeoJSON FeatureCollection of country borders
#[derive(Debug, Clone, Default)]
pub struct GeoSource {
    features: Vec<Value>,
}

impl GeoSource {
    /// A source with no features
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read and parse a FeatureCollection from disk
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PopdashError::GeoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|e| {
            PopdashError::GeoError(format!("Invalid GeoJSON in {}: {}", path.display(), e))
        })?;
        if value["type"] != "FeatureCollection" {
            return Err(PopdashError::GeoError(format!(
                "{} is not a GeoJSON FeatureCollection",
                path.display()
            )));
        }
        Ok(Self::from_value(value))
    }

    /// Like [`GeoSource::read`], but logs failures and falls back to an empty
    /// source
    pub fn load(path: &Path) -> Self {
        match Self::read(path) {
            Ok(source) => {
                info!(
                    "Loaded {} border feature(s) from {}",
                    source.features.len(),
                    path.display()
                );
                source
            }
            Err(e) => {
                warn!("{}; maps will be empty", e);
                Self::empty()
            }
        }
    }

    /// Take the features of an in-memory FeatureCollection
    ///
    /// Anything that is not a JSON object is skipped.
    pub fn from_value(value: Value) -> Self {
        let features = match value {
            Value::Object(mut collection) => match collection.remove("features") {
                Some(Value::Array(features)) => {
                    features.into_iter().filter(Value::is_object).collect()
                }
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Self { features }
    }

    pub fn features(&self) -> &[Value] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// English name of a feature, when it has one
pub fn feature_name(feature: &Value) -> Option<&str> {
    feature.get("properties")?.get(NAME_PROPERTY)?.as_str()
}

/// Wrap features back into a FeatureCollection
pub fn feature_collection(features: Vec<Value>) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}
