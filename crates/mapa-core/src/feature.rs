//! Point features.
//!
//! Features are supplied by the external feature store as an ordered,
//! read-only snapshot. Each one sits at a single geographic coordinate and may
//! reference a schema, a symbol preset inside that schema, and carry values
//! for the schema's fields.

use serde::{Deserialize, Serialize};

use crate::schema::{FieldId, SchemaId, SymbolId};

pub type FeatureId = u64;

/// A WGS84 position stored as `[lon, lat]`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate(f64, f64);

impl Coordinate {
    /// Creates a new coordinate from longitude and latitude in degrees
    pub fn new(lon: f64, lat: f64) -> Self {
        Self(lon, lat)
    }

    pub fn lon(self) -> f64 {
        self.0
    }

    pub fn lat(self) -> f64 {
        self.1
    }
}

/// A named link stored by URL fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlLink {
    pub name: String,
    pub url: String,
}

/// The value a feature stores for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldData {
    Bool(bool),
    Number(f64),
    Text(String),
    Links(Vec<UrlLink>),
}

impl FieldData {
    /// Returns the boolean payload, if this is a boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

/// One stored field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub schema_field_id: FieldId,
    pub value: FieldData,
}

/// A point feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub coordinate: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_id: Option<u64>,
    #[serde(default)]
    pub schema_id: Option<SchemaId>,
    #[serde(default)]
    pub symbol_id: Option<SymbolId>,
    #[serde(default)]
    pub data: Vec<FieldValue>,
}

impl Feature {
    /// Creates a feature with no schema, symbol or field values.
    pub fn new(id: FeatureId, coordinate: Coordinate) -> Self {
        Self {
            id,
            coordinate,
            map_id: None,
            schema_id: None,
            symbol_id: None,
            data: Vec::new(),
        }
    }

    /// Sets the schema reference (builder style).
    pub fn with_schema(mut self, schema_id: SchemaId) -> Self {
        self.schema_id = Some(schema_id);
        self
    }

    /// Sets the symbol preset reference (builder style).
    pub fn with_symbol(mut self, symbol_id: SymbolId) -> Self {
        self.symbol_id = Some(symbol_id);
        self
    }

    /// Adds a stored field value (builder style).
    pub fn with_value(mut self, schema_field_id: FieldId, value: FieldData) -> Self {
        self.data.push(FieldValue {
            schema_field_id,
            value,
        });
        self
    }

    /// Returns the stored value for a field, if the feature has one
    pub fn value_for(&self, field_id: FieldId) -> Option<&FieldData> {
        self.data
            .iter()
            .find(|item| item.schema_field_id == field_id)
            .map(|item| &item.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_deserializes() {
        let feature: Feature = serde_json::from_str(
            r#"{
                "id": 12,
                "coordinate": [151.2, -33.8],
                "schema_id": 3,
                "symbol_id": null,
                "data": [
                    {"schema_field_id": 1, "value": "note"},
                    {"schema_field_id": 2, "value": true},
                    {"schema_field_id": 4, "value": [{"name": "Docs", "url": "https://example.org"}]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(feature.coordinate.lon(), 151.2);
        assert_eq!(feature.coordinate.lat(), -33.8);
        assert_eq!(feature.schema_id, Some(3));
        assert_eq!(feature.symbol_id, None);
        assert_eq!(feature.value_for(2).and_then(FieldData::as_bool), Some(true));
        assert!(matches!(feature.value_for(4), Some(FieldData::Links(links)) if links.len() == 1));
        assert!(feature.value_for(9).is_none());
    }

    #[test]
    fn test_builder_accumulates_values() {
        let feature = Feature::new(1, Coordinate::new(0.0, 0.0))
            .with_schema(2)
            .with_symbol(5)
            .with_value(10, FieldData::Bool(false));

        assert_eq!(feature.schema_id, Some(2));
        assert_eq!(feature.symbol_id, Some(5));
        assert_eq!(feature.value_for(10), Some(&FieldData::Bool(false)));
    }
}
