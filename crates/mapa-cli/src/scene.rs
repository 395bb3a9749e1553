//! Scene files.
//!
//! A scene is the snapshot the CLI renders: the map's default style, the
//! schemas features may reference, and the features themselves, stored as one
//! JSON document.

use std::{fs, path::Path};

use log::{debug, warn};
use serde::Deserialize;

use mapa::{MapaError, feature::Feature, schema::Schema, style::SymbolStyle};

/// A map snapshot loaded from disk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub map_default: Option<SymbolStyle>,
    #[serde(default)]
    pub schemas: Vec<Schema>,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl Scene {
    /// Reads and validates a scene file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a valid scene
    /// document, or holds a schema with duplicate ids.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapaError> {
        let content = fs::read_to_string(path)?;
        let scene: Scene = serde_json::from_str(&content)?;
        scene.validate()?;
        debug!(
            schemas_count = scene.schemas.len(),
            features_count = scene.features.len();
            "Scene loaded"
        );
        Ok(scene)
    }

    fn validate(&self) -> Result<(), MapaError> {
        for schema in &self.schemas {
            schema.validate()?;
        }

        for feature in &self.features {
            let Some(schema) = feature
                .schema_id
                .and_then(|id| self.schemas.iter().find(|schema| schema.id == id))
            else {
                continue;
            };
            for value in &feature.data {
                if schema.field(value.schema_field_id).is_none() {
                    warn!(
                        feature_id = feature.id,
                        field_id = value.schema_field_id;
                        "Feature stores a value for an unknown field"
                    );
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_field_is_rejected() {
        let scene: Scene = serde_json::from_str(
            r#"{"schemas": [{"id": 1, "name": "s", "definition": [
                {"type": "text_field", "id": 1, "name": "a"},
                {"type": "text_field", "id": 1, "name": "b"}
            ]}]}"#,
        )
        .unwrap();

        assert!(matches!(scene.validate(), Err(MapaError::Schema(_))));
    }

    #[test]
    fn test_empty_scene_is_valid() {
        let scene: Scene = serde_json::from_str("{}").unwrap();
        assert!(scene.validate().is_ok());
        assert!(scene.features.is_empty());
    }
}
