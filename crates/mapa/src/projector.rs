//! Feature-collection projection.
//!
//! [`project`] turns the feature snapshot into the GeoJSON collection the
//! renderer host draws, resolving every feature's style on the way. Each
//! projected feature carries its cache key under
//! [`SYMBOL_CACHE_KEY_PROPERTY`], which is what the atlas lookup expressions
//! match on. Distinct styles are collected into a [`StyleMap`] for the atlas
//! builder.

use std::collections::HashMap;

use log::{debug, trace, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use mapa_core::{
    feature::{Feature, FeatureId},
    resolve::resolve_style,
    schema::{Schema, SchemaId},
    style::{CacheKey, SymbolStyle},
};

use crate::atlas::StyleMap;

/// Property holding a projected feature's cache key.
pub const SYMBOL_CACHE_KEY_PROPERTY: &str = "symbolCacheKey";

/// Domain attribute holding the geometry; it becomes the GeoJSON geometry.
const GEOMETRY_ATTRIBUTE: &str = "coordinate";

/// A GeoJSON point geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Point")]
pub struct PointGeometry {
    coordinates: [f64; 2],
}

impl PointGeometry {
    /// `[lon, lat]` in degrees.
    pub fn coordinates(&self) -> [f64; 2] {
        self.coordinates
    }
}

/// A GeoJSON feature ready for the renderer host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct ProjectedFeature {
    id: FeatureId,
    geometry: PointGeometry,
    properties: Map<String, Value>,
    #[serde(skip)]
    cache_key: CacheKey,
}

impl ProjectedFeature {
    pub fn id(&self) -> FeatureId {
        self.id
    }

    pub fn geometry(&self) -> &PointGeometry {
        &self.geometry
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn cache_key(&self) -> &CacheKey {
        &self.cache_key
    }
}

/// A GeoJSON feature collection, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct ProjectedCollection {
    features: Vec<ProjectedFeature>,
}

impl ProjectedCollection {
    pub fn features(&self) -> &[ProjectedFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Output of [`project`].
#[derive(Debug, Clone, Default)]
pub struct Projection {
    collection: ProjectedCollection,
    styles: StyleMap,
}

impl Projection {
    pub fn collection(&self) -> &ProjectedCollection {
        &self.collection
    }

    /// Distinct resolved styles keyed by cache key.
    pub fn styles(&self) -> &StyleMap {
        &self.styles
    }

    pub fn into_parts(self) -> (ProjectedCollection, StyleMap) {
        (self.collection, self.styles)
    }
}

/// Projects `features` and collects their distinct styles.
///
/// Every feature is projected. A feature whose schema reference does not
/// resolve in `schemas` is styled with the map default only.
pub fn project(
    features: &[Feature],
    map_default: Option<&SymbolStyle>,
    schemas: &[Schema],
) -> Projection {
    let schemas_by_id: HashMap<SchemaId, &Schema> =
        schemas.iter().map(|schema| (schema.id, schema)).collect();

    let mut projection = Projection::default();
    for feature in features {
        let schema = match feature.schema_id {
            Some(schema_id) => {
                let schema = schemas_by_id.get(&schema_id).copied();
                if schema.is_none() {
                    warn!(
                        feature_id = feature.id,
                        schema_id;
                        "Dangling schema reference, using map defaults"
                    );
                }
                schema
            }
            None => None,
        };

        let style = resolve_style(feature, map_default, schema);
        let cache_key = style.cache_key();
        trace!(feature_id = feature.id, cache_key = cache_key.as_str(); "Feature projected");

        projection
            .collection
            .features
            .push(project_feature(feature, cache_key.clone()));
        projection.styles.entry(cache_key).or_insert(style);
    }

    debug!(
        features_count = projection.collection.len(),
        styles_count = projection.styles.len();
        "Features projected"
    );
    projection
}

fn project_feature(feature: &Feature, cache_key: CacheKey) -> ProjectedFeature {
    let mut properties = match serde_json::to_value(feature) {
        Ok(Value::Object(properties)) => properties,
        _ => {
            warn!(feature_id = feature.id; "Feature attributes not serializable, projecting bare");
            Map::new()
        }
    };
    properties.remove(GEOMETRY_ATTRIBUTE);
    properties.insert(
        SYMBOL_CACHE_KEY_PROPERTY.to_string(),
        Value::String(cache_key.as_str().to_string()),
    );

    ProjectedFeature {
        id: feature.id,
        geometry: PointGeometry {
            coordinates: [feature.coordinate.lon(), feature.coordinate.lat()],
        },
        properties,
        cache_key,
    }
}
