//! The point layer handed to the renderer host.
//!
//! A [`PointLayer`] pairs the projected collection with the style the host
//! should draw it with. While an atlas is available every point is drawn as
//! its atlas sprite, looked up through the atlas `match` expressions. Without
//! an atlas (none built yet, or the last build aborted with nothing to keep)
//! points are drawn as plain circles so that no feature disappears.

use serde::Serialize;
use serde_json::Value;

use mapa_core::color::Color;

use crate::{
    atlas::TextureAtlas,
    config::{AtlasConfig, LayerConfig},
    error::MapaError,
    projector::ProjectedCollection,
};

/// Sprite style reading every point's image from the atlas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IconStyle {
    #[serde(rename = "icon-src")]
    src: String,
    #[serde(rename = "icon-offset")]
    offset: Value,
    #[serde(rename = "icon-size")]
    size: Value,
    #[serde(rename = "icon-scale")]
    scale: f32,
    #[serde(rename = "icon-rotate-with-view")]
    rotate_with_view: bool,
}

impl IconStyle {
    fn new(atlas: &TextureAtlas, config: &AtlasConfig) -> Self {
        Self {
            src: atlas.data_uri(),
            offset: atlas.pixel_offset_expression(),
            size: atlas.pixel_size_expression(),
            scale: config.icon_scale(),
            rotate_with_view: false,
        }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn offset(&self) -> &Value {
        &self.offset
    }

    pub fn size(&self) -> &Value {
        &self.size
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }
}

/// Plain circle style used while no atlas is available.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircleStyle {
    #[serde(rename = "circle-radius")]
    radius: f32,
    #[serde(rename = "circle-fill-color")]
    fill_color: Color,
    #[serde(rename = "circle-stroke-width")]
    stroke_width: f32,
    #[serde(rename = "circle-stroke-color")]
    stroke_color: Color,
}

impl CircleStyle {
    fn new(config: &LayerConfig) -> Result<Self, MapaError> {
        Ok(Self {
            radius: config.circle_radius(),
            fill_color: config.circle_fill_color().map_err(MapaError::Config)?,
            stroke_width: config.circle_stroke_width(),
            stroke_color: config.circle_stroke_color().map_err(MapaError::Config)?,
        })
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn fill_color(&self) -> Color {
        self.fill_color
    }
}

/// How the host draws the layer's points.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LayerStyle {
    Icon(IconStyle),
    Circle(CircleStyle),
}

/// Everything the renderer host needs to draw the features.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointLayer {
    source: ProjectedCollection,
    style: LayerStyle,
}

impl PointLayer {
    /// Builds the layer, drawing sprites from `atlas` when there is one.
    ///
    /// # Errors
    ///
    /// Returns [`MapaError::Config`] if the circle colours do not parse.
    pub(crate) fn new(
        source: ProjectedCollection,
        atlas: Option<&TextureAtlas>,
        atlas_config: &AtlasConfig,
        layer_config: &LayerConfig,
    ) -> Result<Self, MapaError> {
        let style = match atlas {
            Some(atlas) => LayerStyle::Icon(IconStyle::new(atlas, atlas_config)),
            None => LayerStyle::Circle(CircleStyle::new(layer_config)?),
        };
        Ok(Self { source, style })
    }

    pub fn source(&self) -> &ProjectedCollection {
        &self.source
    }

    pub fn style(&self) -> &LayerStyle {
        &self.style
    }
}
