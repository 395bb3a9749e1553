//! Configuration types for Mapa symbology rendering.
//!
//! This module provides configuration structures that control how icons are
//! rasterized, how the texture atlas is packed and how the point layer falls
//! back when no atlas is available. All types implement
//! [`serde::Deserialize`] for loading from external sources, and every
//! section falls back to its defaults when omitted.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining every section.
//! - [`AtlasConfig`] - Atlas packing and raster scale.
//! - [`IconConfig`] - Icon sizing, modifier badge geometry and tone darkening.
//! - [`LayerConfig`] - Plain circle style used while no atlas is available.
//!
//! # Example
//!
//! ```
//! # use mapa::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.atlas().padding(), 10);
//! assert_eq!(config.icon().size_multiplier(), 1.8);
//! ```
//!
//! # Validation
//!
//! Deserialization accepts any number. [`AppConfig::validate`] rejects values
//! the renderer cannot draw with, and the numeric getters fall back to the
//! default for such values, so an unchecked config never mirrors or inverts
//! an icon.

use serde::Deserialize;

use mapa_core::color::Color;

use crate::MapaError;

const DEFAULT_RASTER_SCALE: f32 = 2.0;
const DEFAULT_SIZE_MULTIPLIER: f32 = 1.8;
const DEFAULT_MODIFIER_SHRINK: f32 = 0.8;
const DEFAULT_MODIFIER_BADGE_SCALE: f32 = 0.5;
const DEFAULT_DARKEN_PERCENT: f32 = 10.0;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Atlas configuration section.
    #[serde(default)]
    atlas: AtlasConfig,

    /// Icon configuration section.
    #[serde(default)]
    icon: IconConfig,

    /// Layer configuration section.
    #[serde(default)]
    layer: LayerConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(atlas: AtlasConfig, icon: IconConfig, layer: LayerConfig) -> Self {
        Self { atlas, icon, layer }
    }

    /// Returns the atlas configuration.
    pub fn atlas(&self) -> &AtlasConfig {
        &self.atlas
    }

    /// Returns the icon configuration.
    pub fn icon(&self) -> &IconConfig {
        &self.icon
    }

    /// Returns the layer configuration.
    pub fn layer(&self) -> &LayerConfig {
        &self.layer
    }

    /// Checks every section for values the renderer cannot use.
    ///
    /// # Errors
    ///
    /// Returns [`MapaError::Config`] naming the first offending setting.
    pub fn validate(&self) -> Result<(), MapaError> {
        self.atlas
            .validate()
            .and_then(|()| self.icon.validate())
            .and_then(|()| self.layer.validate())
            .map_err(MapaError::Config)
    }
}

/// Atlas packing configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Gap in pixels around and between packed bitmaps.
    padding: u32,

    /// Factor the atlas is drawn at relative to the display size.
    ///
    /// The host scales icons back down by `1 / raster_scale`, keeping them
    /// sharp on high density displays.
    raster_scale: f32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            padding: 10,
            raster_scale: DEFAULT_RASTER_SCALE,
        }
    }
}

impl AtlasConfig {
    /// Creates a new [`AtlasConfig`].
    pub fn new(padding: u32, raster_scale: f32) -> Self {
        Self {
            padding,
            raster_scale,
        }
    }

    /// Returns the padding in pixels.
    pub fn padding(&self) -> u32 {
        self.padding
    }

    /// Returns the raster scale, falling back to `1.0` if the configured
    /// value is not a positive finite number.
    pub fn raster_scale(&self) -> f32 {
        if is_positive(self.raster_scale) {
            self.raster_scale
        } else {
            1.0
        }
    }

    /// Returns the scale the host applies when drawing atlas icons.
    pub fn icon_scale(&self) -> f32 {
        1.0 / self.raster_scale()
    }

    fn validate(&self) -> Result<(), String> {
        check(
            "atlas.raster_scale",
            self.raster_scale,
            is_positive,
            "a positive number",
        )
    }
}

/// Icon rasterization configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    /// Ratio between the symbol size and the rendered icon edge length.
    size_multiplier: f32,

    /// Scale applied to the base icon when a modifier badge is composited.
    modifier_shrink: f32,

    /// Badge edge length as a fraction of the base icon's view box.
    modifier_badge_scale: f32,

    /// Lightness reduction in percentage points for `-darker` paths.
    darken_percent: f32,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            size_multiplier: DEFAULT_SIZE_MULTIPLIER,
            modifier_shrink: DEFAULT_MODIFIER_SHRINK,
            modifier_badge_scale: DEFAULT_MODIFIER_BADGE_SCALE,
            darken_percent: DEFAULT_DARKEN_PERCENT,
        }
    }
}

impl IconConfig {
    /// Creates a new [`IconConfig`].
    pub fn new(
        size_multiplier: f32,
        modifier_shrink: f32,
        modifier_badge_scale: f32,
        darken_percent: f32,
    ) -> Self {
        Self {
            size_multiplier,
            modifier_shrink,
            modifier_badge_scale,
            darken_percent,
        }
    }

    pub fn size_multiplier(&self) -> f32 {
        or_default(self.size_multiplier, is_positive, DEFAULT_SIZE_MULTIPLIER)
    }

    pub fn modifier_shrink(&self) -> f32 {
        or_default(self.modifier_shrink, is_fraction, DEFAULT_MODIFIER_SHRINK)
    }

    pub fn modifier_badge_scale(&self) -> f32 {
        or_default(
            self.modifier_badge_scale,
            is_fraction,
            DEFAULT_MODIFIER_BADGE_SCALE,
        )
    }

    pub fn darken_percent(&self) -> f32 {
        or_default(self.darken_percent, is_percentage, DEFAULT_DARKEN_PERCENT)
    }

    fn validate(&self) -> Result<(), String> {
        check(
            "icon.size_multiplier",
            self.size_multiplier,
            is_positive,
            "a positive number",
        )?;
        check(
            "icon.modifier_shrink",
            self.modifier_shrink,
            is_fraction,
            "in (0, 1]",
        )?;
        check(
            "icon.modifier_badge_scale",
            self.modifier_badge_scale,
            is_fraction,
            "in (0, 1]",
        )?;
        check(
            "icon.darken_percent",
            self.darken_percent,
            is_percentage,
            "in [0, 100]",
        )
    }
}

/// Point layer configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    /// Radius of the fallback circle in pixels.
    circle_radius: f32,

    /// Fill of the fallback circle, as a colour string.
    circle_fill_color: String,

    /// Stroke width of the fallback circle in pixels.
    circle_stroke_width: f32,

    /// Stroke of the fallback circle, as a colour string.
    circle_stroke_color: String,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            circle_radius: 12.0,
            circle_fill_color: "#3a9b4b".to_string(),
            circle_stroke_width: 1.5,
            circle_stroke_color: "white".to_string(),
        }
    }
}

impl LayerConfig {
    pub fn circle_radius(&self) -> f32 {
        self.circle_radius
    }

    pub fn circle_stroke_width(&self) -> f32 {
        self.circle_stroke_width
    }

    /// Returns the parsed circle fill [`Color`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn circle_fill_color(&self) -> Result<Color, String> {
        Color::new(&self.circle_fill_color)
            .map_err(|err| format!("Invalid circle fill color in config: {err}"))
    }

    /// Returns the parsed circle stroke [`Color`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn circle_stroke_color(&self) -> Result<Color, String> {
        Color::new(&self.circle_stroke_color)
            .map_err(|err| format!("Invalid circle stroke color in config: {err}"))
    }

    fn validate(&self) -> Result<(), String> {
        let non_negative = |value: f32| value.is_finite() && value >= 0.0;
        check(
            "layer.circle_radius",
            self.circle_radius,
            non_negative,
            "zero or more",
        )?;
        check(
            "layer.circle_stroke_width",
            self.circle_stroke_width,
            non_negative,
            "zero or more",
        )?;
        self.circle_fill_color()?;
        self.circle_stroke_color()?;
        Ok(())
    }
}

fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn is_fraction(value: f32) -> bool {
    is_positive(value) && value <= 1.0
}

fn is_percentage(value: f32) -> bool {
    (0.0..=100.0).contains(&value)
}

fn or_default(value: f32, valid: fn(f32) -> bool, fallback: f32) -> f32 {
    if valid(value) { value } else { fallback }
}

fn check(
    field: &str,
    value: f32,
    valid: impl Fn(f32) -> bool,
    expected: &str,
) -> Result<(), String> {
    if valid(value) {
        Ok(())
    } else {
        Err(format!("{field} must be {expected}, got {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"atlas": {"padding": 4}, "icon": {"darken_percent": 20}}"#)
                .unwrap();

        assert_eq!(config.atlas().padding(), 4);
        assert_eq!(config.atlas().raster_scale(), 2.0);
        assert_eq!(config.icon().darken_percent(), 20.0);
        assert_eq!(config.icon().modifier_shrink(), 0.8);
        assert_eq!(config.layer().circle_radius(), 12.0);
    }

    #[test]
    fn test_invalid_raster_scale_falls_back() {
        let atlas = AtlasConfig::new(10, 0.0);
        assert_eq!(atlas.raster_scale(), 1.0);
        assert_eq!(atlas.icon_scale(), 1.0);
        assert_eq!(AtlasConfig::default().icon_scale(), 0.5);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_icon_values_are_rejected() {
        let cases = [
            (r#"{"icon": {"size_multiplier": 0}}"#, "icon.size_multiplier"),
            (r#"{"icon": {"modifier_shrink": 1.5}}"#, "icon.modifier_shrink"),
            (
                r#"{"icon": {"modifier_badge_scale": -0.5}}"#,
                "icon.modifier_badge_scale",
            ),
            (r#"{"icon": {"darken_percent": 150}}"#, "icon.darken_percent"),
            (r#"{"atlas": {"raster_scale": -2}}"#, "atlas.raster_scale"),
            (r#"{"layer": {"circle_radius": -1}}"#, "layer.circle_radius"),
        ];

        for (json, field) in cases {
            let config: AppConfig = serde_json::from_str(json).unwrap();
            let err = config.validate().unwrap_err();
            assert!(
                matches!(&err, MapaError::Config(msg) if msg.contains(field)),
                "{json}: {err}"
            );
        }
    }

    #[test]
    fn test_invalid_layer_colour_is_rejected() {
        let config: AppConfig =
            serde_json::from_str(r#"{"layer": {"circle_stroke_color": "nope"}}"#).unwrap();
        assert!(matches!(config.validate(), Err(MapaError::Config(_))));
    }

    #[test]
    fn test_out_of_range_icon_values_fall_back() {
        let icon = IconConfig::new(-1.0, 0.0, -0.5, f32::NAN);
        let defaults = IconConfig::default();

        assert_eq!(icon.size_multiplier(), defaults.size_multiplier());
        assert_eq!(icon.modifier_shrink(), defaults.modifier_shrink());
        assert_eq!(icon.modifier_badge_scale(), defaults.modifier_badge_scale());
        assert_eq!(icon.darken_percent(), defaults.darken_percent());

        let icon = IconConfig::new(3.0, 1.0, 0.25, 0.0);
        assert_eq!(icon.size_multiplier(), 3.0);
        assert_eq!(icon.modifier_shrink(), 1.0);
        assert_eq!(icon.modifier_badge_scale(), 0.25);
        assert_eq!(icon.darken_percent(), 0.0);
    }

    #[test]
    fn test_layer_colors_parse() {
        let layer = LayerConfig::default();
        assert!(layer.circle_fill_color().is_ok());
        assert_eq!(layer.circle_stroke_color().unwrap().to_hex(), "#ffffff");
    }
}
