//! Symbol style definitions.
//!
//! This module provides the two shapes a symbol style takes on its way from
//! configuration to the atlas:
//!
//! - [`SymbolStyle`]: a *partial* style where every attribute is optional. Map
//!   defaults, schema defaults, symbol presets and symbology fields all store
//!   this shape.
//! - [`ResolvedStyle`]: the final, fully populated style for one feature. It
//!   starts from the built-in defaults and is refined by applying partial
//!   styles in precedence order with [`ResolvedStyle::apply`].
//!
//! A resolved style also owns its [`CacheKey`], the identifier shared by every
//! feature that renders identically.
//!
//! # Merge Semantics
//!
//! Applying a partial style is a field-by-field overwrite: attributes that are
//! `None` in the partial leave the accumulated value untouched. Values that
//! cannot be rendered (non-finite numbers, non-positive sizes) are treated as
//! undefined and logged. An empty `modifier_icon` explicitly clears any
//! modifier set by an earlier layer.

use std::{fmt, str::FromStr};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Icon shown when nothing else is configured.
pub const DEFAULT_ICON: &str = "location-question";

/// Default symbol size in display pixels.
pub const DEFAULT_SIZE: f32 = 15.0;

/// Default opacity of the secondary tone.
pub const DEFAULT_SECONDARY_OPACITY: f32 = 0.4;

/// Style variant of an icon in the catalogue.
///
/// Font Awesome style families plus the coloured/outlined families of the
/// secondary icon library.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconVariant {
    #[default]
    Solid,
    Regular,
    Light,
    Thin,
    Duotone,
    Tritone,
    SharpSolid,
    SharpRegular,
    SharpLight,
    SharpThin,
    Brands,
    Coloured,
    ColouredOutlined,
    Outlined,
}

impl IconVariant {
    /// Every variant, in declaration order.
    pub const ALL: [IconVariant; 14] = [
        Self::Solid,
        Self::Regular,
        Self::Light,
        Self::Thin,
        Self::Duotone,
        Self::Tritone,
        Self::SharpSolid,
        Self::SharpRegular,
        Self::SharpLight,
        Self::SharpThin,
        Self::Brands,
        Self::Coloured,
        Self::ColouredOutlined,
        Self::Outlined,
    ];

    /// Returns the catalogue name of this variant
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Regular => "regular",
            Self::Light => "light",
            Self::Thin => "thin",
            Self::Duotone => "duotone",
            Self::Tritone => "tritone",
            Self::SharpSolid => "sharp-solid",
            Self::SharpRegular => "sharp-regular",
            Self::SharpLight => "sharp-light",
            Self::SharpThin => "sharp-thin",
            Self::Brands => "brands",
            Self::Coloured => "coloured",
            Self::ColouredOutlined => "coloured-outlined",
            Self::Outlined => "outlined",
        }
    }

    /// True for variants whose secondary paths take the secondary colour.
    pub fn is_multi_tone(self) -> bool {
        matches!(self, Self::Duotone | Self::Tritone)
    }

    /// True for variants whose tertiary paths take the tertiary colour.
    pub fn is_three_tone(self) -> bool {
        matches!(self, Self::Tritone)
    }
}

impl FromStr for IconVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|variant| variant.as_str() == s)
            .ok_or_else(|| format!("invalid icon style `{s}`"))
    }
}

impl fmt::Display for IconVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A partial symbol style.
///
/// Every attribute is optional; `None` means "not defined at this layer".
/// Field names follow the stored symbology format.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolStyle {
    /// Display name of a preset. Not a visual attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub icon: Option<String>,
    pub icon_style: Option<IconVariant>,
    pub size: Option<f32>,
    pub rotation: Option<f32>,
    pub colour: Option<Color>,
    pub opacity: Option<f32>,
    pub secondary_colour: Option<Color>,
    pub secondary_opacity: Option<f32>,
    pub tertiary_colour: Option<Color>,
    pub tertiary_opacity: Option<f32>,
    pub background_colour: Option<Color>,
    pub modifier_icon: Option<String>,
    pub modifier_colour: Option<Color>,
    pub modifier_opacity: Option<f32>,
    pub modifier_circle_colour: Option<Color>,
    pub modifier_circle_opacity: Option<f32>,
}

impl SymbolStyle {
    /// Returns true if no visual attribute is defined.
    pub fn is_empty(&self) -> bool {
        let visual = Self {
            name: None,
            ..self.clone()
        };
        visual == Self::default()
    }
}

/// The final visual configuration of one feature.
///
/// Built from [`ResolvedStyle::default`] (the application defaults) and
/// refined with [`ResolvedStyle::apply`]. Every float is finite, opacities lie
/// in `[0, 1]` and the size is positive.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    icon: String,
    icon_variant: IconVariant,
    size: f32,
    rotation: f32,
    primary_colour: Color,
    primary_opacity: f32,
    secondary_colour: Color,
    secondary_opacity: f32,
    tertiary_colour: Color,
    tertiary_opacity: f32,
    background_colour: Color,
    modifier_icon: Option<String>,
    modifier_colour: Option<Color>,
    modifier_opacity: Option<f32>,
    modifier_circle_colour: Option<Color>,
    modifier_circle_opacity: Option<f32>,
}

impl Default for ResolvedStyle {
    /// The built-in application defaults.
    fn default() -> Self {
        Self {
            icon: DEFAULT_ICON.to_string(),
            icon_variant: IconVariant::Solid,
            size: DEFAULT_SIZE,
            rotation: 0.0,
            primary_colour: Color::from_rgba8(0x00, 0x00, 0x00, 0xff),
            primary_opacity: 1.0,
            secondary_colour: Color::from_rgba8(0x98, 0x96, 0x96, 0xff),
            secondary_opacity: DEFAULT_SECONDARY_OPACITY,
            tertiary_colour: Color::from_rgba8(0xa6, 0xa6, 0xa6, 0xff),
            tertiary_opacity: 1.0,
            // Nearly transparent so the whole icon square stays clickable
            background_colour: Color::from_rgba8(0xff, 0xff, 0xff, 0x10),
            modifier_icon: None,
            modifier_colour: None,
            modifier_opacity: None,
            modifier_circle_colour: None,
            modifier_circle_opacity: None,
        }
    }
}

impl ResolvedStyle {
    /// Applies a partial style over this one, returning the merged result.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapa_core::{color::Color, style::{ResolvedStyle, SymbolStyle}};
    ///
    /// let red = SymbolStyle {
    ///     colour: Some(Color::new("red").unwrap()),
    ///     ..SymbolStyle::default()
    /// };
    /// let style = ResolvedStyle::default().apply(&red);
    /// assert_eq!(style.primary_colour(), Color::new("#ff0000").unwrap());
    /// assert_eq!(style.size(), 15.0);
    /// ```
    pub fn apply(mut self, partial: &SymbolStyle) -> Self {
        if let Some(icon) = &partial.icon {
            self.icon.clone_from(icon);
        }
        if let Some(variant) = partial.icon_style {
            self.icon_variant = variant;
        }
        if let Some(size) = partial.size {
            if size.is_finite() && size > 0.0 {
                self.size = size;
            } else {
                warn!(size; "Ignoring invalid symbol size");
            }
        }
        if let Some(rotation) = finite("rotation", partial.rotation) {
            self.rotation = rotation;
        }
        if let Some(colour) = partial.colour {
            self.primary_colour = colour;
        }
        if let Some(opacity) = opacity("opacity", partial.opacity) {
            self.primary_opacity = opacity;
        }
        if let Some(colour) = partial.secondary_colour {
            self.secondary_colour = colour;
        }
        if let Some(opacity) = opacity("secondary_opacity", partial.secondary_opacity) {
            self.secondary_opacity = opacity;
        }
        if let Some(colour) = partial.tertiary_colour {
            self.tertiary_colour = colour;
        }
        if let Some(opacity) = opacity("tertiary_opacity", partial.tertiary_opacity) {
            self.tertiary_opacity = opacity;
        }
        if let Some(colour) = partial.background_colour {
            self.background_colour = colour;
        }
        if let Some(icon) = &partial.modifier_icon {
            self.modifier_icon = (!icon.is_empty()).then(|| icon.clone());
        }
        if let Some(colour) = partial.modifier_colour {
            self.modifier_colour = Some(colour);
        }
        if let Some(opacity) = opacity("modifier_opacity", partial.modifier_opacity) {
            self.modifier_opacity = Some(opacity);
        }
        if let Some(colour) = partial.modifier_circle_colour {
            self.modifier_circle_colour = Some(colour);
        }
        if let Some(opacity) = opacity("modifier_circle_opacity", partial.modifier_circle_opacity) {
            self.modifier_circle_opacity = Some(opacity);
        }
        self
    }

    /// Returns a copy of this style drawing a different icon.
    pub fn with_icon(mut self, icon: impl Into<String>, variant: IconVariant) -> Self {
        self.icon = icon.into();
        self.icon_variant = variant;
        self
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn icon_variant(&self) -> IconVariant {
        self.icon_variant
    }

    /// Display size in pixels.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Clockwise rotation in degrees.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn primary_colour(&self) -> Color {
        self.primary_colour
    }

    pub fn primary_opacity(&self) -> f32 {
        self.primary_opacity
    }

    pub fn secondary_colour(&self) -> Color {
        self.secondary_colour
    }

    pub fn secondary_opacity(&self) -> f32 {
        self.secondary_opacity
    }

    pub fn tertiary_colour(&self) -> Color {
        self.tertiary_colour
    }

    pub fn tertiary_opacity(&self) -> f32 {
        self.tertiary_opacity
    }

    pub fn background_colour(&self) -> Color {
        self.background_colour
    }

    /// Modifier badge icon, never an empty string.
    pub fn modifier_icon(&self) -> Option<&str> {
        self.modifier_icon.as_deref()
    }

    pub fn modifier_colour(&self) -> Option<Color> {
        self.modifier_colour
    }

    pub fn modifier_opacity(&self) -> Option<f32> {
        self.modifier_opacity
    }

    pub fn modifier_circle_colour(&self) -> Option<Color> {
        self.modifier_circle_colour
    }

    pub fn modifier_circle_opacity(&self) -> Option<f32> {
        self.modifier_circle_opacity
    }

    /// Returns the cache key identifying this exact appearance.
    ///
    /// Two styles share a key if and only if they are field-wise equal. The
    /// built-in default style always maps to [`CacheKey::default_icon`].
    ///
    /// # Examples
    ///
    /// ```
    /// use mapa_core::style::{CacheKey, ResolvedStyle, SymbolStyle};
    ///
    /// assert_eq!(ResolvedStyle::default().cache_key(), CacheKey::default_icon());
    ///
    /// let bigger = ResolvedStyle::default().apply(&SymbolStyle {
    ///     size: Some(20.0),
    ///     ..SymbolStyle::default()
    /// });
    /// assert_ne!(bigger.cache_key(), CacheKey::default_icon());
    /// ```
    pub fn cache_key(&self) -> CacheKey {
        if *self == Self::default() {
            return CacheKey::default_icon();
        }
        CacheKey(self.canonical_form())
    }

    /// Serialises every field in a fixed order.
    ///
    /// Adding a field to [`ResolvedStyle`] must add it here too, otherwise
    /// styles differing only in that field would share an atlas entry.
    fn canonical_form(&self) -> String {
        let Self {
            icon,
            icon_variant,
            size,
            rotation,
            primary_colour,
            primary_opacity,
            secondary_colour,
            secondary_opacity,
            tertiary_colour,
            tertiary_opacity,
            background_colour,
            modifier_icon,
            modifier_colour,
            modifier_opacity,
            modifier_circle_colour,
            modifier_circle_opacity,
        } = self;

        format!(
            "icon={icon:?};variant={icon_variant};size={};rotation={};\
             primary={primary_colour}@{};secondary={secondary_colour}@{};\
             tertiary={tertiary_colour}@{};background={background_colour};\
             modifier={modifier_icon:?};modifier_colour={};modifier_opacity={};\
             modifier_circle={};modifier_circle_opacity={}",
            canonical_float(*size),
            canonical_float(*rotation),
            canonical_float(*primary_opacity),
            canonical_float(*secondary_opacity),
            canonical_float(*tertiary_opacity),
            optional_colour(*modifier_colour),
            optional_float(*modifier_opacity),
            optional_colour(*modifier_circle_colour),
            optional_float(*modifier_circle_opacity),
        )
    }
}

/// Identifier of one distinct visual appearance.
///
/// Features whose resolved styles are equal share a key and therefore one
/// atlas entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// The reserved key of the built-in default style.
    pub const DEFAULT_ICON: &'static str = "default_icon";

    /// Returns the reserved key of the built-in default style.
    pub fn default_icon() -> Self {
        Self(Self::DEFAULT_ICON.to_string())
    }

    /// Returns true for the reserved default key.
    pub fn is_default_icon(&self) -> bool {
        self.0 == Self::DEFAULT_ICON
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn finite(field: &'static str, value: Option<f32>) -> Option<f32> {
    let value = value?;
    if value.is_finite() {
        Some(value)
    } else {
        warn!(field, value; "Ignoring non-finite style value");
        None
    }
}

fn opacity(field: &'static str, value: Option<f32>) -> Option<f32> {
    finite(field, value).map(|value| value.clamp(0.0, 1.0))
}

// Folds -0.0 into 0.0 so equal floats always print the same.
fn canonical_float(value: f32) -> f32 {
    value + 0.0
}

fn optional_float(value: Option<f32>) -> String {
    value.map_or_else(|| "-".to_string(), |v| canonical_float(v).to_string())
}

fn optional_colour(value: Option<Color>) -> String {
    value.map_or_else(|| "-".to_string(), Color::to_hex)
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn colour_strategy() -> impl Strategy<Value = Color> {
        (any::<u8>(), any::<u8>(), any::<u8>(), any::<u8>())
            .prop_map(|(r, g, b, a)| Color::from_rgba8(r, g, b, a))
    }

    fn opacity_strategy() -> impl Strategy<Value = f32> {
        prop_oneof![Just(0.0f32), Just(0.4f32), Just(1.0f32), 0.0f32..=1.0]
    }

    fn partial_style_strategy() -> impl Strategy<Value = SymbolStyle> {
        (
            (
                proptest::option::of(prop_oneof![
                    Just("tree".to_string()),
                    Just("house".to_string()),
                    Just(DEFAULT_ICON.to_string()),
                ]),
                proptest::option::of(proptest::sample::select(IconVariant::ALL.to_vec())),
                proptest::option::of(prop_oneof![Just(15.0f32), 1.0f32..64.0]),
                proptest::option::of(-360.0f32..360.0),
                proptest::option::of(colour_strategy()),
                proptest::option::of(opacity_strategy()),
            ),
            (
                proptest::option::of(colour_strategy()),
                proptest::option::of(opacity_strategy()),
                proptest::option::of(colour_strategy()),
                proptest::option::of(prop_oneof![
                    Just(String::new()),
                    Just("circle-check".to_string()),
                    Just("circle-xmark".to_string()),
                ]),
                proptest::option::of(colour_strategy()),
                proptest::option::of(opacity_strategy()),
            ),
        )
            .prop_map(
                |(
                    (icon, icon_style, size, rotation, colour, opacity),
                    (
                        secondary_colour,
                        secondary_opacity,
                        background_colour,
                        modifier_icon,
                        modifier_colour,
                        modifier_opacity,
                    ),
                )| SymbolStyle {
                    name: None,
                    icon,
                    icon_style,
                    size,
                    rotation,
                    colour,
                    opacity,
                    secondary_colour,
                    secondary_opacity,
                    tertiary_colour: None,
                    tertiary_opacity: None,
                    background_colour,
                    modifier_icon,
                    modifier_colour,
                    modifier_opacity,
                    modifier_circle_colour: None,
                    modifier_circle_opacity: None,
                },
            )
    }

    fn resolved_style_strategy() -> impl Strategy<Value = ResolvedStyle> {
        partial_style_strategy().prop_map(|partial| ResolvedStyle::default().apply(&partial))
    }

    // ===================
    // Property Test Functions
    // ===================

    /// The last layer defining an attribute wins; otherwise the default stays.
    fn check_merge_precedence(layers: Vec<SymbolStyle>) -> Result<(), TestCaseError> {
        let resolved = layers
            .iter()
            .fold(ResolvedStyle::default(), |style, layer| style.apply(layer));
        let defaults = ResolvedStyle::default();

        let expected_colour = layers
            .iter()
            .rev()
            .find_map(|layer| layer.colour)
            .unwrap_or(defaults.primary_colour());
        let expected_size = layers
            .iter()
            .rev()
            .find_map(|layer| layer.size)
            .unwrap_or(defaults.size());
        let expected_icon = layers
            .iter()
            .rev()
            .find_map(|layer| layer.icon.clone())
            .unwrap_or_else(|| defaults.icon().to_string());
        let expected_variant = layers
            .iter()
            .rev()
            .find_map(|layer| layer.icon_style)
            .unwrap_or(defaults.icon_variant());
        let expected_modifier = layers
            .iter()
            .rev()
            .find_map(|layer| layer.modifier_icon.clone())
            .filter(|icon| !icon.is_empty());

        prop_assert_eq!(resolved.primary_colour(), expected_colour);
        prop_assert_eq!(resolved.size(), expected_size);
        prop_assert_eq!(resolved.icon(), expected_icon.as_str());
        prop_assert_eq!(resolved.icon_variant(), expected_variant);
        prop_assert_eq!(resolved.modifier_icon(), expected_modifier.as_deref());
        Ok(())
    }

    /// Keys are equal exactly when styles are equal.
    fn check_cache_key_matches_equality(
        a: ResolvedStyle,
        b: ResolvedStyle,
    ) -> Result<(), TestCaseError> {
        prop_assert_eq!(a.cache_key(), a.clone().cache_key());
        prop_assert_eq!(a == b, a.cache_key() == b.cache_key());
        Ok(())
    }

    /// Perturbing a single attribute always changes the key.
    fn check_single_field_change_changes_key(
        style: ResolvedStyle,
        size_delta: f32,
    ) -> Result<(), TestCaseError> {
        let changed = style.clone().apply(&SymbolStyle {
            size: Some(style.size() + size_delta),
            ..SymbolStyle::default()
        });
        prop_assume!(changed.size() != style.size());
        prop_assert_ne!(style.cache_key(), changed.cache_key());
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn merge_precedence(layers in proptest::collection::vec(partial_style_strategy(), 0..6)) {
            check_merge_precedence(layers)?;
        }

        #[test]
        fn cache_key_matches_equality(a in resolved_style_strategy(), b in resolved_style_strategy()) {
            check_cache_key_matches_equality(a, b)?;
        }

        #[test]
        fn cache_key_identical_styles(a in resolved_style_strategy()) {
            check_cache_key_matches_equality(a.clone(), a)?;
        }

        #[test]
        fn single_field_change_changes_key(style in resolved_style_strategy(), delta in 0.5f32..10.0) {
            check_single_field_change_changes_key(style, delta)?;
        }
    }
}
