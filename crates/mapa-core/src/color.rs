//! Color handling for Mapa symbols
//!
//! This module provides the [`Color`] type which wraps the `DynamicColor` type
//! from the color crate. Symbol colours arrive as CSS strings (usually hex,
//! sometimes with an alpha channel) and leave as canonical hex so that two
//! spellings of the same colour produce the same cache key.

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use color::{AlphaColor, DynamicColor, Hsl, Srgb};

/// Wrapper around the `DynamicColor` type from the color crate.
///
/// Equality and hashing use the canonical 8-bit sRGBA value, so `"red"`,
/// `"#f00"` and `"#ff0000ff"` are all the same colour.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    color: DynamicColor,
}

impl Color {
    /// Create a new `Color` from a string
    /// This will parse CSS color strings such as "#ff0000", "#ff000080", "rgb(255, 0, 0)", "red", etc.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapa_core::color::Color;
    ///
    /// let red = Color::new("#ff0000").unwrap();
    /// let translucent = Color::new("#FFFFFF10").unwrap();
    /// assert_eq!(red, Color::new("red").unwrap());
    /// assert_eq!(translucent.to_hex(), "#ffffff10");
    /// ```
    pub fn new(color_str: &str) -> Result<Self, String> {
        match DynamicColor::from_str(color_str) {
            Ok(color) => Ok(Self { color }),
            Err(err) => Err(format!("invalid color `{color_str}`: {err}")),
        }
    }

    /// Create a new `Color` from 8-bit sRGB components.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            color: DynamicColor::from_alpha_color(AlphaColor::<Srgb>::from_rgba8(r, g, b, a)),
        }
    }

    /// Returns the colour as `[r, g, b, a]` bytes in sRGB.
    pub fn to_rgba8(self) -> [u8; 4] {
        let rgba = self.color.to_alpha_color::<Srgb>().to_rgba8();
        [rgba.r, rgba.g, rgba.b, rgba.a]
    }

    /// Returns the canonical lowercase hex form.
    ///
    /// Opaque colours are written as `#rrggbb`, everything else as `#rrggbbaa`.
    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == u8::MAX {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }

    /// Returns the opaque `#rrggbb` part of the colour, dropping alpha.
    ///
    /// Used for SVG `fill` attributes, where alpha travels separately in
    /// `fill-opacity`.
    pub fn to_rgb_hex(self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Creates a new color with the specified alpha (transparency) value.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapa_core::color::Color;
    ///
    /// let red = Color::new("red").unwrap();
    /// let semi_transparent_red = red.with_alpha(0.5);
    /// assert_eq!(semi_transparent_red.to_hex(), "#ff000080");
    /// ```
    pub fn with_alpha(self, alpha: f32) -> Self {
        Color {
            color: self.color.with_alpha(alpha),
        }
    }

    /// Returns the alpha (transparency) component of this color, between
    /// 0.0 (fully transparent) and 1.0 (fully opaque).
    ///
    /// The value is quantized to 8 bits, like equality and hashing, so two
    /// equal colours always draw with the same opacity.
    pub fn alpha(&self) -> f32 {
        let [_, _, _, a] = self.to_rgba8();
        f32::from(a) / f32::from(u8::MAX)
    }

    /// Returns a darker copy of this colour.
    ///
    /// The lightness channel in HSL space is reduced by `percent` points
    /// (HSL lightness runs from 0 to 100) and clamped at black. Alpha is kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapa_core::color::Color;
    ///
    /// let white = Color::new("#ffffff").unwrap();
    /// let [r, _, _, a] = white.darken(10.0).to_rgba8();
    /// assert!(r < 255);
    /// assert_eq!(a, 255);
    /// ```
    pub fn darken(self, percent: f32) -> Self {
        let mut hsl: AlphaColor<Hsl> = self.color.to_alpha_color::<Hsl>();
        hsl.components[2] = (hsl.components[2] - percent).clamp(0.0, 100.0);
        Self {
            color: DynamicColor::from_alpha_color(hsl.convert::<Srgb>()),
        }
    }
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        self.to_rgba8() == other.to_rgba8()
    }
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_rgba8().hash(state);
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::from_rgba8(0, 0, 0, u8::MAX)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
