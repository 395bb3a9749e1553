//! Icon catalogue.
//!
//! The catalogue maps an icon name and style variant to the vector path data
//! the rasterizer colours and composes. Lookups are synchronous.
//!
//! Icons are parsed once, when they enter the catalogue, into a
//! [`VectorIcon`]: the view box plus an ordered list of [`IconPath`]s, each
//! tagged with the [`Tone`] it is coloured with. Tones come from the path's
//! `class` attribute:
//!
//! | Class                  | Tone                    |
//! |------------------------|-------------------------|
//! | `fa-primary`, none     | [`Tone::Primary`]       |
//! | `fa-secondary`         | [`Tone::Secondary`]     |
//! | `fa-tertiary`          | [`Tone::Tertiary`]      |
//!
//! Each class may carry a `-darker` suffix (`fa-secondary-darker`), asking for
//! the tone's colour with reduced lightness.

use std::{fmt, io::Read};

use indexmap::IndexMap;
use log::{debug, warn};
use serde::Deserialize;
use svg::{
    node::element::tag::{self, Type},
    parser::Event,
};
use thiserror::Error;

use mapa_core::style::IconVariant;

/// Path data of the built-in fallback icon (a map pin with a question mark).
const FALLBACK_PATH: &str = "M215.7 499.2C267 435 384 279.4 384 192C384 86 298 0 192 0S0 86 0 192c0 87.4 117 243 168.3 307.2c12.3 15.3 35.1 15.3 47.4 0zM105.8 133.3c7.9-22.3 29.1-37.3 52.8-37.3h58.3c34.9 0 63.1 28.3 63.1 63.1c0 22.6-12.1 43.5-31.7 54.8L216 232.4c-.2 13-10.9 23.6-24 23.6c-13.3 0-24-10.7-24-24V218.5c0-8.6 4.6-16.5 12.1-20.8l44.3-25.4c4.7-2.7 7.6-7.7 7.6-13.1c0-8.4-6.8-15.1-15.1-15.1H158.6c-3.4 0-6.4 2.1-7.5 5.3l-.4 1.2c-4.4 12.5-18.2 19-30.6 14.6s-19-18.2-14.6-30.6l.4-1.2zM160 320a32 32 0 1 1 64 0 32 32 0 1 1 -64 0z";

/// Errors raised by catalogue lookups and icon parsing.
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("icon `{icon}` is not in the catalogue")]
    UnknownIcon { icon: String },

    #[error("icon `{icon}` has no `{variant}` variant")]
    MissingVariant { icon: String, variant: IconVariant },

    #[error("malformed icon markup: {0}")]
    Malformed(String),

    #[error("failed to read icon library: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse icon library: {0}")]
    Json(#[from] serde_json::Error),
}

/// Source of icon path data.
pub trait IconCatalogue {
    /// Returns the icon drawn for `icon` in `variant`.
    ///
    /// # Errors
    ///
    /// [`CatalogueError::UnknownIcon`] if the icon does not exist,
    /// [`CatalogueError::MissingVariant`] if it exists without that variant.
    fn lookup(&self, icon: &str, variant: IconVariant) -> Result<&VectorIcon, CatalogueError>;

    /// Returns the variant an icon is drawn in when the requested one is
    /// unavailable, or `None` for unknown icons.
    fn default_variant(&self, icon: &str) -> Option<IconVariant>;
}

/// Colour slot a path is filled from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Tone {
    #[default]
    Primary,
    Secondary,
    Tertiary,
}

impl Tone {
    /// Parses a `class` attribute into a tone and darker flag.
    ///
    /// The first recognised class wins; unrecognised classes are ignored.
    fn from_class(class: &str) -> (Self, bool) {
        for name in class.split_whitespace() {
            let (base, darker) = match name.strip_suffix("-darker") {
                Some(base) => (base, true),
                None => (name, false),
            };
            let tone = match base {
                "fa-primary" => Self::Primary,
                "fa-secondary" => Self::Secondary,
                "fa-tertiary" => Self::Tertiary,
                _ => continue,
            };
            return (tone, darker);
        }
        (Self::Primary, false)
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Secondary => f.write_str("secondary"),
            Self::Tertiary => f.write_str("tertiary"),
        }
    }
}

/// One path of a vector icon.
#[derive(Debug, Clone, PartialEq)]
pub struct IconPath {
    data: String,
    tone: Tone,
    darker: bool,
    fill: Option<String>,
}

impl IconPath {
    /// Creates an untinted primary path
    pub fn primary(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            tone: Tone::Primary,
            darker: false,
            fill: None,
        }
    }

    /// Sets the tone of this path (builder style).
    pub fn with_tone(mut self, tone: Tone, darker: bool) -> Self {
        self.tone = tone;
        self.darker = darker;
        self
    }

    /// Path data (`d` attribute).
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn tone(&self) -> Tone {
        self.tone
    }

    /// True if the tone's colour is darkened for this path.
    pub fn is_darker(&self) -> bool {
        self.darker
    }

    /// The fill the markup declared, kept for colour-locked icons.
    pub fn fill(&self) -> Option<&str> {
        self.fill.as_deref()
    }
}

/// The `viewBox` of an icon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    min_x: f32,
    min_y: f32,
    width: f32,
    height: f32,
}

impl ViewBox {
    pub fn new(min_x: f32, min_y: f32, width: f32, height: f32) -> Self {
        Self {
            min_x,
            min_y,
            width,
            height,
        }
    }

    /// Parses a `viewBox` attribute value (`"0 0 512 512"`, commas allowed).
    fn parse(value: &str) -> Result<Self, CatalogueError> {
        let numbers = value
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|part| !part.is_empty())
            .map(str::parse::<f32>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| CatalogueError::Malformed(format!("invalid viewBox `{value}`: {err}")))?;

        match numbers[..] {
            [min_x, min_y, width, height]
                if [min_x, min_y, width, height].iter().all(|n| n.is_finite())
                    && width > 0.0
                    && height > 0.0 =>
            {
                Ok(Self::new(min_x, min_y, width, height))
            }
            _ => Err(CatalogueError::Malformed(format!(
                "invalid viewBox `{value}`"
            ))),
        }
    }

    pub fn min_x(self) -> f32 {
        self.min_x
    }

    pub fn min_y(self) -> f32 {
        self.min_y
    }

    pub fn width(self) -> f32 {
        self.width
    }

    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns the longer edge
    pub fn extent(self) -> f32 {
        self.width.max(self.height)
    }

    /// Returns the centre as `(x, y)`.
    pub fn center(self) -> (f32, f32) {
        (
            self.min_x + self.width / 2.0,
            self.min_y + self.height / 2.0,
        )
    }
}

/// Parsed path data of one icon variant.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIcon {
    view_box: ViewBox,
    paths: Vec<IconPath>,
    colour_locked: bool,
}

impl VectorIcon {
    /// Creates an icon from already parsed parts.
    pub fn new(view_box: ViewBox, paths: Vec<IconPath>) -> Self {
        Self {
            view_box,
            paths,
            colour_locked: false,
        }
    }

    /// Parses SVG markup.
    ///
    /// Only `<path>` elements are kept, in document order. Elements inside
    /// `<defs>` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::Malformed`] if the markup cannot be parsed,
    /// has no usable `viewBox` or contains no path data.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapa::catalogue::{Tone, VectorIcon};
    ///
    /// let icon = VectorIcon::parse(
    ///     r#"<svg viewBox="0 0 512 512">
    ///         <path class="fa-secondary" d="M0 0h512v512z"/>
    ///         <path class="fa-primary" d="M0 0h256v256z"/>
    ///     </svg>"#,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(icon.paths().len(), 2);
    /// assert_eq!(icon.paths()[0].tone(), Tone::Secondary);
    /// ```
    pub fn parse(markup: &str) -> Result<Self, CatalogueError> {
        let parser =
            svg::read(markup).map_err(|err| CatalogueError::Malformed(err.to_string()))?;

        let mut view_box = None;
        let mut paths = Vec::new();
        let mut defs_depth = 0usize;

        for event in parser {
            match event {
                Event::Tag(tag::SVG, Type::Start | Type::Empty, attributes) if view_box.is_none() => {
                    view_box = match attributes.get("viewBox") {
                        Some(value) => Some(ViewBox::parse(value)?),
                        None => Some(Self::view_box_from_size(
                            attributes.get("width").map(|v| v.to_string()),
                            attributes.get("height").map(|v| v.to_string()),
                        )?),
                    };
                }
                Event::Tag("defs", Type::Start, _) => defs_depth += 1,
                Event::Tag("defs", Type::End, _) => defs_depth = defs_depth.saturating_sub(1),
                Event::Tag(tag::Path, Type::Start | Type::Empty, attributes) if defs_depth == 0 => {
                    let Some(data) = attributes.get("d") else {
                        continue;
                    };
                    let (tone, darker) = attributes
                        .get("class")
                        .map_or((Tone::Primary, false), |class| Tone::from_class(class));
                    paths.push(IconPath {
                        data: data.to_string(),
                        tone,
                        darker,
                        fill: attributes.get("fill").map(|v| v.to_string()),
                    });
                }
                Event::Error(err) => return Err(CatalogueError::Malformed(err.to_string())),
                _ => {}
            }
        }

        let view_box =
            view_box.ok_or_else(|| CatalogueError::Malformed("missing <svg> element".to_string()))?;
        if paths.is_empty() {
            return Err(CatalogueError::Malformed("no path data".to_string()));
        }

        Ok(Self {
            view_box,
            paths,
            colour_locked: false,
        })
    }

    fn view_box_from_size(
        width: Option<String>,
        height: Option<String>,
    ) -> Result<ViewBox, CatalogueError> {
        match (width, height) {
            (Some(width), Some(height)) => ViewBox::parse(&format!("0 0 {width} {height}")),
            _ => Err(CatalogueError::Malformed(
                "missing viewBox and size".to_string(),
            )),
        }
    }

    /// The built-in map pin with a question mark.
    ///
    /// Used when the catalogue itself has no entry for the default icon.
    pub fn fallback() -> Self {
        Self::new(
            ViewBox::new(0.0, 0.0, 384.0, 512.0),
            vec![IconPath::primary(FALLBACK_PATH)],
        )
    }

    /// Marks the icon as keeping its own fills (builder style).
    pub fn with_colour_locked(mut self, colour_locked: bool) -> Self {
        self.colour_locked = colour_locked;
        self
    }

    pub fn view_box(&self) -> ViewBox {
        self.view_box
    }

    pub fn paths(&self) -> &[IconPath] {
        &self.paths
    }

    /// True if the icon is drawn with its own fills instead of style colours.
    pub fn is_colour_locked(&self) -> bool {
        self.colour_locked
    }
}

/// All variants of one catalogue icon.
#[derive(Debug, Clone, Default)]
pub struct CatalogueIcon {
    label: String,
    variants: IndexMap<IconVariant, VectorIcon>,
}

impl CatalogueIcon {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            variants: IndexMap::new(),
        }
    }

    /// Adds a variant (builder style). Declaration order is kept.
    pub fn with_variant(mut self, variant: IconVariant, icon: VectorIcon) -> Self {
        self.variants.insert(variant, icon);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn variants(&self) -> impl Iterator<Item = IconVariant> + '_ {
        self.variants.keys().copied()
    }

    /// The variant drawn when none is requested.
    ///
    /// Coloured variants are preferred, then `solid`, then whichever variant
    /// was declared first.
    pub fn default_variant(&self) -> Option<IconVariant> {
        [
            IconVariant::Coloured,
            IconVariant::ColouredOutlined,
            IconVariant::Solid,
        ]
        .into_iter()
        .find(|variant| self.variants.contains_key(variant))
        .or_else(|| self.variants.keys().next().copied())
    }
}

/// Icon library JSON entry.
#[derive(Deserialize)]
struct RawIcon {
    #[serde(default)]
    label: String,
    #[serde(default)]
    svgs: IndexMap<String, RawSvg>,
}

#[derive(Deserialize)]
struct RawSvg {
    svg: String,
    #[serde(default)]
    colour_locked: bool,
}

/// An in-memory icon catalogue.
///
/// # Examples
///
/// ```
/// use mapa::catalogue::{IconCatalogue, MemoryCatalogue};
/// use mapa_core::style::IconVariant;
///
/// let catalogue = MemoryCatalogue::from_json_str(
///     r#"{"tree": {"label": "Tree", "svgs": {
///         "solid": {"svg": "<svg viewBox=\"0 0 448 512\"><path d=\"M0 0h448v512z\"/></svg>"}
///     }}}"#,
/// )
/// .unwrap();
///
/// assert!(catalogue.lookup("tree", IconVariant::Solid).is_ok());
/// assert_eq!(catalogue.default_variant("tree"), Some(IconVariant::Solid));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogue {
    icons: IndexMap<String, CatalogueIcon>,
}

impl MemoryCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an icon.
    pub fn insert(&mut self, name: impl Into<String>, icon: CatalogueIcon) {
        self.icons.insert(name.into(), icon);
    }

    /// Adds or replaces an icon (builder style).
    pub fn with_icon(mut self, name: impl Into<String>, icon: CatalogueIcon) -> Self {
        self.insert(name, icon);
        self
    }

    /// Loads an icon library in JSON form.
    ///
    /// The expected layout is
    /// `{ name: { label, svgs: { variant: { svg, colour_locked } } } }`.
    /// Variants with an unknown name or unparsable markup are skipped with a
    /// warning; the rest of the library still loads.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::Json`] if the document does not have that
    /// layout.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogueError> {
        let raw: IndexMap<String, RawIcon> = serde_json::from_str(json)?;
        Ok(Self::from_raw(raw))
    }

    /// Loads an icon library in JSON form from a reader.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the layout is invalid.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, CatalogueError> {
        let mut json = String::new();
        reader.read_to_string(&mut json)?;
        Self::from_json_str(&json)
    }

    fn from_raw(raw: IndexMap<String, RawIcon>) -> Self {
        let mut catalogue = Self::new();

        for (name, raw_icon) in raw {
            let mut icon = CatalogueIcon::new(raw_icon.label);
            for (variant_name, raw_svg) in raw_icon.svgs {
                let variant = match variant_name.parse::<IconVariant>() {
                    Ok(variant) => variant,
                    Err(err) => {
                        warn!(icon = name.as_str(), err = err.as_str(); "Skipping icon variant");
                        continue;
                    }
                };
                match VectorIcon::parse(&raw_svg.svg) {
                    Ok(vector) => {
                        icon = icon
                            .with_variant(variant, vector.with_colour_locked(raw_svg.colour_locked));
                    }
                    Err(err) => {
                        warn!(
                            icon = name.as_str(),
                            variant = variant.as_str(),
                            err:% = err;
                            "Skipping unparsable icon variant"
                        );
                    }
                }
            }
            catalogue.insert(name, icon);
        }

        debug!(icons_count = catalogue.len(); "Icon catalogue loaded");
        catalogue
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    /// Returns the icon entry with all its variants
    pub fn icon(&self, name: &str) -> Option<&CatalogueIcon> {
        self.icons.get(name)
    }
}

impl IconCatalogue for MemoryCatalogue {
    fn lookup(&self, icon: &str, variant: IconVariant) -> Result<&VectorIcon, CatalogueError> {
        let entry = self
            .icons
            .get(icon)
            .ok_or_else(|| CatalogueError::UnknownIcon {
                icon: icon.to_string(),
            })?;
        entry
            .variants
            .get(&variant)
            .ok_or_else(|| CatalogueError::MissingVariant {
                icon: icon.to_string(),
                variant,
            })
    }

    fn default_variant(&self, icon: &str) -> Option<IconVariant> {
        self.icons.get(icon).and_then(CatalogueIcon::default_variant)
    }
}
