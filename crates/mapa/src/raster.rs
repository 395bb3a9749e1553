//! Icon rasterization.
//!
//! [`IconRasterizer`] turns a [`ResolvedStyle`] into a standalone SVG
//! document ([`VectorImage`]) with an explicit pixel size, ready to be
//! decoded into a bitmap.
//!
//! Rendering happens in four steps:
//!
//! 1. The base icon is looked up in the requested variant, falling back to
//!    the icon's default variant.
//! 2. Every path is filled according to its tone. Secondary paths only take
//!    the secondary colour on multi-tone variants and tertiary paths only on
//!    three-tone variants; otherwise they fall back to the primary colour.
//!    Colour-locked icons keep the fills declared in their markup.
//! 3. If the style names a modifier, the base is shrunk toward the top-left
//!    corner and a badge (a backing circle plus the modifier's paths) is placed
//!    in the bottom-right corner. A modifier that cannot be composited is
//!    dropped and the base is drawn exactly as if no modifier was set.
//! 4. The document gets its pixel size, background and rotation.
//!
//! The SVG structure produced is:
//!
//! ```text
//! <svg viewBox width height>
//!   <g transform="rotate(..)">
//!     <rect/>                  background
//!     <g transform="..">       base paths (shrunk when a badge is present)
//!     <g>                      badge: backing circle and modifier paths
//! ```

use std::borrow::Cow;

use log::{debug, warn};
use svg::{self, node::element as svg_element};
use thiserror::Error;

use mapa_core::{
    color::Color,
    geometry::Size,
    style::{DEFAULT_ICON, IconVariant, ResolvedStyle},
};

use crate::{
    catalogue::{CatalogueError, IconCatalogue, IconPath, Tone, VectorIcon, ViewBox},
    config::{AtlasConfig, IconConfig},
};

/// Largest pixel edge a single icon is rendered at.
const MAX_ICON_EDGE: u32 = 2048;

/// Errors raised while rasterizing a style.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("icon `{icon}` has no `{variant}` variant and no usable default")]
    IconNotFound { icon: String, variant: IconVariant },

    #[error("modifier `{icon}` could not be composited: {source}")]
    Modifier {
        icon: String,
        #[source]
        source: CatalogueError,
    },
}

/// A rendered icon as an SVG document with a fixed pixel size.
#[derive(Debug, Clone)]
pub struct VectorImage {
    document: svg::Document,
    size: Size,
}

impl VectorImage {
    /// Returns the pixel size the image is meant to be decoded at
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn document(&self) -> &svg::Document {
        &self.document
    }

    /// Serialises the document to SVG markup.
    pub fn to_svg_string(&self) -> String {
        self.document.to_string()
    }
}

/// Renders resolved styles into [`VectorImage`]s.
pub struct IconRasterizer<'a> {
    catalogue: &'a dyn IconCatalogue,
    config: &'a IconConfig,
    raster_scale: f32,
}

impl<'a> IconRasterizer<'a> {
    /// Creates a rasterizer drawing icons from `catalogue`.
    pub fn new(
        catalogue: &'a dyn IconCatalogue,
        config: &'a IconConfig,
        atlas_config: &AtlasConfig,
    ) -> Self {
        Self {
            catalogue,
            config,
            raster_scale: atlas_config.raster_scale(),
        }
    }

    /// Renders `style`.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::IconNotFound`] if neither the requested variant
    /// nor the icon's default variant is available. Modifier failures are
    /// recovered internally and never returned.
    pub fn render(&self, style: &ResolvedStyle) -> Result<VectorImage, RasterError> {
        let (base, variant) = self.base_icon(style.icon(), style.icon_variant())?;
        Ok(self.compose(&base, variant, style))
    }

    /// Renders the built-in default icon with the colours of `style`.
    ///
    /// Used in place of a style whose icon cannot be found.
    pub fn render_fallback(&self, style: &ResolvedStyle) -> VectorImage {
        let fallback = style.clone().with_icon(DEFAULT_ICON, IconVariant::Solid);
        match self.base_icon(DEFAULT_ICON, IconVariant::Solid) {
            Ok((base, variant)) => self.compose(&base, variant, &fallback),
            Err(_) => self.compose(&VectorIcon::fallback(), IconVariant::Solid, &fallback),
        }
    }

    /// Looks up the base icon, falling back to its default variant.
    ///
    /// The default icon is always available through the built-in fallback.
    fn base_icon(
        &self,
        icon: &str,
        variant: IconVariant,
    ) -> Result<(Cow<'a, VectorIcon>, IconVariant), RasterError> {
        match self.lookup_with_fallback(icon, variant) {
            Ok((vector, variant)) => Ok((Cow::Borrowed(vector), variant)),
            Err(_) if icon == DEFAULT_ICON => {
                debug!("Default icon missing from catalogue, using built-in icon");
                Ok((Cow::Owned(VectorIcon::fallback()), IconVariant::Solid))
            }
            Err(err) => {
                debug!(icon, variant = variant.as_str(), err:%; "Icon lookup failed");
                Err(RasterError::IconNotFound {
                    icon: icon.to_string(),
                    variant,
                })
            }
        }
    }

    fn lookup_with_fallback(
        &self,
        icon: &str,
        variant: IconVariant,
    ) -> Result<(&'a VectorIcon, IconVariant), CatalogueError> {
        match self.catalogue.lookup(icon, variant) {
            Ok(vector) => Ok((vector, variant)),
            Err(err) => {
                let fallback = self
                    .catalogue
                    .default_variant(icon)
                    .filter(|fallback| *fallback != variant)
                    .ok_or(err)?;
                let vector = self.catalogue.lookup(icon, fallback)?;
                Ok((vector, fallback))
            }
        }
    }

    fn compose(&self, base: &VectorIcon, variant: IconVariant, style: &ResolvedStyle) -> VectorImage {
        let view_box = base.view_box();

        // Built before the base so that a failed modifier leaves the base untouched
        let badge = style.modifier_icon().and_then(|modifier| {
            self.badge(modifier, view_box, style)
                .inspect_err(|err| warn!(err:%; "Skipping modifier"))
                .ok()
        });

        let mut base_group = svg_element::Group::new();
        for path in base.paths() {
            base_group = base_group.add(self.tint(path, variant, base.is_colour_locked(), style));
        }

        let background = style.background_colour();
        let mut content = svg_element::Group::new().add(
            svg_element::Rectangle::new()
                .set("x", view_box.min_x())
                .set("y", view_box.min_y())
                .set("width", view_box.width())
                .set("height", view_box.height())
                .set("fill", background.to_rgb_hex())
                .set("fill-opacity", background.alpha()),
        );

        match badge {
            Some(badge) => {
                let shrink = self.config.modifier_shrink();
                base_group = base_group.set(
                    "transform",
                    format!(
                        "translate({} {}) scale({shrink}) translate({} {})",
                        view_box.min_x(),
                        view_box.min_y(),
                        -view_box.min_x(),
                        -view_box.min_y()
                    ),
                );
                content = content.add(base_group).add(badge);
            }
            None => content = content.add(base_group),
        }

        if style.rotation() != 0.0 {
            let (cx, cy) = view_box.center();
            content = content.set("transform", format!("rotate({} {cx} {cy})", style.rotation()));
        }

        let size = self.pixel_size(style);
        let document = svg::Document::new()
            .set(
                "viewBox",
                format!(
                    "{} {} {} {}",
                    view_box.min_x(),
                    view_box.min_y(),
                    view_box.width(),
                    view_box.height()
                ),
            )
            .set("width", size.width())
            .set("height", size.height())
            .add(content);

        VectorImage { document, size }
    }

    /// Fills one base path from the colour slot its tone maps to.
    fn tint(
        &self,
        path: &IconPath,
        variant: IconVariant,
        colour_locked: bool,
        style: &ResolvedStyle,
    ) -> svg_element::Path {
        let element = svg_element::Path::new().set("d", path.data());
        if colour_locked {
            return match path.fill() {
                Some(fill) => element.set("fill", fill),
                None => element,
            };
        }

        let (colour, opacity) = match path.tone() {
            Tone::Secondary if variant.is_multi_tone() => {
                (style.secondary_colour(), style.secondary_opacity())
            }
            Tone::Tertiary if variant.is_three_tone() => {
                (style.tertiary_colour(), style.tertiary_opacity())
            }
            Tone::Primary | Tone::Secondary | Tone::Tertiary => {
                (style.primary_colour(), style.primary_opacity())
            }
        };
        let colour = if path.is_darker() {
            colour.darken(self.config.darken_percent())
        } else {
            colour
        };

        element
            .set("fill", colour.to_rgb_hex())
            .set("fill-opacity", opacity * colour.alpha())
    }

    /// Builds the modifier badge for a base icon with `view_box`.
    fn badge(
        &self,
        modifier: &str,
        view_box: ViewBox,
        style: &ResolvedStyle,
    ) -> Result<svg_element::Group, RasterError> {
        let (icon, _) = self
            .lookup_with_fallback(modifier, IconVariant::Solid)
            .map_err(|source| RasterError::Modifier {
                icon: modifier.to_string(),
                source,
            })?;

        let edge = view_box.extent() * self.config.modifier_badge_scale();
        let x = view_box.min_x() + view_box.width() - edge;
        let y = view_box.min_y() + view_box.height() - edge;

        let circle_colour = style
            .modifier_circle_colour()
            .unwrap_or_else(|| Color::from_rgba8(0x00, 0x00, 0x00, 0xff));
        let circle_opacity = style.modifier_circle_opacity().unwrap_or(1.0);
        let circle = svg_element::Circle::new()
            .set("cx", x + edge / 2.0)
            .set("cy", y + edge / 2.0)
            .set("r", edge / 2.0)
            .set("fill", circle_colour.to_rgb_hex())
            .set("fill-opacity", circle_opacity * circle_colour.alpha());

        // Fit the modifier into the badge, centred along its shorter edge
        let modifier_box = icon.view_box();
        let scale = edge / modifier_box.extent();
        let offset_x = (edge - modifier_box.width() * scale) / 2.0;
        let offset_y = (edge - modifier_box.height() * scale) / 2.0;

        let colour = style
            .modifier_colour()
            .unwrap_or_else(|| Color::from_rgba8(0xff, 0xff, 0xff, 0xff));
        let opacity = style.modifier_opacity().unwrap_or(1.0) * colour.alpha();
        let mut paths = svg_element::Group::new().set(
            "transform",
            format!(
                "translate({} {}) scale({scale}) translate({} {})",
                x + offset_x,
                y + offset_y,
                -modifier_box.min_x(),
                -modifier_box.min_y()
            ),
        );
        for path in icon.paths() {
            paths = paths.add(
                svg_element::Path::new()
                    .set("d", path.data())
                    .set("fill", colour.to_rgb_hex())
                    .set("fill-opacity", opacity),
            );
        }

        Ok(svg_element::Group::new().add(circle).add(paths))
    }

    /// Output size: the display size scaled by the icon multiplier and raster scale.
    fn pixel_size(&self, style: &ResolvedStyle) -> Size {
        let edge = (style.size() * self.config.size_multiplier() * self.raster_scale).ceil();
        let edge = if edge.is_finite() {
            (edge.max(1.0) as u32).min(MAX_ICON_EDGE)
        } else {
            MAX_ICON_EDGE
        };
        Size::new(edge, edge)
    }
}
