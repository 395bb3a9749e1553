//! Bitmap decoding.
//!
//! Converting a [`VectorImage`] into pixels is the only suspending step of an
//! atlas build. [`BitmapDecoder`] models it as an awaitable operation so that
//! hosts with an asynchronous image pipeline can plug theirs in;
//! [`ResvgDecoder`] rasterizes in-process with `resvg`.

use std::future::Future;

use resvg::{tiny_skia, usvg};
use thiserror::Error;

use mapa_core::geometry::Size;

use crate::raster::VectorImage;

/// Errors raised while decoding a vector image.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid SVG: {0}")]
    Svg(String),

    #[error("cannot allocate a {width}x{height} bitmap")]
    EmptyImage { width: u32, height: u32 },
}

/// A decoded RGBA bitmap (premultiplied alpha).
#[derive(Clone, PartialEq)]
pub struct Bitmap {
    pixmap: tiny_skia::Pixmap,
}

impl Bitmap {
    /// Creates a fully transparent bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::EmptyImage`] if either dimension is zero.
    pub fn blank(size: Size) -> Result<Self, DecodeError> {
        let pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or(
            DecodeError::EmptyImage {
                width: size.width(),
                height: size.height(),
            },
        )?;
        Ok(Self { pixmap })
    }

    /// Creates a bitmap filled with one straight (non-premultiplied) RGBA colour.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::EmptyImage`] if either dimension is zero.
    pub fn filled(size: Size, [r, g, b, a]: [u8; 4]) -> Result<Self, DecodeError> {
        let mut bitmap = Self::blank(size)?;
        bitmap
            .pixmap
            .fill(tiny_skia::Color::from_rgba8(r, g, b, a));
        Ok(bitmap)
    }

    pub fn size(&self) -> Size {
        Size::new(self.pixmap.width(), self.pixmap.height())
    }

    /// Raw premultiplied RGBA bytes, row by row.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub(crate) fn pixmap(&self) -> &tiny_skia::Pixmap {
        &self.pixmap
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap").field("size", &self.size()).finish()
    }
}

/// Turns vector images into bitmaps.
pub trait BitmapDecoder {
    /// Decodes `image` at its declared pixel size.
    fn decode(&self, image: &VectorImage) -> impl Future<Output = Result<Bitmap, DecodeError>>;
}

/// Decoder backed by `resvg`.
pub struct ResvgDecoder {
    options: usvg::Options<'static>,
}

impl Default for ResvgDecoder {
    fn default() -> Self {
        Self {
            options: usvg::Options::default(),
        }
    }
}

impl ResvgDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn decode_now(&self, image: &VectorImage) -> Result<Bitmap, DecodeError> {
        let tree = usvg::Tree::from_str(&image.to_svg_string(), &self.options)
            .map_err(|err| DecodeError::Svg(err.to_string()))?;

        let mut bitmap = Bitmap::blank(image.size())?;
        let target = image.size();
        let source = tree.size();
        let transform = tiny_skia::Transform::from_scale(
            target.width() as f32 / source.width(),
            target.height() as f32 / source.height(),
        );
        resvg::render(&tree, transform, &mut bitmap.pixmap.as_mut());

        Ok(bitmap)
    }
}

impl BitmapDecoder for ResvgDecoder {
    async fn decode(&self, image: &VectorImage) -> Result<Bitmap, DecodeError> {
        self.decode_now(image)
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::{
        catalogue::MemoryCatalogue,
        config::{AtlasConfig, IconConfig},
        raster::IconRasterizer,
    };
    use mapa_core::style::ResolvedStyle;

    #[test]
    fn test_blank_rejects_zero_size() {
        assert!(matches!(
            Bitmap::blank(Size::new(0, 4)),
            Err(DecodeError::EmptyImage { width: 0, height: 4 })
        ));
    }

    #[test]
    fn test_decode_default_icon() {
        let catalogue = MemoryCatalogue::new();
        let config = IconConfig::default();
        let atlas = AtlasConfig::default();
        let image = IconRasterizer::new(&catalogue, &config, &atlas)
            .render(&ResolvedStyle::default())
            .unwrap();

        let bitmap = block_on(ResvgDecoder::new().decode(&image)).unwrap();

        assert_eq!(bitmap.size(), image.size());
        // The pin is drawn in opaque black somewhere on the bitmap
        assert!(bitmap.data().chunks(4).any(|px| px[3] == 255));
    }
}
