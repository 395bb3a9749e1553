//! The scratch canvas atlas builds draw on.
//!
//! There is one [`AtlasCanvas`] per renderer and it is reused across builds.
//! Access is scoped: [`AtlasCanvas::acquire`] resizes and clears the surface
//! and hands out a [`CanvasFrame`] borrowing it mutably, so two builds can
//! never draw on it at the same time.

use log::debug;
use resvg::tiny_skia;

use mapa_core::geometry::{Point, Size};

use crate::{atlas::AtlasError, decode::Bitmap};

/// A reusable raster surface.
#[derive(Debug, Default)]
pub struct AtlasCanvas {
    pixmap: Option<tiny_skia::Pixmap>,
    torn_down: bool,
}

impl AtlasCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false once the canvas has been torn down.
    pub fn is_available(&self) -> bool {
        !self.torn_down
    }

    /// Current surface size; zero before the first acquisition.
    pub fn size(&self) -> Size {
        self.pixmap
            .as_ref()
            .map_or_else(Size::default, |pixmap| Size::new(pixmap.width(), pixmap.height()))
    }

    /// Resizes the surface to `size`, clears it and starts drawing.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError::CanvasUnavailable`] if the canvas was torn
    /// down, and [`AtlasError::InvalidSize`] if the surface cannot be
    /// allocated at `size`.
    pub fn acquire(&mut self, size: Size) -> Result<CanvasFrame<'_>, AtlasError> {
        if self.torn_down {
            return Err(AtlasError::CanvasUnavailable);
        }

        match self.pixmap.as_mut() {
            Some(pixmap) if pixmap.width() == size.width() && pixmap.height() == size.height() => {
                pixmap.fill(tiny_skia::Color::TRANSPARENT);
            }
            _ => {
                let pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or(
                    AtlasError::InvalidSize {
                        width: size.width(),
                        height: size.height(),
                    },
                )?;
                debug!(width = size.width(), height = size.height(); "Canvas resized");
                self.pixmap = Some(pixmap);
            }
        }

        let pixmap = self.pixmap.as_mut().ok_or(AtlasError::CanvasUnavailable)?;
        Ok(CanvasFrame { pixmap })
    }

    /// Releases the surface. Every later acquisition fails.
    pub fn tear_down(&mut self) {
        self.pixmap = None;
        self.torn_down = true;
    }
}

/// Exclusive drawing access to an acquired canvas.
pub struct CanvasFrame<'a> {
    pixmap: &'a mut tiny_skia::Pixmap,
}

impl CanvasFrame<'_> {
    /// Copies `bitmap` onto the canvas with its top-left corner at `at`.
    pub fn draw(&mut self, bitmap: &Bitmap, at: Point) {
        self.pixmap.draw_pixmap(
            at.x() as i32,
            at.y() as i32,
            bitmap.pixmap().as_ref(),
            &tiny_skia::PixmapPaint::default(),
            tiny_skia::Transform::identity(),
            None,
        );
    }

    /// Encodes the canvas content as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError::Encode`] if PNG encoding fails.
    pub fn encode_png(&self) -> Result<Vec<u8>, AtlasError> {
        self.pixmap
            .encode_png()
            .map_err(|err| AtlasError::Encode(err.to_string()))
    }
}
