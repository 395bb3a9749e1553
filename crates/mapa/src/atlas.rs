//! Texture atlas building.
//!
//! An atlas packs one bitmap per distinct [`CacheKey`] into a single image so
//! the renderer host can draw every feature from one texture. Builds run in
//! two phases:
//!
//! 1. **Decode** (async): every style is rasterized and decoded. Decodes are
//!    issued together and all of them are awaited before anything is drawn.
//! 2. **Pack** (sync): bitmaps are laid out in one column with
//!    [`pack_column`], the scratch canvas is acquired and every bitmap is
//!    drawn at its slot.
//!
//! The reserved default style is always part of the build and always comes
//! first, so the atlas has a fallback entry for keys it does not know. An
//! entry whose icon cannot be drawn is substituted and the build goes on;
//! only an unavailable canvas aborts a build.

use std::{borrow::Cow, collections::BTreeMap};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use futures::future::join_all;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use mapa_core::{
    geometry::{Point, Size, TextureRegion, pack_column},
    style::{CacheKey, ResolvedStyle},
};

use crate::{
    canvas::AtlasCanvas,
    config::AtlasConfig,
    decode::{Bitmap, BitmapDecoder},
    projector::SYMBOL_CACHE_KEY_PROPERTY,
    raster::IconRasterizer,
};

/// Distinct styles keyed by their cache key.
pub type StyleMap = BTreeMap<CacheKey, ResolvedStyle>;

/// Errors that abort an atlas build.
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("atlas canvas is unavailable")]
    CanvasUnavailable,

    #[error("cannot allocate a {width}x{height} atlas canvas")]
    InvalidSize { width: u32, height: u32 },

    #[error("failed to encode atlas: {0}")]
    Encode(String),
}

/// Position of one style inside the atlas.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasEntry {
    cache_key: CacheKey,
    size: Size,
    top_left: Point,
    region: TextureRegion,
}

impl AtlasEntry {
    pub fn cache_key(&self) -> &CacheKey {
        &self.cache_key
    }

    /// Bitmap size in pixels.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Top-left corner in pixels.
    pub fn top_left(&self) -> Point {
        self.top_left
    }

    /// Position and size normalised to the atlas dimensions.
    pub fn region(&self) -> TextureRegion {
        self.region
    }
}

/// A packed atlas image and its lookup table.
#[derive(Debug, Clone)]
pub struct TextureAtlas {
    png: Vec<u8>,
    size: Size,
    entries: Vec<AtlasEntry>,
}

impl TextureAtlas {
    /// Atlas dimensions in pixels.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Entries in packing order, the reserved default first.
    pub fn entries(&self) -> &[AtlasEntry] {
        &self.entries
    }

    pub fn entry(&self, key: &CacheKey) -> Option<&AtlasEntry> {
        self.entries.iter().find(|entry| &entry.cache_key == key)
    }

    /// The entry of the reserved default style.
    pub fn default_entry(&self) -> Option<&AtlasEntry> {
        self.entries
            .iter()
            .find(|entry| entry.cache_key.is_default_icon())
    }

    /// Entry for `key`, or the default entry when `key` is not packed.
    pub fn entry_or_default(&self, key: &CacheKey) -> Option<&AtlasEntry> {
        self.entry(key).or_else(|| self.default_entry())
    }

    /// The encoded PNG image.
    pub fn png(&self) -> &[u8] {
        &self.png
    }

    /// The PNG image as a `data:` URI.
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }

    /// Normalised `[x, y]` offset of every entry, keyed by cache key.
    ///
    /// The expression is a renderer host `match` over the feature's
    /// cache key property, ending with the default entry's value as the
    /// fallback branch.
    ///
    /// # Examples
    ///
    /// ```text
    /// ["match", ["get", "symbolCacheKey"], "default_icon", [0.1, 0.05], ..., [0.1, 0.05]]
    /// ```
    pub fn offset_expression(&self) -> Value {
        self.match_expression(|entry| entry.region.offset())
    }

    /// Normalised `[width, height]` of every entry, keyed by cache key.
    pub fn size_expression(&self) -> Value {
        self.match_expression(|entry| entry.region.extent())
    }

    /// Pixel `[x, y]` offset of every entry, keyed by cache key.
    pub fn pixel_offset_expression(&self) -> Value {
        self.match_expression(|entry| [entry.top_left.x(), entry.top_left.y()])
    }

    /// Pixel `[width, height]` of every entry, keyed by cache key.
    pub fn pixel_size_expression(&self) -> Value {
        self.match_expression(|entry| [entry.size.width(), entry.size.height()])
    }

    fn match_expression<T: Serialize>(&self, value: impl Fn(&AtlasEntry) -> T) -> Value {
        let mut expression = vec![json!("match"), json!(["get", SYMBOL_CACHE_KEY_PROPERTY])];
        for entry in &self.entries {
            expression.push(json!(entry.cache_key.as_str()));
            expression.push(json!(value(entry)));
        }
        if let Some(default) = self.default_entry() {
            expression.push(json!(value(default)));
        }
        Value::Array(expression)
    }
}

/// Builds texture atlases from style maps.
pub struct AtlasBuilder<'a, D> {
    rasterizer: IconRasterizer<'a>,
    decoder: &'a D,
    padding: u32,
}

impl<'a, D: BitmapDecoder> AtlasBuilder<'a, D> {
    pub fn new(rasterizer: IconRasterizer<'a>, decoder: &'a D, config: &AtlasConfig) -> Self {
        Self {
            rasterizer,
            decoder,
            padding: config.padding(),
        }
    }

    /// Builds an atlas holding every style of `styles` plus the default.
    ///
    /// # Errors
    ///
    /// Returns an [`AtlasError`] only if the canvas cannot be used. Failing
    /// entries are substituted and never fail the build.
    pub async fn build(
        &self,
        canvas: &mut AtlasCanvas,
        styles: &StyleMap,
    ) -> Result<TextureAtlas, AtlasError> {
        if !canvas.is_available() {
            return Err(AtlasError::CanvasUnavailable);
        }
        info!(styles_count = styles.len(); "Building texture atlas");

        let items = with_default(styles);
        let bitmaps = self.decode_all(&items).await?;
        debug!(bitmaps_count = bitmaps.len(); "Bitmaps decoded");

        self.pack(canvas, bitmaps)
    }

    /// Phase 1: rasterize and decode every style concurrently.
    async fn decode_all(
        &self,
        items: &[(CacheKey, Cow<'_, ResolvedStyle>)],
    ) -> Result<Vec<(CacheKey, Bitmap)>, AtlasError> {
        let results = join_all(items.iter().map(|(key, style)| self.decode_style(key, style))).await;

        let mut results = items.iter().map(|(key, _)| key.clone()).zip(results);
        let default_bitmap = match results.next() {
            Some((_, Some(bitmap))) => bitmap,
            _ => {
                warn!("Default icon failed to decode, using a blank bitmap");
                let size = self.rasterizer.render_fallback(&ResolvedStyle::default()).size();
                Bitmap::blank(size).map_err(|_| AtlasError::InvalidSize {
                    width: size.width(),
                    height: size.height(),
                })?
            }
        };

        let mut bitmaps = vec![(CacheKey::default_icon(), default_bitmap.clone())];
        for (key, result) in results {
            let bitmap = result.unwrap_or_else(|| default_bitmap.clone());
            bitmaps.push((key, bitmap));
        }
        Ok(bitmaps)
    }

    /// Rasterizes and decodes one style; `None` if decoding failed.
    async fn decode_style(&self, key: &CacheKey, style: &ResolvedStyle) -> Option<Bitmap> {
        let image = match self.rasterizer.render(style) {
            Ok(image) => image,
            Err(err) => {
                warn!(cache_key = key.as_str(), err:%; "Drawing fallback icon");
                self.rasterizer.render_fallback(style)
            }
        };

        match self.decoder.decode(&image).await {
            Ok(bitmap) => Some(bitmap),
            Err(err) => {
                warn!(cache_key = key.as_str(), err:%; "Bitmap decode failed, substituting default");
                None
            }
        }
    }

    /// Phase 2: lay out and draw every bitmap.
    fn pack(
        &self,
        canvas: &mut AtlasCanvas,
        bitmaps: Vec<(CacheKey, Bitmap)>,
    ) -> Result<TextureAtlas, AtlasError> {
        let sizes: Vec<Size> = bitmaps.iter().map(|(_, bitmap)| bitmap.size()).collect();
        let (atlas_size, positions) = pack_column(&sizes, self.padding);

        let mut frame = canvas.acquire(atlas_size)?;
        let mut entries = Vec::with_capacity(bitmaps.len());
        for ((cache_key, bitmap), top_left) in bitmaps.into_iter().zip(positions) {
            frame.draw(&bitmap, top_left);
            entries.push(AtlasEntry {
                region: TextureRegion::normalize(top_left, bitmap.size(), atlas_size),
                size: bitmap.size(),
                top_left,
                cache_key,
            });
        }
        let png = frame.encode_png()?;

        info!(
            width = atlas_size.width(),
            height = atlas_size.height(),
            entries_count = entries.len();
            "Texture atlas built"
        );

        Ok(TextureAtlas {
            png,
            size: atlas_size,
            entries,
        })
    }
}

/// Returns the styles to pack: the reserved default first, then `styles` in
/// key order without the default.
fn with_default(styles: &StyleMap) -> Vec<(CacheKey, Cow<'_, ResolvedStyle>)> {
    let mut items = Vec::with_capacity(styles.len() + 1);
    items.push((
        CacheKey::default_icon(),
        Cow::Owned(ResolvedStyle::default()),
    ));
    items.extend(
        styles
            .iter()
            .filter(|(key, _)| !key.is_default_icon())
            .map(|(key, style)| (key.clone(), Cow::Borrowed(style))),
    );
    items
}
