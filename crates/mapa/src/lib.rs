//! Mapa - Point symbology for GPU map layers.
//!
//! Style resolution, icon rasterization and sprite-atlas packing for point
//! features. Features are projected into a GeoJSON collection tagged with a
//! cache key per distinct style; each distinct style is drawn once into a
//! texture atlas that the renderer host samples from.
//!
//! # Overview
//!
//! - [`projector`] - Feature projection and style deduplication.
//! - [`raster`] - Icon rasterization into vector images.
//! - [`atlas`] - Texture atlas building and lookup expressions.
//! - [`session`] - Rebuild tracking across overlapping atlas builds.
//! - [`layer`] - The layer description handed to the renderer host.

pub mod atlas;
pub mod canvas;
pub mod catalogue;
pub mod config;
pub mod decode;
pub mod layer;
pub mod projector;
pub mod raster;
pub mod session;

mod error;

pub use mapa_core::{color, feature, geometry, resolve, schema, style};

pub use error::MapaError;

use log::{debug, info};

use atlas::{AtlasBuilder, AtlasError, StyleMap, TextureAtlas};
use canvas::AtlasCanvas;
use catalogue::IconCatalogue;
use config::AppConfig;
use decode::{BitmapDecoder, ResvgDecoder};
use feature::Feature;
use layer::PointLayer;
use projector::Projection;
use raster::IconRasterizer;
use schema::Schema;
use style::SymbolStyle;

/// Front door for running the symbology pipeline.
///
/// A renderer holds the configuration, the icon catalogue and the bitmap
/// decoder. Callers project features, build an atlas for the resulting
/// styles, and combine both into a [`PointLayer`].
///
/// # Examples
///
/// ```rust,no_run
/// use futures::executor::block_on;
/// use mapa::{
///     SymbologyRenderer, canvas::AtlasCanvas, catalogue::MemoryCatalogue,
///     config::AppConfig, feature::{Coordinate, Feature},
/// };
///
/// let renderer = SymbologyRenderer::new(AppConfig::default(), MemoryCatalogue::new());
/// let features = [Feature::new(1, Coordinate::new(151.2, -33.8))];
///
/// let projection = renderer.project(&features, None, &[]);
/// let mut canvas = AtlasCanvas::new();
/// let atlas = block_on(renderer.build_atlas(&mut canvas, projection.styles()))
///     .expect("Failed to build atlas");
///
/// let layer = renderer
///     .layer(&projection, Some(&atlas))
///     .expect("Failed to describe layer");
/// ```
pub struct SymbologyRenderer<C, D = ResvgDecoder> {
    config: AppConfig,
    catalogue: C,
    decoder: D,
}

impl<C: IconCatalogue> SymbologyRenderer<C> {
    /// Create a renderer decoding bitmaps with `resvg`.
    pub fn new(config: AppConfig, catalogue: C) -> Self {
        Self::with_decoder(config, catalogue, ResvgDecoder::new())
    }
}

impl<C: IconCatalogue, D: BitmapDecoder> SymbologyRenderer<C, D> {
    /// Create a renderer with a host-provided bitmap decoder.
    pub fn with_decoder(config: AppConfig, catalogue: C, decoder: D) -> Self {
        Self {
            config,
            catalogue,
            decoder,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn catalogue(&self) -> &C {
        &self.catalogue
    }

    /// Rasterizer over this renderer's catalogue and icon settings.
    pub fn rasterizer(&self) -> IconRasterizer<'_> {
        IconRasterizer::new(&self.catalogue, self.config.icon(), self.config.atlas())
    }

    /// Project `features` and collect their distinct styles.
    ///
    /// See [`projector::project`].
    pub fn project(
        &self,
        features: &[Feature],
        map_default: Option<&SymbolStyle>,
        schemas: &[Schema],
    ) -> Projection {
        info!(features_count = features.len(), schemas_count = schemas.len(); "Projecting features");
        projector::project(features, map_default, schemas)
    }

    /// Build a texture atlas for `styles` on `canvas`.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError`] if the canvas is unavailable. No other failure
    /// aborts a build.
    pub async fn build_atlas(
        &self,
        canvas: &mut AtlasCanvas,
        styles: &StyleMap,
    ) -> Result<TextureAtlas, AtlasError> {
        let builder = AtlasBuilder::new(self.rasterizer(), &self.decoder, self.config.atlas());
        builder.build(canvas, styles).await
    }

    /// Describe the layer the renderer host should draw.
    ///
    /// Without an atlas the layer falls back to plain circles.
    ///
    /// # Errors
    ///
    /// Returns [`MapaError::Config`] if the configured circle colours are
    /// invalid.
    pub fn layer(
        &self,
        projection: &Projection,
        atlas: Option<&TextureAtlas>,
    ) -> Result<PointLayer, MapaError> {
        debug!(has_atlas = atlas.is_some(); "Describing point layer");
        PointLayer::new(
            projection.collection().clone(),
            atlas,
            self.config.atlas(),
            self.config.layer(),
        )
    }
}
