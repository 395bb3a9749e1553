//! Mapa CLI library
//!
//! This module contains the core CLI logic for the Mapa atlas tool: load a
//! scene and an icon library, run the symbology pipeline, and write the atlas
//! image and the layer description the renderer host consumes.

pub mod error_adapter;
pub mod scene;

mod args;
mod config;

pub use args::Args;
pub use error_adapter::ErrorAdapter;

use std::{fs, path::Path};

use futures::executor::block_on;
use log::{info, warn};

use mapa::{
    MapaError, SymbologyRenderer,
    canvas::AtlasCanvas,
    catalogue::MemoryCatalogue,
    session::{AtlasSession, AtlasUpdate},
};

use scene::Scene;

/// File name of the atlas image inside the output directory.
pub const ATLAS_FILE: &str = "atlas.png";

/// File name of the layer description inside the output directory.
pub const LAYER_FILE: &str = "layer.json";

/// Run the Mapa CLI application
///
/// This function projects the scene's features, builds the texture atlas for
/// their styles, and writes `atlas.png` and `layer.json` to the output
/// directory. When no atlas could be built only `layer.json` is written,
/// describing the circle fallback.
///
/// # Errors
///
/// Returns `MapaError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Invalid scene or icon library documents
pub fn run(args: &Args) -> Result<(), MapaError> {
    info!(
        input_path = args.input,
        output_dir = args.output_dir;
        "Processing scene"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let scene = Scene::load(&args.input)?;
    let catalogue = match &args.icons {
        Some(path) => MemoryCatalogue::from_reader(fs::File::open(path)?)?,
        None => {
            warn!("No icon library given, every feature uses the default icon");
            MemoryCatalogue::new()
        }
    };

    let renderer = SymbologyRenderer::new(app_config, catalogue);
    let projection = renderer.project(
        &scene.features,
        scene.map_default.as_ref(),
        &scene.schemas,
    );

    let mut session = AtlasSession::new();
    let mut canvas = AtlasCanvas::new();
    if let Some(request) = session.request(projection.styles()) {
        let result = block_on(renderer.build_atlas(&mut canvas, request.styles()));
        if session.complete(request.token(), result) == AtlasUpdate::Retained {
            warn!("No atlas available, falling back to circles");
        }
    }

    let output_dir = Path::new(&args.output_dir);
    fs::create_dir_all(output_dir)?;

    if let Some(atlas) = session.current() {
        fs::write(output_dir.join(ATLAS_FILE), atlas.png())?;
    }

    let layer = renderer.layer(&projection, session.current())?;
    fs::write(
        output_dir.join(LAYER_FILE),
        serde_json::to_string_pretty(&layer)?,
    )?;

    info!(output_dir = args.output_dir; "Layer exported successfully");

    Ok(())
}
