//! Error types for Mapa operations.
//!
//! This module provides the main error type [`MapaError`] which wraps the
//! error conditions that can surface from the symbology pipeline. Failures of
//! individual features or atlas entries are recovered where they happen and
//! never reach this type.

use std::io;

use thiserror::Error;

use mapa_core::schema::SchemaError;

use crate::{atlas::AtlasError, catalogue::CatalogueError};

/// The main error type for Mapa operations.
#[derive(Debug, Error)]
pub enum MapaError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Icon catalogue error: {0}")]
    Catalogue(#[from] CatalogueError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Atlas error: {0}")]
    Atlas(#[from] AtlasError),

    #[error("Configuration error: {0}")]
    Config(String),
}
