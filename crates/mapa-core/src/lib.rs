//! Mapa Core Types and Style Resolution
//!
//! This crate provides the foundational types for Mapa point symbology and
//! the pure logic that turns stored configuration into a final style. It
//! includes:
//!
//! - **Colors**: CSS colour parsing with canonical hex output ([`color::Color`])
//! - **Styles**: Partial and resolved symbol styles and their cache keys ([`style`] module)
//! - **Schemas**: Field definitions and symbol presets ([`schema`] module)
//! - **Features**: Point features and their stored field values ([`feature`] module)
//! - **Resolution**: The symbol style cascade ([`resolve::resolve_style`])
//! - **Geometry**: Pixel-space packing primitives ([`geometry`] module)

pub mod color;
pub mod feature;
pub mod geometry;
pub mod resolve;
pub mod schema;
pub mod style;
