//! Geometric primitives for atlas packing.
//!
//! This module provides the pixel-space types the texture atlas is laid out
//! with, and the normalised rectangle the renderer host samples the atlas by.
//!
//! # Overview
//!
//! - [`Point`] - A pixel position on the atlas canvas
//! - [`Size`] - Pixel width and height of a bitmap or canvas
//! - [`TextureRegion`] - A rectangle in normalised `[0, 1]` texture space
//! - [`pack_column`] - One-column, top-to-bottom packing
//!
//! # Coordinate System
//!
//! The atlas canvas uses the usual raster coordinate system:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Texture regions use the same orientation, scaled so that the full canvas
//! spans `0.0..=1.0` on both axes.

use serde::Serialize;

/// A pixel position on the atlas canvas.
///
/// # Examples
///
/// ```
/// # use mapa_core::geometry::Point;
/// let p = Point::new(10, 20);
/// assert_eq!(p.x(), 10);
/// assert_eq!(p.y(), 20);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    x: u32,
    y: u32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> u32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> u32 {
        self.y
    }
}

/// Pixel dimensions of a bitmap or canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Size {
    width: u32,
    height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> u32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> u32 {
        self.height
    }

    /// Returns true if either dimension is zero
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Merges two sizes vertically by adding their heights and taking the maximum width
    pub fn merge_vertical(self, other: Size) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.saturating_add(other.height),
        }
    }
}

/// A rectangle in normalised texture space.
///
/// All four values are fractions of the canvas dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TextureRegion {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl TextureRegion {
    /// Normalises a pixel rectangle against the canvas it lives on.
    ///
    /// An empty canvas yields the empty region at the origin.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mapa_core::geometry::{Point, Size, TextureRegion};
    /// let region = TextureRegion::normalize(Point::new(10, 50), Size::new(20, 25), Size::new(40, 100));
    /// assert_eq!(region.x(), 0.25);
    /// assert_eq!(region.y(), 0.5);
    /// assert_eq!(region.width(), 0.5);
    /// assert_eq!(region.height(), 0.25);
    /// ```
    pub fn normalize(top_left: Point, size: Size, canvas: Size) -> Self {
        if canvas.is_empty() {
            return Self::default();
        }
        let canvas_width = canvas.width as f32;
        let canvas_height = canvas.height as f32;
        Self {
            x: top_left.x as f32 / canvas_width,
            y: top_left.y as f32 / canvas_height,
            width: size.width as f32 / canvas_width,
            height: size.height as f32 / canvas_height,
        }
    }

    pub fn x(self) -> f32 {
        self.x
    }

    pub fn y(self) -> f32 {
        self.y
    }

    pub fn width(self) -> f32 {
        self.width
    }

    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns the top-left corner as `[x, y]`.
    pub fn offset(self) -> [f32; 2] {
        [self.x, self.y]
    }

    /// Returns the extent as `[width, height]`.
    pub fn extent(self) -> [f32; 2] {
        [self.width, self.height]
    }
}

/// Lays out bitmaps in a single column, top to bottom.
///
/// Every bitmap is placed at `x = padding`. The first starts at
/// `y = padding` and each following one starts `padding` pixels below the
/// previous one. The canvas is `padding + max(width) + padding` wide and
/// `padding + Σ(height + padding)` tall.
///
/// Returns the canvas size and one top-left position per input, in input
/// order.
///
/// # Examples
///
/// ```
/// # use mapa_core::geometry::{pack_column, Point, Size};
/// let (canvas, positions) = pack_column(&[Size::new(40, 30), Size::new(20, 10)], 10);
///
/// assert_eq!(canvas, Size::new(60, 70));
/// assert_eq!(positions, vec![Point::new(10, 10), Point::new(10, 50)]);
/// ```
pub fn pack_column(sizes: &[Size], padding: u32) -> (Size, Vec<Point>) {
    let mut positions = Vec::with_capacity(sizes.len());
    // Every slot owns the padding below it
    let mut content = Size::default();

    for size in sizes {
        positions.push(Point::new(padding, padding.saturating_add(content.height)));
        content = content.merge_vertical(Size::new(
            size.width,
            size.height.saturating_add(padding),
        ));
    }

    let canvas = Size::new(
        padding.saturating_mul(2).saturating_add(content.width),
        padding.saturating_add(content.height),
    );
    (canvas, positions)
}
