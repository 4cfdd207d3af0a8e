use serde::{Deserialize, Serialize};

/// Top-left corner of the visible region, in plane coordinates.
///
/// `min_y` grows downward with the pixel rows, so row `y` of an image maps
/// to `min_y + y * scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneOrigin {
    pub min_x: f64,
    pub min_y: f64,
}

impl PlaneOrigin {
    /// Origin of the default view: the set spans roughly `[-2, 1] × [-1.5, 1.5]`.
    pub const INITIAL: Self = Self::new(-2.0, -1.5);

    pub const fn new(min_x: f64, min_y: f64) -> Self {
        Self { min_x, min_y }
    }

    /// Return a copy with a different `min_y`.
    pub const fn with_min_y(self, min_y: f64) -> Self {
        Self {
            min_x: self.min_x,
            min_y,
        }
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` if either dimension is zero.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The rectangle covering the whole image.
    pub const fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width, self.height)
    }
}

/// A rectangle in pixel space, e.g. a rubber-band selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn size(&self) -> PixelSize {
        PixelSize::new(self.width, self.height)
    }
}
