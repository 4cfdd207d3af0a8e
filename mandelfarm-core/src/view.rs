use serde::{Deserialize, Deserializer, Serialize};

use crate::coords::{PixelRect, PixelSize, PlaneOrigin};
use crate::error::CoreError;

/// Side length, in plane units, of the square shown by a fresh view.
pub const INITIAL_SIZE: f64 = 3.0;

/// Width and height in pixels that the initial scale was chosen for.
pub const INITIAL_IMAGE_SIZE: u32 = 500;

/// Defines the visible region of the complex plane.
///
/// `origin` is the top-left corner and `scale` is the number of plane units
/// each pixel spans.  Values are immutable; every "change" produces a new
/// state, which is what makes them safe to keep in the undo history and to
/// copy into row-band requests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewState {
    origin: PlaneOrigin,
    scale: f64,
}

/// Validates `scale` on deserialization so a config file cannot smuggle in
/// a zero or negative scale.
impl<'de> Deserialize<'de> for ViewState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            origin: PlaneOrigin,
            scale: f64,
        }
        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.origin, raw.scale).map_err(serde::de::Error::custom)
    }
}

impl ViewState {
    /// Create a view state with explicit parameters.
    pub fn new(origin: PlaneOrigin, scale: f64) -> crate::Result<Self> {
        if scale <= 0.0 || !scale.is_finite() {
            return Err(CoreError::InvalidScale(scale));
        }
        Ok(Self { origin, scale })
    }

    /// The view a session starts with: a 3×3 square at `(-2, -1.5)` sized
    /// for a 500×500 image.
    pub fn initial() -> Self {
        Self {
            origin: PlaneOrigin::INITIAL,
            scale: INITIAL_SIZE / INITIAL_IMAGE_SIZE as f64,
        }
    }

    pub fn origin(&self) -> PlaneOrigin {
        self.origin
    }

    /// Plane units per pixel.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Return a copy looking at a different origin.
    pub fn with_origin(self, origin: PlaneOrigin) -> Self {
        Self { origin, ..self }
    }

    /// Real coordinate of pixel column `column`.
    #[inline]
    pub fn plane_x(&self, column: u32) -> f64 {
        self.origin.min_x + column as f64 * self.scale
    }

    /// Imaginary coordinate of pixel row `row`.
    #[inline]
    pub fn plane_y(&self, row: u32) -> f64 {
        self.origin.min_y + row as f64 * self.scale
    }

    /// Zoom in on `selection` so that it fills an image of size `image`.
    ///
    /// The axis along which the selection is relatively larger decides the
    /// new scale, so the whole selection stays visible.  The selection is then
    /// centred along the other axis.
    pub fn zoom_to_selection(&self, image: PixelSize, selection: PixelRect) -> crate::Result<Self> {
        check_geometry(image, selection)?;

        let new_min_x = self.origin.min_x + selection.x as f64 * self.scale;
        let new_min_y = self.origin.min_y + selection.y as f64 * self.scale;
        let new_scale = if height_constrains(image, selection) {
            selection.height as f64 / image.height as f64 * self.scale
        } else {
            selection.width as f64 / image.width as f64 * self.scale
        };

        let origin = center_selection(image, selection, new_scale, new_min_x, new_min_y);
        Self::new(origin, new_scale)
    }

    /// A fresh view of the initial region, fitted to `image`.
    ///
    /// The 3×3 initial square is mapped onto the shorter image side and
    /// centred along the longer one.
    pub fn fit_to_image(image: PixelSize) -> crate::Result<Self> {
        if image.is_empty() {
            return Err(CoreError::InvalidGeometry {
                reason: format!("image must be non-empty, got {}×{}", image.width, image.height),
            });
        }
        let side = image.width.min(image.height);
        let scale = INITIAL_SIZE / side as f64;
        let square = PixelRect::new(0, 0, side, side);
        let initial = PlaneOrigin::INITIAL;
        let origin = center_selection(image, square, scale, initial.min_x, initial.min_y);
        Self::new(origin, scale)
    }
}

fn check_geometry(image: PixelSize, selection: PixelRect) -> crate::Result<()> {
    if image.is_empty() {
        return Err(CoreError::InvalidGeometry {
            reason: format!("image must be non-empty, got {}×{}", image.width, image.height),
        });
    }
    if selection.size().is_empty() {
        return Err(CoreError::InvalidGeometry {
            reason: format!(
                "selection must be non-empty, got {}×{}",
                selection.width, selection.height
            ),
        });
    }
    Ok(())
}

/// `true` when the selection is taller, relative to the image, than it is wide.
#[inline]
fn height_constrains(image: PixelSize, selection: PixelRect) -> bool {
    selection.height as f64 / image.height as f64 > selection.width as f64 / image.width as f64
}

/// Shift `(min_x, min_y)` by half the leftover margin on the unconstrained
/// axis, so the selection ends up in the middle of the new image.
fn center_selection(
    image: PixelSize,
    selection: PixelRect,
    scale: f64,
    min_x: f64,
    min_y: f64,
) -> PlaneOrigin {
    let (x1, x2) = (image.width as f64, selection.width as f64);
    let (y1, y2) = (image.height as f64, selection.height as f64);

    if height_constrains(image, selection) {
        // Width of the selection once zoomed.
        let x3 = y1 / y2 * x2;
        let pixels_left = (x1 - x3) / 2.0;
        PlaneOrigin::new(min_x - pixels_left * scale, min_y)
    } else {
        // Height of the selection once zoomed.
        let y3 = x1 / x2 * y2;
        let pixels_above = (y1 - y3) / 2.0;
        PlaneOrigin::new(min_x, min_y - pixels_above * scale)
    }
}
