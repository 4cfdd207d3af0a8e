//! The escape-time kernel and its color lookup table.
//!
//! Everything here is pure and allocation-free, so the same inputs give
//! bit-identical pixels on every worker.

/// Iteration cap; points that survive this many steps are treated as inside the set.
pub const MAX_ITERATIONS: u32 = 100;

/// Number of entries in the color table.
pub const COLOR_TABLE_SIZE: usize = 512;

/// `|z|²` above which an orbit has escaped (bailout radius 2).
const BAILOUT_SQ: f64 = 2.0 * 2.0;

/// Converts an escape time in `0..=MAX_ITERATIONS` to a table index.
const COLOR_FACTOR: f64 = (COLOR_TABLE_SIZE - 1) as f64 / MAX_ITERATIONS as f64;

/// Pack an opaque color as `0xAARRGGBB`.
#[inline]
pub const fn rgb(red: u8, green: u8, blue: u8) -> u32 {
    0xFF00_0000 | (red as u32) << 16 | (green as u32) << 8 | blue as u32
}

/// A black → red → yellow ramp.
///
/// Entries `0..256` raise red from 0 to 255; entries `256..512` keep red at
/// 255 and raise green from 0 to 255.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    colors: [u32; COLOR_TABLE_SIZE],
}

/// The shared table, built at compile time.
pub static COLOR_TABLE: ColorTable = ColorTable::build();

impl ColorTable {
    const fn build() -> Self {
        let mut colors = [0u32; COLOR_TABLE_SIZE];
        let mut i = 0;
        while i < 256 {
            colors[i] = rgb(i as u8, 0, 0);
            colors[256 + i] = rgb(255, i as u8, 0);
            i += 1;
        }
        Self { colors }
    }

    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    /// Color for an iteration count returned by [`escape_iterations`].
    ///
    /// Points that escape quickly land at the bright end of the table; points
    /// inside the set get entry 0.
    #[inline]
    pub fn color_for(&self, iterations: u32) -> u32 {
        let escape_time = MAX_ITERATIONS.saturating_sub(iterations);
        let index = (escape_time as f64 * COLOR_FACTOR).floor() as usize;
        self.colors[index.min(COLOR_TABLE_SIZE - 1)]
    }
}

/// Number of iterations of `z ← z² + c` before `(x0, y0)` leaves the bailout
/// radius, starting from `z = c`.  Returns [`MAX_ITERATIONS`] for points that
/// never escape.
#[inline]
pub fn escape_iterations(x0: f64, y0: f64) -> u32 {
    let mut x = x0;
    let mut y = y0;
    let mut iteration = 0;

    while x * x + y * y <= BAILOUT_SQ && iteration < MAX_ITERATIONS {
        let next_x = x * x - y * y + x0;
        y = 2.0 * x * y + y0;
        x = next_x;
        iteration += 1;
    }

    iteration
}

/// Kernel and color lookup in one step.
#[inline]
pub fn pixel_color(x0: f64, y0: f64) -> u32 {
    COLOR_TABLE.color_for(escape_iterations(x0, y0))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `[red, green, blue]` of a packed pixel.
    fn channels(pixel: u32) -> [u8; 3] {
        [(pixel >> 16) as u8, (pixel >> 8) as u8, pixel as u8]
    }

    #[test]
    fn origin_never_escapes() {
        assert_eq!(escape_iterations(0.0, 0.0), MAX_ITERATIONS);
    }

    #[test]
    fn far_point_escapes_immediately() {
        assert!(escape_iterations(2.0, 2.0) <= 1);
        assert_eq!(escape_iterations(2.0, 2.0), 0);
    }

    #[test]
    fn known_escape_count() {
        // z = 1 → 2 → 5: |2|² = 4 is still inside, |5|² = 25 is not.
        assert_eq!(escape_iterations(1.0, 0.0), 2);
    }

    #[test]
    fn minus_one_is_periodic() {
        // Orbit -1 → 0 → -1 … never escapes.
        assert_eq!(escape_iterations(-1.0, 0.0), MAX_ITERATIONS);
    }

    #[test]
    fn table_layout() {
        let colors = COLOR_TABLE.colors();
        assert_eq!(colors.len(), 512);
        assert_eq!(channels(colors[0]), [0, 0, 0]);
        assert_eq!(channels(colors[255]), [255, 0, 0]);
        assert_eq!(channels(colors[256]), [255, 0, 0]);
        assert_eq!(channels(colors[511]), [255, 255, 0]);
        assert!(colors.iter().all(|c| c >> 24 == 0xFF));
    }

    #[test]
    fn interior_points_are_black() {
        assert_eq!(COLOR_TABLE.color_for(MAX_ITERATIONS), rgb(0, 0, 0));
        assert_eq!(pixel_color(0.0, 0.0), rgb(0, 0, 0));
    }

    #[test]
    fn instant_escape_is_yellow() {
        assert_eq!(COLOR_TABLE.color_for(0), rgb(255, 255, 0));
        assert_eq!(pixel_color(2.0, 2.0), rgb(255, 255, 0));
    }

    #[test]
    fn color_index_scales_escape_time() {
        // c = 1: two iterations → escape time 98 → floor(98 × 5.11) = 500.
        assert_eq!(pixel_color(1.0, 0.0), COLOR_TABLE.colors()[500]);
    }

    #[test]
    fn deterministic_results() {
        let points = [(0.0, 0.0), (-0.75, 0.1), (0.3, 0.5), (-2.0, 0.0), (1.0, 1.0)];
        let run1: Vec<_> = points.iter().map(|&(x, y)| pixel_color(x, y)).collect();
        let run2: Vec<_> = points.iter().map(|&(x, y)| pixel_color(x, y)).collect();
        assert_eq!(run1, run2, "kernel results must be deterministic");
    }
}
