use mandelfarm_core::pixel_color;

use crate::request::{RenderRequest, Row};

/// Compute every row of a band.
///
/// Row `y` of the band samples the plane at `view.plane_y(y)` and is tagged
/// with the absolute index `first_row + y`.
pub fn render_band(request: &RenderRequest) -> Vec<Row> {
    (0..request.height)
        .map(|y| render_row(request, y))
        .collect()
}

fn render_row(request: &RenderRequest, y: u32) -> Row {
    let view = &request.view;
    let plane_y = view.plane_y(y);
    let pixels = (0..request.width)
        .map(|x| pixel_color(view.plane_x(x), plane_y))
        .collect();
    Row::new(request.first_row + y, pixels)
}
