//! Pixel export (`spec.md` §6): computes the raster size for an arbitrary
//! world-space rectangle and scale, then runs the same render pipeline used
//! for interactive painting with that temporary viewport.

use crate::functions::FunctionRegistry;

use super::{render_all, Canvas, RecursionDetected, Viewport};

/// Computes the raster dimensions `⌊(x_max-x_min)·scale⌋ ×
/// ⌊(y_max-y_min)·scale⌋` for an export of the given world rectangle.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "raster dimensions are floored and clamped to non-negative before the cast"
)]
pub fn raster_size(x_min: f64, x_max: f64, y_min: f64, y_max: f64, scale: f64) -> (u32, u32) {
    let width = ((x_max - x_min) * scale).floor().max(0.0);
    let height = ((y_max - y_min) * scale).floor().max(0.0);
    (width as u32, height as u32)
}

/// Renders `registry` into a raster covering world rectangle `[x_min,
/// x_max] x [y_min, y_max]` at `scale` pixels per world unit, writing into
/// `canvas` sized via [`raster_size`].
pub fn export_pixels(
    registry: &FunctionRegistry,
    canvas: &mut dyn Canvas,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    scale: f64,
) -> Option<RecursionDetected> {
    let (width, height) = raster_size(x_min, x_max, y_min, y_max, scale);
    let viewport = Viewport { width, height, scale, x_min, y_min };
    render_all(registry, canvas, &viewport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raster_size_floors_the_product() {
        assert_eq!(raster_size(0.0, 3.4, 0.0, 2.0, 10.0), (34, 20));
    }

    #[test]
    fn raster_size_clamps_negative_ranges_to_zero() {
        assert_eq!(raster_size(5.0, 0.0, 0.0, 2.0, 10.0), (0, 20));
    }
}
