//! C7: adaptive axis-unit selection and grid/label layout, grounded on
//! `PlotArea::updateAxisUnit`/`paint` in the original plotter.
//!
//! Text measurement is the one host-specific capability this module needs
//! — the actual font metrics live outside this crate — so it is abstracted
//! behind [`LabelMetrics`], the same way rendering is abstracted behind
//! [`crate::render::Canvas`].

use crate::core::format::format_number;
use crate::core::NumberFormat;

/// Minimum axis unit accepted by a manual override, per the original's
/// `MIN_UNIT`.
pub const MIN_UNIT: f64 = 1e-12;

/// Minimum pixel scale the axis layout operates at, per the original's
/// `MIN_SCALE`.
pub const MIN_SCALE: f64 = 1e-6;

/// `(multiplier, next state)` for each of the four states the decade-ladder
/// cycles through: ×2, ×(2.5/2), ×(5/2.5), ×(10/5) — equivalently ÷ the
/// same factors when narrowing.
const LADDER: [(f64, usize); 4] = [(2.0, 1), (1.25, 2), (2.0, 3), (2.0, 0)];

/// Measures the rendered pixel width of a number label — the only
/// host-specific capability the axis-unit search needs.
pub trait LabelMetrics {
    /// Pixel width `text` would occupy if drawn with the active font.
    fn label_width(&self, text: &str) -> f64;
}

/// Where an axis's tick labels should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPlacement {
    /// The axis line itself is inside the viewport: draw labels next to it.
    AdjacentToAxis,
    /// The axis line is off-screen: draw labels along the viewport border.
    ViewportBorder,
}

/// Searches for an axis unit `u` such that consecutive tick labels neither
/// collide nor sit absurdly far apart, per `spec.md` §4.5.
///
/// `extent_px` is the viewport's pixel extent along this axis, `scale` the
/// pixels-per-world-unit factor, and `center` the world coordinate at the
/// viewport's center along this axis.
#[must_use]
pub fn axis_unit(extent_px: u32, scale: f64, center: f64, metrics: &dyn LabelMetrics) -> f64 {
    let scale = scale.max(MIN_SCALE);
    let mut unit = 10_f64.powf((-(scale * 0.5).log10()).ceil() + 1.0);

    let half_width = f64::from(extent_px) / scale * 0.5;
    let min = center - half_width;
    let max = center + half_width;

    let mut ndiv = 0_usize;
    let mut prev_action = 0_u8;
    loop {
        let test_x = (min.abs().max(max.abs()).floor() / unit).floor() * unit;
        let w1 = metrics.label_width(&format_number(test_x, NumberFormat::Auto, 6));
        let w2 = metrics.label_width(&format_number(test_x + unit, NumberFormat::Auto, 6));
        let gap = unit * scale - 0.25 * (w1 + w2);

        if gap < 15.0 && prev_action != 2 {
            prev_action = 1;
            let (mult, next) = LADDER[ndiv];
            unit *= mult;
            ndiv = next;
        } else if gap > 5.0 * ((w1 + w2) / 2.0) && prev_action != 1 {
            prev_action = 2;
            let (mult, next) = LADDER[ndiv];
            unit /= mult;
            ndiv = next;
        } else {
            break;
        }
    }
    unit
}

/// Like [`axis_unit`], but honors a manual override when `manual` is at
/// least [`MIN_UNIT`]; an override below that is rejected and the automatic
/// search runs instead.
#[must_use]
pub fn resolve_axis_unit(
    extent_px: u32,
    scale: f64,
    center: f64,
    metrics: &dyn LabelMetrics,
    manual: Option<f64>,
) -> f64 {
    match manual {
        Some(unit) if unit >= MIN_UNIT => unit,
        _ => axis_unit(extent_px, scale, center, metrics),
    }
}

/// World-space positions of grid lines along one axis, starting at
/// `⌊min/u⌋·u` and stepping by `u` up to `max`, per `spec.md` §4.5.
#[must_use]
pub fn grid_lines(unit: f64, min: f64, max: f64) -> Vec<f64> {
    if unit <= 0.0 || !unit.is_finite() || min >= max {
        return Vec::new();
    }
    let mut lines = Vec::new();
    let mut value = (min / unit).floor() * unit;
    while value <= max {
        lines.push(value);
        value += unit;
    }
    lines
}

/// Decides where to draw an axis's tick labels: next to the axis line
/// itself if it falls inside the viewport, or along the viewport border
/// otherwise.
#[must_use]
pub fn label_placement(axis_pixel: f64, extent_px: u32) -> LabelPlacement {
    if axis_pixel >= 0.0 && axis_pixel <= f64::from(extent_px) {
        LabelPlacement::AdjacentToAxis
    } else {
        LabelPlacement::ViewportBorder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedWidth(f64);

    impl LabelMetrics for FixedWidth {
        fn label_width(&self, text: &str) -> f64 {
            let len = u32::try_from(text.len()).unwrap_or(u32::MAX);
            self.0 * f64::from(len)
        }
    }

    #[test]
    fn axis_unit_search_terminates_across_a_wide_scale_range() {
        let metrics = FixedWidth(6.0);
        for scale in [1e-6, 1e-3, 1.0, 100.0, 1e6, 1e9] {
            let unit = axis_unit(800, scale, 0.0, &metrics);
            assert!(unit.is_finite() && unit > 0.0, "scale {scale} produced {unit}");
        }
    }

    #[test]
    fn manual_override_below_min_unit_falls_back_to_search() {
        let metrics = FixedWidth(6.0);
        let auto = axis_unit(800, 100.0, 0.0, &metrics);
        let resolved = resolve_axis_unit(800, 100.0, 0.0, &metrics, Some(1e-20));
        assert!((resolved - auto).abs() < 1e-12);
    }

    #[test]
    fn manual_override_above_min_unit_is_honored() {
        let metrics = FixedWidth(6.0);
        let resolved = resolve_axis_unit(800, 100.0, 0.0, &metrics, Some(5.0));
        assert!((resolved - 5.0).abs() < 1e-12);
    }

    #[test]
    fn grid_lines_start_at_the_floor_multiple_and_cover_the_range() {
        let lines = grid_lines(2.0, -3.0, 3.0);
        assert_eq!(lines.first().copied(), Some(-4.0));
        assert!(lines.last().copied().unwrap_or(f64::NEG_INFINITY) >= 3.0);
    }

    #[test]
    fn label_placement_switches_at_the_viewport_edges() {
        assert_eq!(label_placement(50.0, 100), LabelPlacement::AdjacentToAxis);
        assert_eq!(label_placement(-1.0, 100), LabelPlacement::ViewportBorder);
        assert_eq!(label_placement(150.0, 100), LabelPlacement::ViewportBorder);
    }
}
