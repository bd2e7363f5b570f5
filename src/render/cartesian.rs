//! Cartesian line-scan renderer, grounded on `CartesianFunction::paint` in
//! the original plotter: scan pixel columns (XToY) or rows (YToX), binding
//! the independent variable once and mutating its cell between samples.

use crate::functions::CartesianSubtype;
use crate::parser::Parser;

use super::{Canvas, DomainClip, Style, Viewport};

/// Segments whose endpoint pixel coordinate exceeds this magnitude are
/// dropped rather than drawn, per `spec.md` §4.4.
const PIXEL_CLIP: f64 = 32_000.0;

pub(super) fn paint(
    subtype: CartesianSubtype,
    formula: &Parser,
    clip: DomainClip,
    style: Style,
    canvas: &mut dyn Canvas,
    viewport: &Viewport,
) {
    match subtype {
        CartesianSubtype::XToY => paint_x_to_y(formula, clip, style, canvas, viewport),
        CartesianSubtype::YToX => paint_y_to_x(formula, clip, style, canvas, viewport),
    }
}

fn paint_x_to_y(formula: &Parser, clip: DomainClip, style: Style, canvas: &mut dyn Canvas, viewport: &Viewport) {
    if !formula.bind_variable("x", 0.0) {
        return;
    }
    let Some(cell) = formula.cell("x") else {
        formula.unbind_variable("x");
        return;
    };

    let mut last: Option<(f64, f64)> = None;
    for px in 0..viewport.width {
        let x = viewport.world_x(f64::from(px));
        if clip.excludes(x) {
            last = None;
            continue;
        }
        cell.set(x);
        let result = formula.value();
        if !result.all_ok() {
            last = None;
            continue;
        }
        let py = viewport.py(result.value);
        if py.abs() > PIXEL_CLIP {
            last = None;
            continue;
        }
        let point = (f64::from(px), py);
        if let Some(prev) = last {
            canvas.draw_line(prev.0, prev.1, point.0, point.1, style.color, style.width);
        }
        last = Some(point);
    }
    formula.unbind_variable("x");
}

fn paint_y_to_x(formula: &Parser, clip: DomainClip, style: Style, canvas: &mut dyn Canvas, viewport: &Viewport) {
    if !formula.bind_variable("y", 0.0) {
        return;
    }
    let Some(cell) = formula.cell("y") else {
        formula.unbind_variable("y");
        return;
    };

    let mut last: Option<(f64, f64)> = None;
    for py in 0..viewport.height {
        let y = viewport.world_y(f64::from(py));
        if clip.excludes(y) {
            last = None;
            continue;
        }
        cell.set(y);
        let result = formula.value();
        if !result.all_ok() {
            last = None;
            continue;
        }
        let px = viewport.px(result.value);
        if px.abs() > PIXEL_CLIP {
            last = None;
            continue;
        }
        let point = (px, f64::from(py));
        if let Some(prev) = last {
            canvas.draw_line(prev.0, prev.1, point.0, point.1, style.color, style.width);
        }
        last = Some(point);
    }
    formula.unbind_variable("y");
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use crate::core::ParserContext;
    use crate::functions::{Bound, Color};

    use super::*;

    struct RecordingCanvas {
        lines: RefCell<Vec<(f64, f64, f64, f64)>>,
    }

    impl Canvas for RecordingCanvas {
        fn draw_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, _color: Color, _width: f32) {
            self.lines.borrow_mut().push((x0, y0, x1, y1));
        }

        fn draw_point(&mut self, _x: f64, _y: f64, _color: Color, _width: f32) {}
    }

    #[test]
    fn x_to_y_draws_a_straight_line_for_identity() {
        let ctx = ParserContext::new();
        let mut formula = Parser::new(ctx);
        formula.set_expression("x").expect("parse ok");
        let clip = DomainClip { min: Bound::default(), max: Bound::default() };
        let style = Style { color: Color::rgb(0, 0, 0), width: 1.0 };
        let viewport = Viewport { width: 4, height: 4, scale: 1.0, x_min: 0.0, y_min: 0.0 };
        let mut canvas = RecordingCanvas { lines: RefCell::new(Vec::new()) };
        paint_x_to_y(&formula, clip, style, &mut canvas, &viewport);
        assert!(!canvas.lines.borrow().is_empty());
        assert!(!formula.is_bound("x"));
    }

    #[test]
    fn domain_clip_skips_excluded_columns() {
        let ctx = ParserContext::new();
        let mut formula = Parser::new(ctx);
        formula.set_expression("x").expect("parse ok");
        let clip = DomainClip { min: Bound::at(10.0), max: Bound::default() };
        let style = Style { color: Color::rgb(0, 0, 0), width: 1.0 };
        let viewport = Viewport { width: 4, height: 4, scale: 1.0, x_min: 0.0, y_min: 0.0 };
        let mut canvas = RecordingCanvas { lines: RefCell::new(Vec::new()) };
        paint_x_to_y(&formula, clip, style, &mut canvas, &viewport);
        assert!(canvas.lines.borrow().is_empty());
    }
}
