//! Parametric polyline renderer: a single shared `t` cell drives both
//! component formulas, grounded on `ParametricFunction::paint` in the
//! original plotter.

use std::cell::Cell;
use std::rc::Rc;

use crate::parser::Parser;

use super::{Canvas, Style, Viewport};

/// The `t` sweep range and step of a Parametric entry, per `spec.md` §3.
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(missing_docs, reason = "crate-internal, fields read only from render::mod")]
pub(super) struct Sweep {
    pub(super) min: f64,
    pub(super) max: f64,
    pub(super) step: f64,
}

const PIXEL_CLIP: f64 = 32_000.0;

pub(super) fn paint(
    x_formula: &Parser,
    y_formula: &Parser,
    sweep: Sweep,
    style: Style,
    canvas: &mut dyn Canvas,
    viewport: &Viewport,
) {
    if sweep.min >= sweep.max || sweep.step <= 0.0 {
        return;
    }
    if x_formula.status().is_some() || y_formula.status().is_some() {
        return;
    }

    let t_cell = Rc::new(Cell::new(sweep.min));
    if !x_formula.bind_variable_cell("t", Rc::clone(&t_cell)) {
        return;
    }
    if !y_formula.bind_variable_cell("t", Rc::clone(&t_cell)) {
        x_formula.unbind_variable("t");
        return;
    }

    let mut last: Option<(f64, f64)> = None;
    let mut t = sweep.min;
    while t < sweep.max {
        t_cell.set(t);
        let x_result = x_formula.value();
        let y_result = y_formula.value();
        last = if x_result.all_ok() && y_result.all_ok() {
            let point = (viewport.px(x_result.value), viewport.py(y_result.value));
            if point.0.abs() <= PIXEL_CLIP && point.1.abs() <= PIXEL_CLIP {
                if let Some(prev) = last {
                    canvas.draw_line(prev.0, prev.1, point.0, point.1, style.color, style.width);
                }
                Some(point)
            } else {
                None
            }
        } else {
            None
        };
        t += sweep.step;
    }

    x_formula.unbind_variable("t");
    y_formula.unbind_variable("t");
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::f64::consts::TAU;

    use crate::core::ParserContext;
    use crate::functions::Color;

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
    fn unit_circle_draws_a_closed_polyline() {
        let ctx = ParserContext::new();
        let mut x_formula = Parser::new(ctx.clone());
        let mut y_formula = Parser::new(ctx);
        x_formula.set_expression("cos t").expect("parse ok");
        y_formula.set_expression("sin t").expect("parse ok");
        let sweep = Sweep { min: 0.0, max: TAU, step: 0.1 };
        let style = Style { color: Color::rgb(0, 0, 0), width: 1.0 };
        let viewport = Viewport { width: 100, height: 100, scale: 20.0, x_min: -2.5, y_min: -2.5 };
        let mut canvas = RecordingCanvas { lines: RefCell::new(Vec::new()) };
        paint(&x_formula, &y_formula, sweep, style, &mut canvas, &viewport);
        assert!(!canvas.lines.borrow().is_empty());
        assert!(!x_formula.is_bound("t"));
        assert!(!y_formula.is_bound("t"));
    }

    #[test]
    fn empty_range_draws_nothing() {
        let ctx = ParserContext::new();
        let mut x_formula = Parser::new(ctx.clone());
        let mut y_formula = Parser::new(ctx);
        x_formula.set_expression("t").expect("parse ok");
        y_formula.set_expression("t").expect("parse ok");
        let sweep = Sweep { min: 1.0, max: 0.0, step: 0.1 };
        let style = Style { color: Color::rgb(0, 0, 0), width: 1.0 };
        let viewport = Viewport { width: 10, height: 10, scale: 1.0, x_min: 0.0, y_min: 0.0 };
        let mut canvas = RecordingCanvas { lines: RefCell::new(Vec::new()) };
        paint(&x_formula, &y_formula, sweep, style, &mut canvas, &viewport);
        assert!(canvas.lines.borrow().is_empty());
    }
}
