//! Implicit root-tracking renderer — the key algorithm of `spec.md` §4.4,
//! grounded on `ImplicitFunction::paint` in the original plotter.
//!
//! For each pixel column, walks upward probing `f(x, y)`, plotting a point
//! wherever it resolves to within a tolerance band and Newton-stepping
//! toward the next root otherwise. A per-column watermark and per-block
//! iteration cap bound the work to `O(height / drawAccuracy · 5)` probes.

use crate::parser::Parser;

use super::{Canvas, Style, Viewport};

/// Newton iterations permitted inside one draw-accuracy block before the
/// column gives up on the current block and jumps ahead.
const MAX_ITERATIONS_PER_BLOCK: u32 = 5;

pub(super) fn paint(formula: &Parser, draw_accuracy: u32, style: Style, canvas: &mut dyn Canvas, viewport: &Viewport) {
    if formula.status().is_some() {
        return;
    }
    if !formula.bind_variable("x", 0.0) {
        return;
    }
    if !formula.bind_variable("y", 0.0) {
        formula.unbind_variable("x");
        return;
    }
    let (Some(x_cell), Some(y_cell)) = (formula.cell("x"), formula.cell("y")) else {
        formula.unbind_variable("y");
        formula.unbind_variable("x");
        return;
    };

    let threshold = 0.5 / viewport.scale;
    let block = f64::from(draw_accuracy.max(1));
    let height = f64::from(viewport.height);

    for px in 0..viewport.width {
        x_cell.set(viewport.world_x(f64::from(px)));

        let mut done_y: f64 = 0.0;
        let mut py: f64 = 0.0;
        let mut repeats: u32 = 0;

        while py < height {
            let y = viewport.world_y(py);
            y_cell.set(y);
            let first = formula.value();
            if !first.all_ok() {
                py += 1.0;
                continue;
            }

            if first.value.abs() <= threshold {
                canvas.draw_point(f64::from(px), py, style.color, style.width);
                done_y = py + 1.0;
                repeats = 0;
                py += block;
                continue;
            }

            y_cell.set(y + threshold);
            let second = formula.value();
            if !second.all_ok() {
                py += 1.0;
                continue;
            }

            let derivative = (second.value - first.value) / threshold;
            if derivative == 0.0 {
                py += block;
                repeats = 0;
                continue;
            }

            let world_y_new = y - first.value / derivative;
            let py_new = viewport.py(world_y_new);
            repeats += 1;

            let stepped_back_past_watermark = py_new < done_y;
            let stepped_back_too_far = (py - py_new) > block;
            let stepped_forward_too_far = (py_new - py) > block;
            let too_many_iterations = repeats > MAX_ITERATIONS_PER_BLOCK;

            if stepped_back_past_watermark || stepped_back_too_far || stepped_forward_too_far || too_many_iterations {
                py += block;
                repeats = 0;
                continue;
            }

            py = py_new;
        }
    }

    formula.unbind_variable("y");
    formula.unbind_variable("x");
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use crate::core::ParserContext;
    use crate::functions::Color;

    use super::*;

    struct RecordingCanvas {
        points: RefCell<Vec<(f64, f64)>>,
    }

    impl Canvas for RecordingCanvas {
        fn draw_line(&mut self, _x0: f64, _y0: f64, _x1: f64, _y1: f64, _color: Color, _width: f32) {}

        fn draw_point(&mut self, x: f64, y: f64, _color: Color, _width: f32) {
            self.points.borrow_mut().push((x, y));
        }
    }

    #[test]
    fn unit_circle_plots_points_close_to_the_curve() {
        let ctx = ParserContext::new();
        let mut formula = Parser::new(ctx);
        formula.set_expression("x ^ 2 + y ^ 2 - 1").expect("parse ok");
        let style = Style { color: Color::rgb(0, 0, 0), width: 1.0 };
        let scale = 100.0;
        let viewport = Viewport { width: 400, height: 400, scale, x_min: -2.0, y_min: -2.0 };
        let mut canvas = RecordingCanvas { points: RefCell::new(Vec::new()) };
        paint(&formula, 4, style, &mut canvas, &viewport);
        let points = canvas.points.borrow();
        assert!(!points.is_empty());
        let threshold = 0.5 / scale;
        for &(px, py) in points.iter() {
            let x = viewport.world_x(px);
            let y = viewport.world_y(py);
            assert!((x * x + y * y - 1.0).abs() <= threshold + 1e-9);
        }
        assert!(!formula.is_bound("x"));
        assert!(!formula.is_bound("y"));
    }
}
