//! C6: three rendering strategies — cartesian line-scan, parametric
//! polyline, implicit root-tracking — each painting one function into a
//! rectangular pixel area using its own parser instance, per `spec.md` §4.4.
//!
//! The raster/painter itself is abstracted behind [`Canvas`], per §1's "the
//! raster/painter is abstracted to a minimal drawing interface".

mod cartesian;
mod implicit;
mod parametric;

pub mod export;

use crate::functions::{Bound, Color, Function, FunctionKind, FunctionRegistry};

/// Minimal drawing surface a renderer paints into. Coordinates are in
/// pixel space, with `(0, 0)` at the top-left of the viewport.
pub trait Canvas {
    /// Draws a line segment between two pixel-space points.
    fn draw_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Color, width: f32);

    /// Draws a single pixel-space point (the implicit renderer plots
    /// isolated points rather than connected segments).
    fn draw_point(&mut self, x: f64, y: f64, color: Color, width: f32);
}

/// The pixel viewport one render pass paints into, per `spec.md` §4.4/§6.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Pixel width of the drawing surface.
    pub width: u32,
    /// Pixel height of the drawing surface.
    pub height: u32,
    /// Pixels per world unit.
    pub scale: f64,
    /// World x-coordinate at pixel column 0.
    pub x_min: f64,
    /// World y-coordinate at pixel row `height` (the bottom of the
    /// viewport); row 0 is `y_min + height / scale`.
    pub y_min: f64,
}

impl Viewport {
    /// Maps a world x-coordinate to its pixel column.
    #[must_use]
    pub fn px(&self, x: f64) -> f64 {
        (x - self.x_min) * self.scale
    }

    /// Maps a world y-coordinate to its pixel row.
    #[must_use]
    pub fn py(&self, y: f64) -> f64 {
        f64::from(self.height) - (y - self.y_min) * self.scale
    }

    /// Maps a pixel column back to a world x-coordinate.
    #[must_use]
    pub fn world_x(&self, px: f64) -> f64 {
        self.x_min + px / self.scale
    }

    /// Maps a pixel row back to a world y-coordinate.
    #[must_use]
    pub fn world_y(&self, py: f64) -> f64 {
        self.y_min + (f64::from(self.height) - py) / self.scale
    }
}

/// Color and line width shared by every renderer, per `spec.md` §3's
/// "render color, line width".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    /// Render color.
    pub color: Color,
    /// Render line width, in pixels.
    pub width: f32,
}

/// The enabled `[min, max]` domain clip of a Cartesian entry's independent
/// variable, per `spec.md` §3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainClip {
    /// Lower bound.
    pub min: Bound,
    /// Upper bound.
    pub max: Bound,
}

impl DomainClip {
    /// `true` if `value` falls outside an enabled bound.
    #[must_use]
    pub fn excludes(&self, value: f64) -> bool {
        (self.min.enabled && value < self.min.value) || (self.max.enabled && value > self.max.value)
    }
}

/// Reported when a render pass is aborted by a detected self- or
/// mutually-recursive call, per `spec.md` §7's "one-shot event".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursionDetected {
    /// The name of the function whose evaluation triggered the detection.
    pub name: Box<str>,
}

/// Paints every enabled function in `registry` into `canvas`, in iteration
/// order. Stops painting further functions and returns `Some` if a
/// recursive call is detected during any function's evaluation, after
/// disabling every function in the registry, per `spec.md` §4.4/§7.
pub fn render_all(
    registry: &FunctionRegistry,
    canvas: &mut dyn Canvas,
    viewport: &Viewport,
) -> Option<RecursionDetected> {
    registry.clear_recursion_error();
    let mut detected = None;
    registry.for_each(|function| {
        if detected.is_some() || !function.enabled {
            return;
        }
        paint_one(function, canvas, viewport);
        if registry.recursion_error() {
            detected = Some(RecursionDetected { name: function.name.clone() });
        }
    });
    if detected.is_some() {
        registry.disable_all();
    }
    detected
}

fn paint_one(function: &Function, canvas: &mut dyn Canvas, viewport: &Viewport) {
    let style = Style { color: function.color, width: function.width };
    match &function.kind {
        FunctionKind::Cartesian { subtype, formula, min, max } => {
            let clip = DomainClip { min: *min, max: *max };
            cartesian::paint(*subtype, formula, clip, style, canvas, viewport);
        }
        FunctionKind::Parametric { x_formula, y_formula, min_param, max_param, param_step } => {
            let sweep = parametric::Sweep { min: *min_param, max: *max_param, step: *param_step };
            parametric::paint(x_formula, y_formula, sweep, style, canvas, viewport);
        }
        FunctionKind::Implicit { formula, draw_accuracy } => {
            implicit::paint(formula, *draw_accuracy, style, canvas, viewport);
        }
    }
}
