//! Implicit-curve Newton-tracer benchmark: the per-column root search is
//! the renderer most sensitive to the block size and iteration cap.

use criterion::{criterion_group, criterion_main, Criterion};
use plotcore::functions::{Color, FunctionKind, FunctionRegistry, FunctionType};
use plotcore::{render_all, Canvas, Viewport};
use std::hint::black_box;

struct DiscardingCanvas;

impl Canvas for DiscardingCanvas {
    fn draw_line(&mut self, _x0: f64, _y0: f64, _x1: f64, _y1: f64, _color: Color, _width: f32) {}
    fn draw_point(&mut self, _x: f64, _y: f64, _color: Color, _width: f32) {}
}

fn registry_with_implicit(source: &str, draw_accuracy: u32) -> FunctionRegistry {
    let registry = FunctionRegistry::new();
    let name = registry.add(FunctionType::Implicit);
    registry.with_function_mut(&name, |function| {
        if let FunctionKind::Implicit { formula, draw_accuracy: accuracy } = &mut function.kind {
            formula.set_expression(source).expect("valid expression");
            *accuracy = draw_accuracy;
        }
    });
    registry.reparse_all();
    registry
}

fn bench_unit_circle(c: &mut Criterion) {
    let mut group = c.benchmark_group("implicit_trace");

    group.bench_function("unit_circle_accuracy_4", |b| {
        let registry = registry_with_implicit("x ^ 2 + y ^ 2 - 1", 4);
        let viewport = Viewport { width: 400, height: 400, scale: 100.0, x_min: -2.0, y_min: -2.0 };
        let mut canvas = DiscardingCanvas;
        b.iter(|| black_box(render_all(black_box(&registry), &mut canvas, &viewport)));
    });

    group.bench_function("unit_circle_accuracy_1", |b| {
        let registry = registry_with_implicit("x ^ 2 + y ^ 2 - 1", 1);
        let viewport = Viewport { width: 400, height: 400, scale: 100.0, x_min: -2.0, y_min: -2.0 };
        let mut canvas = DiscardingCanvas;
        b.iter(|| black_box(render_all(black_box(&registry), &mut canvas, &viewport)));
    });

    group.bench_function("folium_accuracy_4", |b| {
        let registry = registry_with_implicit("x ^ 3 + y ^ 3 - 3 * x * y", 4);
        let viewport = Viewport { width: 400, height: 400, scale: 60.0, x_min: -3.0, y_min: -3.0 };
        let mut canvas = DiscardingCanvas;
        b.iter(|| black_box(render_all(black_box(&registry), &mut canvas, &viewport)));
    });

    group.finish();
}

criterion_group!(benches, bench_unit_circle);
criterion_main!(benches);
