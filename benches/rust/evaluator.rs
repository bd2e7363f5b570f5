//! Parsing and evaluation benchmarks for the expression pipeline.

use criterion::{criterion_group, criterion_main, Criterion};
use plotcore::core::ParserContext;
use plotcore::Parser;
use std::hint::black_box;

const POLYNOMIAL: &str = "x ^ 3 + 2 * x ^ 2 + x + 1";
const TRIG_SIMPLE: &str = "sin(x) * cos(x)";
const NESTED_TRIG: &str = "sin(cos(tan(x)))";
const QUOTIENT: &str = "(x ^ 2 + 1) / (x - 1)";
const WIDE_SUM: &str =
    "x + x + x + x + x + x + x + x + x + x + x + x + x + x + x + x + x + x + x + x";

fn bench_set_expression(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_expression");

    group.bench_function("polynomial", |b| {
        let ctx = ParserContext::new();
        let mut formula = Parser::new(ctx);
        b.iter(|| formula.set_expression(black_box(POLYNOMIAL)));
    });

    group.bench_function("nested_trig", |b| {
        let ctx = ParserContext::new();
        let mut formula = Parser::new(ctx);
        b.iter(|| formula.set_expression(black_box(NESTED_TRIG)));
    });

    group.bench_function("wide_sum", |b| {
        let ctx = ParserContext::new();
        let mut formula = Parser::new(ctx);
        b.iter(|| formula.set_expression(black_box(WIDE_SUM)));
    });

    group.finish();
}

fn bench_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("value");

    group.bench_function("polynomial", |b| {
        let ctx = ParserContext::new();
        let mut formula = Parser::new(ctx);
        formula.set_expression(POLYNOMIAL).expect("valid expression");
        formula.bind_variable("x", 1.5);
        b.iter(|| black_box(formula.value()));
    });

    group.bench_function("trig_simple", |b| {
        let ctx = ParserContext::new();
        let mut formula = Parser::new(ctx);
        formula.set_expression(TRIG_SIMPLE).expect("valid expression");
        formula.bind_variable("x", 0.75);
        b.iter(|| black_box(formula.value()));
    });

    group.bench_function("quotient", |b| {
        let ctx = ParserContext::new();
        let mut formula = Parser::new(ctx);
        formula.set_expression(QUOTIENT).expect("valid expression");
        formula.bind_variable("x", 2.0);
        b.iter(|| black_box(formula.value()));
    });

    group.bench_function("scan_1000_points", |b| {
        let ctx = ParserContext::new();
        let mut formula = Parser::new(ctx);
        formula.set_expression(NESTED_TRIG).expect("valid expression");
        formula.bind_variable("x", 0.0);
        let cell = formula.cell("x").expect("x is bound");
        b.iter(|| {
            for i in 0..1000_u32 {
                cell.set(f64::from(i) * 0.001);
                black_box(formula.value());
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_set_expression, bench_value);
criterion_main!(benches);
