//! Randomized expression fuzzing for the evaluator, grounded on the teacher
//! crate's `src/tests/fuzz_evaluator.rs`: generate a random tree over this
//! crate's own operator set, print it through [`Parser::expression`], and
//! check that re-parsing the printed form reproduces the same value.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "fuzz test, not library code")]

use rand::prelude::*;
use rand::rngs::StdRng;

use plotcore::core::ParserContext;
use plotcore::Parser;

const NUM_VARS: usize = 3;
const MAX_DEPTH: usize = 5;
const NUM_TESTS: usize = 200;

struct ExprGenerator {
    rng: StdRng,
    vars: Vec<String>,
}

impl ExprGenerator {
    fn new(seed: u64) -> Self {
        let names = ["va", "vb", "vc"];
        Self { rng: StdRng::seed_from_u64(seed), vars: names.into_iter().take(NUM_VARS).map(str::to_owned).collect() }
    }

    fn generate(&mut self, depth: usize) -> String {
        if depth >= MAX_DEPTH || self.rng.random_bool(0.35) {
            return self.terminal();
        }
        match self.rng.random_range(0..3) {
            0 => self.unary(depth),
            1 => self.binary(depth),
            _ => self.min_max(depth),
        }
    }

    fn terminal(&mut self) -> String {
        if self.rng.random_bool(0.5) {
            let value: f64 = self.rng.random_range(0.1..9.0);
            format!("{value:.3}")
        } else {
            let idx = self.rng.random_range(0..self.vars.len());
            self.vars[idx].clone()
        }
    }

    fn unary(&mut self, depth: usize) -> String {
        const FUNCS: [&str; 9] = ["abs", "sin", "cos", "tan", "sinh", "cosh", "tanh", "exp", "ceil"];
        let func = FUNCS[self.rng.random_range(0..FUNCS.len())];
        let arg = self.generate(depth + 1);
        format!("{func}({arg})")
    }

    fn binary(&mut self, depth: usize) -> String {
        const OPS: [&str; 4] = ["+", "-", "*", "/"];
        let op = OPS[self.rng.random_range(0..OPS.len())];
        let lhs = self.generate(depth + 1);
        let rhs = self.generate(depth + 1);
        format!("({lhs}) {op} ({rhs})")
    }

    fn min_max(&mut self, depth: usize) -> String {
        let func = if self.rng.random_bool(0.5) { "min" } else { "max" };
        let lhs = self.generate(depth + 1);
        let rhs = self.generate(depth + 1);
        format!("{func}({lhs},{rhs})")
    }
}

fn close_enough(a: f64, b: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    let diff = (a - b).abs();
    let scale = a.abs().max(b.abs()).max(1.0);
    diff / scale < 1e-9
}

#[test]
fn fuzz_stringify_reparse_round_trip() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut generator = ExprGenerator::new(0xC0FFEE);
    let ctx = ParserContext::new();

    let mut attempted = 0_usize;
    for _ in 0..NUM_TESTS {
        let source = generator.generate(0);
        let mut first = Parser::new(ctx.clone());
        if first.set_expression(&source).is_err() {
            continue;
        }
        let mut values = Vec::with_capacity(NUM_VARS);
        for name in &generator.vars {
            let value = generator.rng.random_range(0.2..4.0);
            first.bind_variable(name, value);
            values.push((name.clone(), value));
        }
        let before = first.value();
        if !before.all_ok() {
            continue;
        }

        let printed = first.expression();
        let mut second = Parser::new(ctx.clone());
        second.set_expression(&printed).expect("stringified form must re-parse");
        for (name, value) in &values {
            second.bind_variable(name, *value);
        }
        let after = second.value();

        attempted += 1;
        assert!(after.all_ok(), "re-parsed form failed to evaluate: {source} -> {printed}");
        assert!(
            close_enough(before.value, after.value),
            "round-trip mismatch for {source} -> {printed}: {} vs {}",
            before.value,
            after.value
        );
    }

    assert!(attempted > NUM_TESTS / 4, "too few generated expressions were well-formed ({attempted})");
}
