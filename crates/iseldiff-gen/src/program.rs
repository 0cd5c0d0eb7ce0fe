//! Grammar-driven program generation.

use std::fmt::Write;

use rand::Rng;

use crate::literal::Literal;
use crate::scope::ScopeContext;

/// Statement count cap per block.
const MAX_BLOCK_STMTS: usize = 5;

/// Unary operators. `~` and the increments only make sense on numbers, which
/// is everything we generate.
const UNARY_OPS: [&str; 5] = ["-", "~", "!", "++", "--"];

/// Binary operators, weighted uniformly.
const BINARY_OPS: [&str; 18] = [
    "^", "&", "|", "<<", ">>", "+", "-", "*", "/", "%", "==", "!=", "<", "<=", ">", ">=", "&&",
    "||",
];

/// Generates one random test program per call.
///
/// The RNG is injected so generation is reproducible under a fixed seed; the
/// generator itself keeps no state between programs.
pub struct ProgramGenerator<R: Rng> {
    rng: R,
}

impl<R: Rng> ProgramGenerator<R> {
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Generate a complete compilation unit.
    ///
    /// Layout: global declarations, a single `test` function, then the
    /// driver harness - call once, request peak optimization, call again
    /// with the same arguments. The double call is what makes the backend
    /// emit both an unoptimized and an optimized version of `test`.
    pub fn generate(&mut self) -> String {
        let mut scope = ScopeContext::new();
        let num_params = self.geometric(0.2) + 1;
        let args = self.call_args(num_params);

        let mut unit = self.globals(&mut scope);
        let _ = writeln!(unit, "{}", self.function(&mut scope, num_params));
        unit.push_str("%PrepareFunctionForOptimization(test);\n");
        let _ = writeln!(unit, "test({args});");
        unit.push_str("%OptimizeFunctionOnNextCall(test);\n");
        let _ = writeln!(unit, "test({args});");
        unit
    }

    /// Roughly geometric distribution: floor of an exponential sample.
    /// Small values dominate, occasional larger ones.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn geometric(&mut self, lambda: f64) -> usize {
        let u: f64 = self.rng.r#gen();
        (-(1.0 - u).ln() / lambda) as usize
    }

    fn globals(&mut self, scope: &mut ScopeContext) -> String {
        let mut out = String::new();
        for _ in 0..self.geometric(1.0) {
            let value = Literal::random(&mut self.rng);
            let name = scope.fresh_var(false);
            let _ = writeln!(out, "var {name} = {value};");
        }
        out
    }

    fn function(&mut self, scope: &mut ScopeContext, num_params: usize) -> String {
        let params = scope.fresh_vars(num_params).join(", ");
        let body = self.block(scope, false);
        let ret = scope.random_visible(&mut self.rng);
        format!("function test({params}) {{\n{body}return {ret};\n}}")
    }

    /// Literal arguments for the harness calls.
    fn call_args(&mut self, n: usize) -> String {
        (0..n)
            .map(|_| Literal::random(&mut self.rng).to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn block(&mut self, scope: &mut ScopeContext, no_loop: bool) -> String {
        let count = self.geometric(0.5).min(MAX_BLOCK_STMTS);
        let mut out = String::new();
        for _ in 0..count {
            out.push_str(&self.stmt(scope, no_loop));
            out.push('\n');
        }
        out
    }

    fn stmt(&mut self, scope: &mut ScopeContext, no_loop: bool) -> String {
        let choices = if no_loop { 2 } else { 3 };
        match self.rng.gen_range(0..choices) {
            0 => self.stmt_decl(scope),
            1 => self.stmt_assign(scope),
            _ => self.stmt_loop(scope),
        }
    }

    /// `var v = expr;` - the initializer is generated first so a variable
    /// never appears in its own initializer.
    fn stmt_decl(&mut self, scope: &mut ScopeContext) -> String {
        let init = self.expr(scope);
        let name = scope.fresh_var(false);
        format!("var {name} = {init};")
    }

    /// Assignment target is any visible variable; loop counters are not in
    /// the visible set, so they can never be targeted.
    fn stmt_assign(&mut self, scope: &mut ScopeContext) -> String {
        let target = scope.random_visible(&mut self.rng).to_string();
        let value = self.expr(scope);
        format!("{target} = {value};")
    }

    /// Bounded counting loop over a child scope. A coin flip disallows
    /// further nesting inside the body to bound recursion depth.
    fn stmt_loop(&mut self, scope: &mut ScopeContext) -> String {
        let mut child = scope.child();
        let counter = child.fresh_var(true);
        let bound = self.rng.gen_range(1..127);
        let suppress_nested = self.rng.gen_bool(0.4);
        let body = self.block(&mut child, suppress_nested);
        scope.adopt_counter(&child);
        format!("for (var {counter} = 0; {counter} < {bound}; ++{counter}) {{\n{body}}}")
    }

    fn expr(&mut self, scope: &ScopeContext) -> String {
        match self.rng.gen_range(0..5) {
            0 => scope.random_visible(&mut self.rng).to_string(),
            1 => Literal::random(&mut self.rng).to_string(),
            2 => self.expr_unary(scope),
            3 => self.expr_binary(scope),
            _ => self.expr_ternary(scope),
        }
    }

    fn expr_unary(&mut self, scope: &ScopeContext) -> String {
        let op = UNARY_OPS[self.rng.gen_range(0..UNARY_OPS.len())];
        let operand = scope.random_visible(&mut self.rng);
        format!("{op}{operand}")
    }

    fn expr_binary(&mut self, scope: &ScopeContext) -> String {
        let lhs = scope.random_visible(&mut self.rng).to_string();
        let op = BINARY_OPS[self.rng.gen_range(0..BINARY_OPS.len())];
        let rhs = scope.random_visible(&mut self.rng);
        format!("{lhs} {op} {rhs}")
    }

    fn expr_ternary(&mut self, scope: &ScopeContext) -> String {
        let cond = scope.random_visible(&mut self.rng).to_string();
        let then = scope.random_visible(&mut self.rng).to_string();
        let other = scope.random_visible(&mut self.rng);
        format!("{cond} ? {then} : {other}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use regex::Regex;

    fn generate(seed: u64) -> String {
        ProgramGenerator::new(ChaCha8Rng::seed_from_u64(seed)).generate()
    }

    /// Walk the program text in order and check no identifier is referenced
    /// before its declaration. `var x` and function parameters declare;
    /// everything else is a reference.
    fn assert_scope_correct(program: &str) {
        let ident = Regex::new(r"(var\s+)?\b([vi]\d+)\b").unwrap();
        let params = Regex::new(r"function test\(([^)]*)\)").unwrap();

        let mut declared: Vec<String> = Vec::new();
        if let Some(caps) = params.captures(program) {
            for p in caps[1].split(',').map(str::trim).filter(|p| !p.is_empty()) {
                declared.push(p.to_string());
            }
        }

        for caps in ident.captures_iter(program) {
            let name = &caps[2];
            if caps.get(1).is_some() {
                declared.push(name.to_string());
            } else {
                assert!(
                    declared.iter().any(|d| d == name),
                    "reference before declaration: {name}\n{program}"
                );
            }
        }
    }

    #[test]
    fn test_generated_programs_are_scope_correct() {
        for seed in 0..200 {
            assert_scope_correct(&generate(seed));
        }
    }

    #[test]
    fn test_harness_is_always_present() {
        for seed in 0..20 {
            let program = generate(seed);
            assert!(program.contains("%PrepareFunctionForOptimization(test);"));
            assert!(program.contains("%OptimizeFunctionOnNextCall(test);"));
            // One definition plus the two harness calls.
            assert_eq!(program.matches("test(").count(), 3, "{program}");
        }
    }

    #[test]
    fn test_same_arguments_both_calls() {
        for seed in 0..20 {
            let program = generate(seed);
            let calls: Vec<&str> = program
                .lines()
                .filter(|l| l.starts_with("test("))
                .collect();
            assert_eq!(calls.len(), 2);
            assert_eq!(calls[0], calls[1]);
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        assert_eq!(generate(42), generate(42));
        assert_ne!(generate(42), generate(43));
    }

    #[test]
    fn test_loop_bounds_in_range() {
        let bound = Regex::new(r"< (\d+); \+\+i").unwrap();
        for seed in 0..100 {
            let program = generate(seed);
            for caps in bound.captures_iter(&program) {
                let n: u32 = caps[1].parse().unwrap();
                assert!((1..127).contains(&n), "loop bound {n}");
            }
        }
    }

    #[test]
    fn test_loop_counters_never_assigned() {
        // Assignment statements `iN = ...` must not occur; counters only
        // appear in their own for-headers.
        let assign = Regex::new(r"(?m)^i\d+ =").unwrap();
        for seed in 0..100 {
            let program = generate(seed);
            assert!(!assign.is_match(&program), "{program}");
        }
    }
}
