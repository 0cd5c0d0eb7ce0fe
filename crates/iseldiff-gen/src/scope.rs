//! Scope tracking for the program generator.

use rand::Rng;
use rand::seq::SliceRandom;

/// Tracks variables visible at the current generation point plus a naming
/// counter shared across the whole program.
///
/// Ordinary variables (`v{n}`) and loop counters (`i{n}`) draw from the same
/// counter but live in disjoint namespaces: loop counters are never added to
/// the visible set, so they cannot be picked as operands or assignment
/// targets.
#[derive(Clone, Debug, Default)]
pub struct ScopeContext {
    counter: u32,
    visible: Vec<String>,
}

impl ScopeContext {
    /// Create an empty root scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh identifier.
    ///
    /// Ordinary variables become visible to later statements in this scope;
    /// loop counters do not.
    pub fn fresh_var(&mut self, loop_counter: bool) -> String {
        let name = if loop_counter {
            format!("i{}", self.counter)
        } else {
            let name = format!("v{}", self.counter);
            self.visible.push(name.clone());
            name
        };
        self.counter += 1;
        name
    }

    /// Allocate `n` fresh ordinary variables.
    pub fn fresh_vars(&mut self, n: usize) -> Vec<String> {
        (0..n).map(|_| self.fresh_var(false)).collect()
    }

    /// Pick a uniformly random visible variable.
    ///
    /// Callers must have declared at least one ordinary variable first; an
    /// empty scope is a generator bug, not a recoverable condition.
    pub fn random_visible<R: Rng>(&self, rng: &mut R) -> &str {
        self.visible
            .choose(rng)
            .expect("scope must contain at least one visible variable")
    }

    /// Derive a scope for a nested block.
    ///
    /// The child sees everything visible here, but declarations made in the
    /// child never propagate back. The caller is expected to
    /// [`adopt_counter`](Self::adopt_counter) afterwards so identifiers stay
    /// unique across sibling scopes.
    #[must_use]
    pub fn child(&self) -> Self {
        self.clone()
    }

    /// Advance this scope's counter past everything a child allocated.
    pub fn adopt_counter(&mut self, child: &Self) {
        self.counter = self.counter.max(child.counter);
    }

    /// Number of visible variables.
    #[must_use]
    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Visible variables in declaration order.
    #[must_use]
    pub fn visible(&self) -> &[String] {
        &self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_fresh_vars_are_unique() {
        let mut scope = ScopeContext::new();
        let a = scope.fresh_var(false);
        let b = scope.fresh_var(true);
        let c = scope.fresh_var(false);
        assert_eq!(a, "v0");
        assert_eq!(b, "i1");
        assert_eq!(c, "v2");
    }

    #[test]
    fn test_loop_counters_not_visible() {
        let mut scope = ScopeContext::new();
        scope.fresh_var(false);
        scope.fresh_var(true);
        assert_eq!(scope.visible(), &["v0".to_string()]);
    }

    #[test]
    fn test_child_declarations_do_not_leak() {
        let mut scope = ScopeContext::new();
        scope.fresh_var(false);
        let before = scope.visible().to_vec();

        let mut child = scope.child();
        child.fresh_var(false);
        assert_eq!(child.visible_len(), 2);

        scope.adopt_counter(&child);
        assert_eq!(scope.visible(), &before[..]);
    }

    #[test]
    fn test_adopted_counter_keeps_names_unique() {
        let mut scope = ScopeContext::new();
        scope.fresh_var(false); // v0

        let mut child = scope.child();
        let inner = child.fresh_var(false); // v1
        scope.adopt_counter(&child);

        let after = scope.fresh_var(false); // must not reuse v1
        assert_ne!(inner, after);
        assert_eq!(after, "v2");
    }

    #[test]
    fn test_random_visible_uniform_choice() {
        let mut scope = ScopeContext::new();
        scope.fresh_vars(3);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let v = scope.random_visible(&mut rng);
            assert!(scope.visible().contains(&v.to_string()));
        }
    }

    #[test]
    #[should_panic(expected = "at least one visible variable")]
    fn test_empty_scope_fails_fast() {
        let scope = ScopeContext::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let _ = scope.random_visible(&mut rng);
    }
}
