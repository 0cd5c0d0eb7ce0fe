//! Random JavaScript program generation for differential backend testing.
//!
//! Programs are built from a small grammar (declarations, assignments,
//! bounded loops, arithmetic expressions) against an explicit scope context,
//! so every emitted reference is to a previously declared variable. Literal
//! values are biased toward immediate-encoding boundaries (12-bit, upper
//! 20-bit, 32-bit, full 64-bit) where instruction selection diverges.

mod literal;
mod program;
mod scope;

pub use literal::{Literal, LiteralClass};
pub use program::ProgramGenerator;
pub use scope::ScopeContext;
