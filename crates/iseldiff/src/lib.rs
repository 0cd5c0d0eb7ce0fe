//! iseldiff - differential instruction-selection tester.
//!
//! Repeatedly synthesizes small JavaScript programs, compiles each through
//! two d8 builds targeting different instruction sets, scores the printed
//! disassembly per basic block with a static cost model, and persists the
//! first case where backend A's code is measurably worse than backend B's.
//!
//! # Example
//!
//! ```ignore
//! use iseldiff::{Backend, Invoker, SearchConfig, search};
//!
//! let config = SearchConfig::new(
//!     Invoker::new(Backend::Riscv64, "out/riscv64.sim/d8"),
//!     Invoker::new(Backend::Mips64el, "out/mips64el_debug/d8"),
//!     "findings",
//! );
//! let outcome = search::run(&config)?;
//! ```

// Re-export from sub-crates
pub use iseldiff_cost::{BlockCosts, CostModel, divergence};
pub use iseldiff_gen::{Literal, LiteralClass, ProgramGenerator, ScopeContext};
pub use iseldiff_v8::{Backend, D8_FLAGS, InvokeError, Invoker};

mod error;
pub mod report;
pub mod search;

pub use error::{Error, Result};
pub use search::{Finding, HuntMode, SearchConfig, SearchOutcome};
