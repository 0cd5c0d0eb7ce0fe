//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use iseldiff::{Backend, HuntMode};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "iseldiff")]
#[command(about = "Differential instruction-selection tester for d8 backends")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (sets RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that invokes the two backends.
#[derive(clap::Args, Clone, Debug)]
pub struct BackendArgs {
    /// d8 executable for backend A (the one under suspicion)
    #[arg(long, value_name = "PATH")]
    pub d8_a: PathBuf,

    /// d8 executable for backend B (the reference)
    #[arg(long, value_name = "PATH")]
    pub d8_b: PathBuf,

    /// Target ISA of backend A
    #[arg(long, value_enum, default_value = "riscv64")]
    pub backend_a: BackendArg,

    /// Target ISA of backend B
    #[arg(long, value_enum, default_value = "mips64el")]
    pub backend_b: BackendArg,

    /// Kill a d8 invocation after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search for a program where backend A's code is costlier than B's
    Search {
        #[command(flatten)]
        backends: BackendArgs,

        /// Output directory for flagged cases
        #[arg(short, long, default_value = "findings")]
        output: PathBuf,

        /// Parallel trial pipelines (0 = one per CPU)
        #[arg(short = 'j', long, default_value = "1")]
        jobs: usize,

        /// RNG seed (random if omitted; logged for reproduction)
        #[arg(long)]
        seed: Option<u64>,

        /// Give up after this many trials
        #[arg(long)]
        max_attempts: Option<u64>,

        /// Which finding categories stop the search
        #[arg(long, value_enum, default_value = "cost")]
        hunt: HuntArg,
    },
    /// Score one existing source file through both backends
    Eval {
        /// JavaScript source file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        backends: BackendArgs,
    },
    /// Emit generated programs without compiling them
    Gen {
        /// Number of programs to generate
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,

        /// RNG seed (random if omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Write case-<n>.js files here instead of printing to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Target ISA backend.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum BackendArg {
    Riscv64,
    Mips64el,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Riscv64 => Self::Riscv64,
            BackendArg::Mips64el => Self::Mips64el,
        }
    }
}

/// Finding category that terminates the search.
#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum HuntArg {
    /// Cost divergence (crashes are persisted but not terminal)
    #[default]
    Cost,
    /// Backend crash or non-zero exit
    Crash,
    /// Either
    Any,
}

impl From<HuntArg> for HuntMode {
    fn from(arg: HuntArg) -> Self {
        match arg {
            HuntArg::Cost => Self::Cost,
            HuntArg::Crash => Self::Crash,
            HuntArg::Any => Self::Any,
        }
    }
}
