//! Command implementations.

mod eval;
mod generate;
mod search;

use std::time::Duration;

use iseldiff::Invoker;

use crate::cli::{BackendArgs, Cli, Commands};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Search {
            backends,
            output,
            jobs,
            seed,
            max_attempts,
            hunt,
        } => search::cmd_search(backends, output, *jobs, *seed, *max_attempts, (*hunt).into()),
        Commands::Eval { file, backends } => eval::cmd_eval(file, backends),
        Commands::Gen {
            count,
            seed,
            output,
        } => generate::cmd_gen(*count, *seed, output.as_deref()),
    }
}

/// Build the two invokers from shared CLI arguments.
pub fn build_invokers(args: &BackendArgs) -> (Invoker, Invoker) {
    let timeout = args.timeout.map(Duration::from_secs);
    let mut a = Invoker::new(args.backend_a.into(), &args.d8_a);
    let mut b = Invoker::new(args.backend_b.into(), &args.d8_b);
    if let Some(timeout) = timeout {
        a = a.with_timeout(timeout);
        b = b.with_timeout(timeout);
    }
    (a, b)
}
