//! Eval command: score one existing source file through both backends.

use std::path::Path;

use tracing::{error, warn};

use iseldiff::{CostModel, divergence, report};

use crate::cli::{BackendArgs, EXIT_FAILURE, EXIT_SUCCESS};
use crate::commands::build_invokers;

/// Handle the `eval` command.
pub fn cmd_eval(file: &Path, backends: &BackendArgs) -> i32 {
    if !file.exists() {
        error!(path = %file.display(), "source file not found");
        return EXIT_FAILURE;
    }

    let (invoker_a, invoker_b) = build_invokers(backends);
    let mut model = CostModel::new();

    let costs = [&invoker_a, &invoker_b].map(|invoker| match invoker.disassemble(file) {
        Ok(asm) => Some(model.block_costs(&asm)),
        Err(e) => {
            error!(backend = %invoker.backend(), error = %e, "disassembly failed");
            None
        }
    });
    let [Some(costs_a), Some(costs_b)] = costs else {
        return EXIT_FAILURE;
    };

    let name_a = invoker_a.backend().name();
    let name_b = invoker_b.backend().name();
    print!("{}", report::cost_table(name_a, name_b, &costs_a, &costs_b));
    println!(
        "divergence {name_a} over {name_b}: {}",
        divergence(&costs_a, &costs_b)
    );
    println!(
        "divergence {name_b} over {name_a}: {}",
        divergence(&costs_b, &costs_a)
    );

    let unknown: Vec<&str> = model.unknown_mnemonics().collect();
    if !unknown.is_empty() {
        warn!(?unknown, "mnemonics missing from the cost table");
    }

    EXIT_SUCCESS
}
