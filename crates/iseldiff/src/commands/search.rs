//! Search command.

use std::path::Path;

use tracing::error;

use iseldiff::search::{self, Finding, HuntMode, SearchConfig};

use crate::cli::{BackendArgs, EXIT_FAILURE, EXIT_SUCCESS};
use crate::commands::build_invokers;
use crate::terminal::Spinner;

/// Handle the `search` command.
pub fn cmd_search(
    backends: &BackendArgs,
    output: &Path,
    jobs: usize,
    seed: Option<u64>,
    max_attempts: Option<u64>,
    hunt: HuntMode,
) -> i32 {
    let (invoker_a, invoker_b) = build_invokers(backends);
    let config = SearchConfig::new(invoker_a, invoker_b, output)
        .with_jobs(jobs)
        .with_seed(seed)
        .with_max_attempts(max_attempts)
        .with_hunt(hunt);

    let spinner = Spinner::new("searching...");
    let outcome = search::run_with_progress(&config, &|attempt| {
        spinner.set_message(format!("searching... {attempt} trials"));
    });

    match outcome {
        Ok(outcome) => match outcome.finding {
            Some(finding) => {
                let kind = match &finding {
                    Finding::CostDivergence { score, .. } => {
                        format!("cost divergence (score {score})")
                    }
                    Finding::BackendFailure { backend, .. } => format!("{backend} failure"),
                };
                spinner.finish_with_success(&format!(
                    "found {} after {} trials: case {} ({})",
                    kind,
                    outcome.attempts,
                    finding.case_id(),
                    finding.report_path().display()
                ));
                EXIT_SUCCESS
            }
            None => {
                spinner.finish_with_warning(&format!(
                    "no finding in {} trials",
                    outcome.attempts
                ));
                EXIT_FAILURE
            }
        },
        Err(e) => {
            spinner.finish_with_failure("search aborted");
            error!(error = %e, "search failed");
            EXIT_FAILURE
        }
    }
}
