//! Search orchestration: the generate → compile → cost → compare loop.
//!
//! Each trial is independent: generate a program under a fresh case id,
//! disassemble it through both backends, score both dumps, compare. A
//! positive divergence persists the case and stops the search; anything
//! else deletes the trial's source and loops. Trials share nothing but the
//! attempt counter and the case-id namespace, so the loop scales out to
//! parallel workers with a first-success-wins stop flag.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use rand::distributions::Alphanumeric;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use iseldiff_cost::{CostModel, divergence};
use iseldiff_gen::ProgramGenerator;
use iseldiff_v8::{Backend, InvokeError, Invoker};

use crate::report;
use crate::{Error, Result};

/// Length of the random alphanumeric case id.
const CASE_ID_LEN: usize = 8;

/// What counts as a terminal finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HuntMode {
    /// Stop on cost divergence; backend crashes are persisted but the
    /// search continues.
    #[default]
    Cost,
    /// Stop on backend crash/non-zero exit only.
    Crash,
    /// Stop on whichever comes first.
    Any,
}

impl HuntMode {
    const fn stops_on_cost(self) -> bool {
        matches!(self, Self::Cost | Self::Any)
    }

    const fn stops_on_crash(self) -> bool {
        matches!(self, Self::Crash | Self::Any)
    }
}

/// Search configuration.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Backend under suspicion (the search direction: A worse than B).
    pub invoker_a: Invoker,
    /// Reference backend.
    pub invoker_b: Invoker,
    /// Where flagged case sources and reports land.
    pub output_dir: PathBuf,
    /// Parallel trial pipelines (0 = one per CPU).
    pub jobs: usize,
    /// Base RNG seed; random when unset. Worker `w` derives its stream
    /// from `seed + w`, so a logged seed reproduces a sequential run.
    pub seed: Option<u64>,
    /// Stop after this many trials without a finding.
    pub max_attempts: Option<u64>,
    /// Finding categories that terminate the search.
    pub hunt: HuntMode,
}

impl SearchConfig {
    pub fn new(invoker_a: Invoker, invoker_b: Invoker, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            invoker_a,
            invoker_b,
            output_dir: output_dir.into(),
            jobs: 1,
            seed: None,
            max_attempts: None,
            hunt: HuntMode::default(),
        }
    }

    #[must_use]
    pub const fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub const fn with_max_attempts(mut self, max: Option<u64>) -> Self {
        self.max_attempts = max;
        self
    }

    #[must_use]
    pub const fn with_hunt(mut self, hunt: HuntMode) -> Self {
        self.hunt = hunt;
        self
    }
}

/// A persisted finding.
#[derive(Clone, Debug)]
pub enum Finding {
    /// Backend A's code costs measurably more than backend B's somewhere.
    CostDivergence {
        case_id: String,
        score: u32,
        source: PathBuf,
        report: PathBuf,
    },
    /// A backend crashed or exited non-zero on a generated program.
    BackendFailure {
        case_id: String,
        backend: Backend,
        source: PathBuf,
        report: PathBuf,
    },
}

impl Finding {
    #[must_use]
    pub fn case_id(&self) -> &str {
        match self {
            Self::CostDivergence { case_id, .. } | Self::BackendFailure { case_id, .. } => case_id,
        }
    }

    #[must_use]
    pub fn report_path(&self) -> &Path {
        match self {
            Self::CostDivergence { report, .. } | Self::BackendFailure { report, .. } => report,
        }
    }
}

/// Result of a whole search run.
#[derive(Debug)]
pub struct SearchOutcome {
    /// The terminal finding, if any (`None` when `max_attempts` ran out).
    pub finding: Option<Finding>,
    /// Trials performed across all workers.
    pub attempts: u64,
}

/// Run the search to the first terminal finding.
pub fn run(config: &SearchConfig) -> Result<SearchOutcome> {
    run_with_progress(config, &|_| {})
}

/// Run the search, reporting the attempt count after every trial.
pub fn run_with_progress(
    config: &SearchConfig,
    on_attempt: &(dyn Fn(u64) + Sync),
) -> Result<SearchOutcome> {
    fs::create_dir_all(&config.output_dir)?;

    let jobs = if config.jobs == 0 {
        num_cpus::get().max(1)
    } else {
        config.jobs
    };
    let base_seed = config.seed.unwrap_or_else(rand::random);
    info!(jobs, seed = base_seed, "starting search");

    let stop = AtomicBool::new(false);
    let attempts = AtomicU64::new(0);
    let winner: Mutex<Option<Finding>> = Mutex::new(None);
    let failure: Mutex<Option<Error>> = Mutex::new(None);

    std::thread::scope(|scope| {
        for worker in 0..jobs as u64 {
            let stop = &stop;
            let attempts = &attempts;
            let winner = &winner;
            let failure = &failure;
            scope.spawn(move || {
                let result = worker_loop(
                    config,
                    base_seed.wrapping_add(worker),
                    stop,
                    attempts,
                    winner,
                    on_attempt,
                );
                if let Err(e) = result {
                    let mut slot = failure.lock();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    stop.store(true, Ordering::SeqCst);
                }
            });
        }
    });

    if let Some(e) = failure.into_inner() {
        return Err(e);
    }

    Ok(SearchOutcome {
        finding: winner.into_inner(),
        attempts: attempts.into_inner(),
    })
}

/// One worker: its own RNG, generator, cost model, and scratch directory.
fn worker_loop(
    config: &SearchConfig,
    seed: u64,
    stop: &AtomicBool,
    attempts: &AtomicU64,
    winner: &Mutex<Option<Finding>>,
    on_attempt: &(dyn Fn(u64) + Sync),
) -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut model = CostModel::new();
    // Dropped on worker exit, so a cancelled trial never leaves an orphaned
    // source behind.
    let scratch = tempfile::tempdir()?;

    while !stop.load(Ordering::SeqCst) {
        // Reserve an attempt slot; return it if the budget is already
        // spent, so the counter reports performed trials exactly.
        let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(max) = config.max_attempts
            && attempt > max
        {
            attempts.fetch_sub(1, Ordering::SeqCst);
            stop.store(true, Ordering::SeqCst);
            break;
        }

        let case_id: String = (&mut rng)
            .sample_iter(Alphanumeric)
            .take(CASE_ID_LEN)
            .map(char::from)
            .collect();
        let program = ProgramGenerator::new(&mut rng).generate();

        if let Some(finding) = run_trial(config, &mut model, &case_id, &program, scratch.path())? {
            let stops = match finding {
                Finding::CostDivergence { .. } => config.hunt.stops_on_cost(),
                Finding::BackendFailure { .. } => config.hunt.stops_on_crash(),
            };
            info!(
                case_id = finding.case_id(),
                report = %finding.report_path().display(),
                terminal = stops,
                "persisted finding"
            );
            if stops {
                let mut slot = winner.lock();
                if slot.is_none() {
                    *slot = Some(finding);
                }
                stop.store(true, Ordering::SeqCst);
                break;
            }
        }

        on_attempt(attempt);
    }

    let unknown: Vec<&str> = model.unknown_mnemonics().collect();
    if !unknown.is_empty() {
        warn!(?unknown, "mnemonics missing from the cost table");
    }
    Ok(())
}

/// One trial: GENERATE is done by the caller; this covers COMPILE_A/COST_A,
/// COMPILE_B/COST_B, COMPARE, and PERSIST or DISCARD.
fn run_trial(
    config: &SearchConfig,
    model: &mut CostModel,
    case_id: &str,
    program: &str,
    scratch: &Path,
) -> Result<Option<Finding>> {
    let source = scratch.join(format!("case-{case_id}.js"));
    fs::write(&source, program)?;
    debug!(case_id, "trial start");

    let asm_a = match config.invoker_a.disassemble(&source) {
        Ok(asm) => asm,
        Err(e) => return backend_failure(config, case_id, program, &source, e).map(Some),
    };
    let costs_a = model.block_costs(&asm_a);

    let asm_b = match config.invoker_b.disassemble(&source) {
        Ok(asm) => asm,
        Err(e) => return backend_failure(config, case_id, program, &source, e).map(Some),
    };
    let costs_b = model.block_costs(&asm_b);

    let score = divergence(&costs_a, &costs_b);
    if score == 0 {
        cleanup_scratch(case_id, &source);
        debug!(case_id, "discarded");
        return Ok(None);
    }

    let name_a = config.invoker_a.backend().name();
    let name_b = config.invoker_b.backend().name();
    let (persisted_source, report_path) = persist_paths(config, case_id);
    let scenario = report::scenario(
        case_id,
        &persisted_source,
        &config.invoker_a,
        &config.invoker_b,
    );
    let table = report::cost_table(name_a, name_b, &costs_a, &costs_b);
    let text =
        report::divergence_report(&scenario, score, &table, program, name_a, &asm_a, name_b, &asm_b);
    persist(case_id, &persisted_source, program, &report_path, &text)?;
    cleanup_scratch(case_id, &source);

    Ok(Some(Finding::CostDivergence {
        case_id: case_id.to_string(),
        score,
        source: persisted_source,
        report: report_path,
    }))
}

/// Persist a crashing or non-zero-exiting backend invocation as its own
/// finding category. Harness-side failures (unspawnable executable) abort
/// the search instead - they would fail every trial the same way.
fn backend_failure(
    config: &SearchConfig,
    case_id: &str,
    program: &str,
    source: &Path,
    error: InvokeError,
) -> Result<Finding> {
    let backend = match &error {
        InvokeError::Failed { backend, .. } | InvokeError::Timeout { backend, .. } => *backend,
        // Harness-side problems, not backend findings.
        InvokeError::Spawn { .. } | InvokeError::Io(_) => return Err(error.into()),
    };

    let (persisted_source, report_path) = persist_paths(config, case_id);
    let scenario = report::scenario(
        case_id,
        &persisted_source,
        &config.invoker_a,
        &config.invoker_b,
    );
    let text = report::crash_report(&scenario, program, &error.to_string());
    persist(case_id, &persisted_source, program, &report_path, &text)?;
    cleanup_scratch(case_id, source);

    warn!(case_id, %backend, "backend failed on generated program");
    Ok(Finding::BackendFailure {
        case_id: case_id.to_string(),
        backend,
        source: persisted_source,
        report: report_path,
    })
}

/// Best-effort removal of a trial's scratch source. The file lives in a
/// worker-private tempdir, so a failed cleanup is not worth aborting the
/// whole search over.
fn cleanup_scratch(case_id: &str, source: &Path) {
    if let Err(e) = fs::remove_file(source) {
        warn!(case_id, error = %e, "failed to remove scratch source");
    }
}

fn persist_paths(config: &SearchConfig, case_id: &str) -> (PathBuf, PathBuf) {
    (
        config.output_dir.join(format!("case-{case_id}.js")),
        config.output_dir.join(format!("case-{case_id}.txt")),
    )
}

fn persist(
    case_id: &str,
    source_path: &Path,
    program: &str,
    report_path: &Path,
    report: &str,
) -> Result<()> {
    let write = |path: &Path, data: &str| {
        fs::write(path, data).map_err(|source| Error::Persist {
            case_id: case_id.to_string(),
            path: path.to_path_buf(),
            source,
        })
    };
    write(source_path, program)?;
    write(report_path, report)
}
