//! Gen command: emit generated programs without compiling them.

use std::fs;
use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{error, info};

use iseldiff::ProgramGenerator;

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};

/// Handle the `gen` command.
pub fn cmd_gen(count: usize, seed: Option<u64>, output: Option<&Path>) -> i32 {
    let seed = seed.unwrap_or_else(rand::random);
    info!(seed, "generating {count} program(s)");
    let mut generator = ProgramGenerator::new(ChaCha8Rng::seed_from_u64(seed));

    if let Some(dir) = output
        && let Err(e) = fs::create_dir_all(dir)
    {
        error!(error = %e, path = %dir.display(), "cannot create output directory");
        return EXIT_FAILURE;
    }

    for n in 0..count {
        let program = generator.generate();
        match output {
            Some(dir) => {
                let path = dir.join(format!("case-{n}.js"));
                if let Err(e) = fs::write(&path, &program) {
                    error!(error = %e, path = %path.display(), "write failed");
                    return EXIT_FAILURE;
                }
            }
            None => {
                if count > 1 {
                    println!("// --- program {n} ---");
                }
                print!("{program}");
            }
        }
    }

    EXIT_SUCCESS
}
