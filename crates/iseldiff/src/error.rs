use std::path::PathBuf;

use thiserror::Error;

/// Search harness errors.
///
/// Backend crashes and timeouts are findings, not errors; anything here
/// means the harness itself cannot continue (bad configuration, broken
/// filesystem, unspawnable executable).
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Invoke(#[from] iseldiff_v8::InvokeError),
    #[error("failed to persist case {case_id} to {}: {source}", path.display())]
    Persist {
        case_id: String,
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
