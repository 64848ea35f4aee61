use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage names, used for operator-facing diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Resolving,
    Generating,
    Fetching,
    Extracting,
    Activating,
    Applying,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Resolving => "resolving",
            Stage::Generating => "generating",
            Stage::Fetching => "fetching",
            Stage::Extracting => "extracting",
            Stage::Activating => "activating",
            Stage::Applying => "applying",
        };
        f.write_str(s)
    }
}

/// Everything that can abort a sync run. Each variant belongs to exactly one
/// pipeline stage; all variants are fatal for the run they occur in.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("address lookup for {host} failed: {reason}")]
    Resolution { host: String, reason: String },

    #[error("transport gave up after {attempts} attempt(s): {cause}")]
    Transport { attempts: u32, cause: String },

    #[error("server rejected generation (code {code}): {message}")]
    Api { code: i64, message: String },

    #[error("server response carried neither `result` nor `error`")]
    MalformedResponse,

    #[error("downloading {url} failed: {cause}")]
    Download { url: String, cause: String },

    #[error("extracting {archive} failed: {cause}")]
    Extraction { archive: PathBuf, cause: String },

    #[error("repointing {pointer} failed: {source}")]
    Activation { pointer: PathBuf, source: io::Error },

    #[error("convergence engine: {0}")]
    Apply(String),
}

impl SyncError {
    /// The pipeline stage this error terminates.
    ///
    /// `Transport`, `Api` and `MalformedResponse` only arise while talking to
    /// the generation endpoint; download faults are folded into `Download` by
    /// the fetcher.
    pub fn stage(&self) -> Stage {
        match self {
            SyncError::Resolution { .. } => Stage::Resolving,
            SyncError::Transport { .. }
            | SyncError::Api { .. }
            | SyncError::MalformedResponse => Stage::Generating,
            SyncError::Download { .. } => Stage::Fetching,
            SyncError::Extraction { .. } => Stage::Extracting,
            SyncError::Activation { .. } => Stage::Activating,
            SyncError::Apply(_) => Stage::Applying,
        }
    }
}
