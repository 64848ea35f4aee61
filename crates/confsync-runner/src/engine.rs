use std::process::Command;

use confsync_core::{ApplyOutcome, SyncError};
use tracing::info;

/// Seam in front of the external convergence engine so the pipeline can be
/// exercised with fakes and alternate engines can be substituted.
pub trait ConvergenceEngine {
    fn converge(&self) -> Result<ApplyOutcome, SyncError>;
}

/// Spawns the configured program, waits, and maps its exit status. No retry:
/// re-running a partially converged system without idempotence guarantees
/// from the engine is not assumed safe.
pub struct CommandEngine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }
}

impl ConvergenceEngine for CommandEngine {
    fn converge(&self) -> Result<ApplyOutcome, SyncError> {
        info!(program = %self.program, args = ?self.args, "starting convergence run");
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .map_err(|e| SyncError::Apply(format!("spawning {}: {e}", self.program)))?;
        match status.code() {
            Some(code) => Ok(ApplyOutcome::from_exit_code(code)),
            None => Err(SyncError::Apply(format!(
                "{} terminated by signal",
                self.program
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_zero_is_success() {
        let engine = CommandEngine::new("/bin/sh", vec!["-c".into(), "exit 0".into()]);
        let outcome = engine.converge().unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.exit_code, Some(0));
    }

    #[test]
    fn nonzero_exit_code_is_preserved() {
        let engine = CommandEngine::new("/bin/sh", vec!["-c".into(), "exit 3".into()]);
        let outcome = engine.converge().unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.exit_code, Some(3));
    }

    #[test]
    fn unspawnable_engine_is_apply_error() {
        let engine = CommandEngine::new("/nonexistent/converge-engine", vec![]);
        let err = engine.converge().unwrap_err();
        assert!(matches!(err, SyncError::Apply(_)), "{err}");
    }
}
