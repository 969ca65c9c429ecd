use thiserror::Error;

/// Why a run stopped before its natural end.
///
/// Cancellation is not a failure: the engine logs it and returns to Ready.
/// Everything else is an unexpected fault and moves the engine to Error.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("cancelled")]
    Cancelled,
    #[error(transparent)]
    Fault(#[from] anyhow::Error),
}

impl RunError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunError::Cancelled)
    }
}

pub type RunResult<T> = Result<T, RunError>;

/// Failure reported by an OS backend. The actuator swallows these.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("not supported on this platform")]
    NotSupported,
    #[error("input injection failed: {0}")]
    InjectionFailed(String),
    #[error("capture failed: {0}")]
    CaptureFailed(String),
}

pub type PlatformResult<T> = Result<T, PlatformError>;
