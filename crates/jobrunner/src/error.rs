use crate::JobId;
use std::fmt;
use thiserror::Error;

/// An error returned by a caller-supplied [`crate::Job`] implementation.
///
/// The core never inspects or downcasts this value; it is passed through
/// verbatim to the `Runner` caller.
pub type JobError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by [`crate::Runner`] operations.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// No record exists for the given id (never registered, already
    /// evicted, or simply unknown).
    #[error("job not found: {0}")]
    JobNotFound(JobId),

    /// The operation requires a running job but the job has already
    /// terminated.
    #[error("job not running: {0}")]
    JobNotRunning(JobId),

    /// `RunnerConfig`/`RingBuffer::new` was given a capacity of zero.
    #[error("invalid capacity: capacity must be >= 1")]
    InvalidCapacity,

    /// The caller's `CancellationToken` fired before the operation
    /// completed (only honored during `run`'s wait-for-start phase).
    #[error("operation cancelled")]
    Cancelled,

    /// An error returned by `Job::start` or `Job::stop`, annotated with
    /// the job it came from. Used at the `close` boundary (spec.md §7).
    #[error("job {id} failed: {source}")]
    Job {
        /// The job whose `start`/`stop` call failed.
        id: JobId,
        /// The underlying error, passed through verbatim.
        #[source]
        source: JobErrorBox,
    },
}

impl RunnerError {
    pub(crate) fn job(id: JobId, source: JobError) -> Self {
        Self::Job {
            id,
            source: JobErrorBox(source),
        }
    }
}

/// Wrapper so `JobError` (a type alias for a trait object) can implement
/// `std::error::Error` and be used as `#[source]`.
#[derive(Debug)]
pub struct JobErrorBox(pub JobError);

impl fmt::Display for JobErrorBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for JobErrorBox {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.0.as_ref())
    }
}
