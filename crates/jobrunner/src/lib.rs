//! Supervises long-running, output-producing jobs: captures their streaming
//! output into per-job ring buffers and fans it out to any number of
//! independent tailing consumers, including consumers that attach late or
//! after the job has already terminated.
//!
//! Process spawning, remote transport of output, persistence across
//! restarts, and auth/quotas/scheduling are out of scope — a [`Job`] is
//! whatever the caller wants it to be, as long as it writes bytes to the
//! pipe it's handed and eventually returns.
//!
//! This crate emits [`tracing`] events on job lifecycle transitions but
//! does not install a subscriber; wire one up with `tracing-subscriber` in
//! the binary that embeds it.

mod broadcaster;
mod collector;
mod config;
mod error;
mod invariants;
mod job;
mod lru;
mod record;
pub mod ring;
mod runner;
mod stream;

pub use config::RunnerConfig;
pub use error::{JobError, RunnerError};
pub use job::{Job, JobBoxed, Writer};
pub use ring::RingBuffer;
pub use runner::{new_runner, Runner};
pub use stream::ByteStream;

use std::fmt;
use std::time::SystemTime;
use uuid::Uuid;

/// Opaque identifier for a job, rendered as a lowercase hex UUID (v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a fresh, random job id.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// A point-in-time snapshot of a job's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// The job this status describes.
    pub id: JobId,
    /// Whether the job is currently running.
    pub running: bool,
    /// When the job was started.
    pub started_at: SystemTime,
    /// When the job stopped, if it has.
    pub stopped_at: Option<SystemTime>,
}
