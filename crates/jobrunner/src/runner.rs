use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::job::{JobBoxed, Writer};
use crate::lru::LruIndex;
use crate::record::JobShared;
use crate::stream::{ByteStream, SnapshotStream, TailStream};
use crate::{collector, JobId, Status};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Creates a [`Runner`] with the given configuration.
#[must_use]
pub fn new_runner(config: RunnerConfig) -> Runner {
    Runner::new(config)
}

/// Supervises jobs: owns the bounded index of job records, spawns each
/// job's collector task, and exposes the public operations callers use to
/// start jobs, attach readers, stop jobs, and inspect status.
///
/// A single `std::sync::Mutex` guards the index; it is always locked and
/// released synchronously (never held across an `.await`), so every public
/// method here is safe to call concurrently from any number of tasks.
pub struct Runner {
    jobs: Mutex<LruIndex<JobId, Arc<JobShared>>>,
    config: RunnerConfig,
}

impl Runner {
    /// Creates a runner with the given configuration.
    #[must_use]
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            jobs: Mutex::new(LruIndex::new(config.max_jobs)),
            config,
        }
    }

    /// Starts supervising `job`: allocates it an id, registers its record,
    /// spawns its collector task and `job.start` itself, then waits until
    /// the collector has observed `running = true` or `ctx` is cancelled
    /// (spec.md §4.4 step 6) before returning.
    ///
    /// Registration happens before `job.start` is spawned (spec.md §9): a
    /// reader or `status` call racing with a job that fails instantly will
    /// always find the record, even if it's already stopped by the time
    /// they look.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Cancelled`] if `ctx` is already cancelled when
    /// called, or is cancelled before the collector starts, or
    /// [`RunnerError::InvalidCapacity`] if this runner's configured ring
    /// capacity is zero.
    pub async fn run(
        &self,
        ctx: CancellationToken,
        job: Arc<dyn JobBoxed>,
    ) -> Result<JobId, RunnerError> {
        if ctx.is_cancelled() {
            return Err(RunnerError::Cancelled);
        }

        let id = JobId::new();
        let (writer_stream, reader) = tokio::io::duplex(self.config.collector_read_size);
        let writer_slot = Arc::new(Mutex::new(Some(writer_stream)));
        let shared = JobShared::new(
            id,
            Arc::clone(&job),
            self.config.ring_capacity,
            Arc::clone(&writer_slot),
        )?;

        let evicted = {
            let mut jobs = self.jobs.lock().unwrap();
            jobs.insert(id, Arc::clone(&shared))
        };
        if let Some((evicted_id, _)) = evicted {
            info!(job_id = %evicted_id, "evicted from index to make room for new job");
        }
        info!(job_id = %id, "job submitted");

        tokio::spawn(collector::run(
            Arc::clone(&shared),
            reader,
            self.config.collector_read_size,
        ));

        let start_ctx = ctx.clone();
        let writer = Writer::new(writer_slot);
        let shared_for_start = Arc::clone(&shared);
        tokio::spawn(async move {
            if let Err(err) = job.start_boxed(start_ctx, writer).await {
                warn!(job_id = %id, error = %err, "job start returned an error");
            }
            // The job is done producing output (successfully or not); the
            // writer is ours to close (spec.md §3), independent of whether
            // the job dropped its own `Writer` handle. A no-op if
            // `Runner::stop` already closed it first.
            shared_for_start.close_writer();
        });

        // Wait for the collector to observe running = true. The broadcast
        // it sends on that transition may land before this loop starts
        // waiting, so every iteration re-checks `is_running` first and
        // falls back to the fan-out poll interval as a safety net against
        // the same check-then-register race `TailStream` guards against.
        while !shared.is_running() {
            tokio::select! {
                () = ctx.cancelled() => return Err(RunnerError::Cancelled),
                () = shared.wakeup.wait() => {}
                () = tokio::time::sleep(self.config.fanout_poll_interval) => {}
            }
        }

        Ok(id)
    }

    /// Attaches a reader to a job's output.
    ///
    /// If the job has already stopped, the returned stream is a finite
    /// snapshot of whatever output is still retained. If it is still
    /// running, the returned stream keeps delivering new output — including
    /// output produced after this call — until the job stops.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::JobNotFound`] if `id` is unknown (never
    /// registered, or evicted from the index).
    pub async fn new_reader(&self, id: JobId) -> Result<ByteStream, RunnerError> {
        let shared = self.lookup(id)?;
        debug!(job_id = %id, "reader attached");
        if shared.is_running() {
            Ok(ByteStream::Live(TailStream::new(
                shared,
                0,
                self.config.fanout_poll_interval,
            )))
        } else {
            let (bytes, _) = shared.read_offset(0);
            Ok(ByteStream::Snapshot(SnapshotStream::new(bytes)))
        }
    }

    /// Requests a running job stop: invokes [`crate::Job::stop`], then
    /// closes the job's writer endpoint regardless of whether the job's
    /// own `start` future has returned (spec.md §4.4: "Invoke `job.stop`
    /// ... Close the writer endpoint"). Closing the writer causes the
    /// collector's pipe read to return EOF, which drives the job to the
    /// stopped state even if `start` never returns on its own.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::JobNotFound`] if `id` is unknown, or
    /// [`RunnerError::JobNotRunning`] if the job has already stopped. Any
    /// error `Job::stop` returns is wrapped as [`RunnerError::Job`]; on
    /// that path the writer is left open so the caller can retry.
    pub async fn stop(&self, ctx: CancellationToken, id: JobId) -> Result<(), RunnerError> {
        let shared = self.lookup(id)?;
        if !shared.is_running() {
            return Err(RunnerError::JobNotRunning(id));
        }
        shared
            .job
            .stop_boxed(ctx)
            .await
            .map_err(|err| RunnerError::job(id, err))?;
        shared.close_writer();
        Ok(())
    }

    /// A snapshot of one job's lifecycle state, or `None` if `id` is
    /// unknown.
    #[must_use]
    pub fn status(&self, id: JobId) -> Option<Status> {
        self.jobs.lock().unwrap().get(&id).map(|s| s.status())
    }

    /// A snapshot of every job currently held in the index, in no
    /// particular order. Jobs evicted from the index are not included even
    /// if they are still running.
    #[must_use]
    pub fn list(&self) -> Vec<Status> {
        let mut out = Vec::new();
        self.jobs.lock().unwrap().for_each(|_, shared| {
            out.push(shared.status());
        });
        out
    }

    /// Stops every still-running job currently in the index.
    ///
    /// Stops are issued one at a time; the first error encountered is
    /// returned immediately (wrapped with the offending job's id) and
    /// leaves any remaining running jobs untouched.
    ///
    /// # Errors
    ///
    /// Returns the first error any `Job::stop` call returns, wrapped as
    /// [`RunnerError::Job`].
    pub async fn close(&self, ctx: CancellationToken) -> Result<(), RunnerError> {
        let shareds: Vec<Arc<JobShared>> = {
            let jobs = self.jobs.lock().unwrap();
            let mut v = Vec::new();
            jobs.for_each(|_, shared| v.push(Arc::clone(shared)));
            v
        };

        for shared in shareds {
            if shared.is_running() {
                shared
                    .job
                    .stop_boxed(ctx.clone())
                    .await
                    .map_err(|err| RunnerError::job(shared.id, err))?;
                shared.close_writer();
            }
        }
        Ok(())
    }

    fn lookup(&self, id: JobId) -> Result<Arc<JobShared>, RunnerError> {
        self.jobs
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(RunnerError::JobNotFound(id))
    }
}
