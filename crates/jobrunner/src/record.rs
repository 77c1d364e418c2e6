use crate::broadcaster::Broadcaster;
use crate::invariants::{
    debug_assert_no_append_after_stop, debug_assert_started_before_stopped,
    debug_assert_stopped_once,
};
use crate::job::{JobBoxed, WriterSlot};
use crate::ring::RingBuffer;
use crate::{JobId, Status};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

struct Inner {
    buffer: RingBuffer,
    stopped_at: Option<SystemTime>,
}

/// The shared state backing one job: identity, lifecycle flags, its output
/// ring buffer, the writer endpoint of its pipe, and the wakeup used to
/// notify tailing readers. Held behind an `Arc` so the `Runner`'s index,
/// the collector task, and every live `ByteStream` can all reach it
/// independently.
pub(crate) struct JobShared {
    pub(crate) id: JobId,
    pub(crate) started_at: SystemTime,
    pub(crate) running: AtomicBool,
    pub(crate) wakeup: Broadcaster,
    pub(crate) job: Arc<dyn JobBoxed>,
    writer: WriterSlot,
    inner: Mutex<Inner>,
}

impl JobShared {
    pub(crate) fn new(
        id: JobId,
        job: Arc<dyn JobBoxed>,
        ring_capacity: usize,
        writer: WriterSlot,
    ) -> Result<Arc<Self>, crate::RunnerError> {
        let buffer = RingBuffer::new(ring_capacity)?;
        Ok(Arc::new(Self {
            id,
            started_at: SystemTime::now(),
            running: AtomicBool::new(false),
            wakeup: Broadcaster::new(),
            job,
            writer,
            inner: Mutex::new(Inner {
                buffer,
                stopped_at: None,
            }),
        }))
    }

    /// Closes this job's writer endpoint, if it isn't already closed
    /// (spec.md §3: "writer ... closed to signal stop"). Idempotent: the
    /// task driving `Job::start` to completion and `Runner::stop`/`close`
    /// may both reach this for the same job, and only the first call has
    /// any effect.
    pub(crate) fn close_writer(&self) {
        self.writer.lock().unwrap().take();
    }

    pub(crate) fn set_running(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Appends freshly-read bytes to the ring buffer and wakes every
    /// tailing reader. Called only by this job's collector task.
    pub(crate) fn append(&self, bytes: &[u8]) {
        debug_assert_no_append_after_stop!(self.is_running());
        {
            let mut inner = self.inner.lock().unwrap();
            inner.buffer.write(bytes);
        }
        self.wakeup.broadcast();
    }

    /// Marks the job stopped and wakes every tailing reader a final time so
    /// they observe EOF.
    pub(crate) fn mark_stopped(&self) {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        let now = SystemTime::now();
        {
            let mut inner = self.inner.lock().unwrap();
            debug_assert_stopped_once!(was_running, inner.stopped_at.is_none());
            debug_assert_started_before_stopped!(self.started_at, now);
            inner.stopped_at.get_or_insert(now);
        }
        self.wakeup.broadcast();
    }

    pub(crate) fn offset(&self) -> u64 {
        self.inner.lock().unwrap().buffer.offset()
    }

    pub(crate) fn read_offset(&self, off: u64) -> (Vec<u8>, u64) {
        self.inner.lock().unwrap().buffer.read_offset(off)
    }

    pub(crate) fn status(&self) -> Status {
        let inner = self.inner.lock().unwrap();
        Status {
            id: self.id,
            running: self.is_running(),
            started_at: self.started_at,
            stopped_at: inner.stopped_at,
        }
    }
}
