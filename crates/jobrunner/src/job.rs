use crate::error::JobError;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncWrite, DuplexStream};
use tokio_util::sync::CancellationToken;

/// Shared slot holding the write half of a job's output pipe.
///
/// `JobShared` keeps its own `Arc` to this slot alongside the one handed
/// to the job's `Writer`, so the pipe can be closed from the `Runner`
/// side — `stop`/`close`, or the task driving `Job::start` to completion —
/// independent of whatever the job is doing with its own copy (spec.md
/// §3: the writer endpoint is owned by the `JobRecord`, not the job;
/// "closed to signal stop").
pub(crate) type WriterSlot = Arc<Mutex<Option<DuplexStream>>>;

/// The writer half of a job's output pipe. A [`Job`] implementation writes
/// its output to this end; the collector task reads from the other end.
///
/// Unlike a plain owned pipe half, closing this endpoint is not solely in
/// the job's hands: the slot backing it is shared with the `JobRecord`, so
/// `Runner::stop`/`Runner::close` can force it closed — and the task that
/// drives `Job::start` closes it once that future returns — regardless of
/// whether the job itself ever drops its `Writer`. Once closed, further
/// writes fail with `ErrorKind::BrokenPipe` instead of panicking or
/// blocking forever.
#[derive(Clone)]
pub struct Writer {
    slot: WriterSlot,
}

impl Writer {
    pub(crate) fn new(slot: WriterSlot) -> Self {
        Self { slot }
    }
}

impl AsyncWrite for Writer {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let mut guard = self.slot.lock().unwrap();
        match guard.as_mut() {
            Some(stream) => Pin::new(stream).poll_write(cx, buf),
            None => Poll::Ready(Err(io::Error::from(io::ErrorKind::BrokenPipe))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let mut guard = self.slot.lock().unwrap();
        match guard.as_mut() {
            Some(stream) => Pin::new(stream).poll_flush(cx),
            None => Poll::Ready(Ok(())),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let mut guard = self.slot.lock().unwrap();
        match guard.as_mut() {
            Some(stream) => Pin::new(stream).poll_shutdown(cx),
            None => Poll::Ready(Ok(())),
        }
    }
}

/// A caller-supplied unit of work whose output this crate captures.
///
/// The core never inspects what a job does — only that it writes its
/// output to `writer` and eventually returns. `start` and `stop` are native
/// `async fn`s (no `async-trait` macro needed on current stable Rust); since
/// that makes `Job` non-object-safe, `Runner` instead holds trait objects
/// through [`JobBoxed`], implemented automatically for every `Job` via the
/// blanket impl below.
pub trait Job: Send + Sync + 'static {
    /// Runs the job to completion, writing output to `writer` as it
    /// becomes available. Returning signals the job is finished; the
    /// `Runner` closes the underlying pipe once this future resolves (or
    /// earlier, if `Runner::stop` requested termination first), which is
    /// what lets the collector observe EOF — implementations need not
    /// explicitly close or drop `writer` themselves.
    fn start(
        &self,
        ctx: CancellationToken,
        writer: Writer,
    ) -> impl Future<Output = Result<(), JobError>> + Send;

    /// Requests the job stop. What this means is entirely up to the
    /// implementation (sending a signal, cancelling an inner future,
    /// closing a socket); the core only calls it and awaits the result.
    fn stop(&self, ctx: CancellationToken) -> impl Future<Output = Result<(), JobError>> + Send;
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe counterpart of [`Job`], so `Runner` can hold `Arc<dyn
/// JobBoxed>` without making every call site generic over a concrete `Job`
/// type. Implemented for every `Job` by the blanket impl below; callers
/// implement `Job`, never `JobBoxed` directly.
pub trait JobBoxed: Send + Sync + 'static {
    fn start_boxed<'a>(
        &'a self,
        ctx: CancellationToken,
        writer: Writer,
    ) -> BoxFuture<'a, Result<(), JobError>>;

    fn stop_boxed<'a>(&'a self, ctx: CancellationToken) -> BoxFuture<'a, Result<(), JobError>>;
}

impl<T: Job> JobBoxed for T {
    fn start_boxed<'a>(
        &'a self,
        ctx: CancellationToken,
        writer: Writer,
    ) -> BoxFuture<'a, Result<(), JobError>> {
        Box::pin(self.start(ctx, writer))
    }

    fn stop_boxed<'a>(&'a self, ctx: CancellationToken) -> BoxFuture<'a, Result<(), JobError>> {
        Box::pin(self.stop(ctx))
    }
}
