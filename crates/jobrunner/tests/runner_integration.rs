use jobrunner::{new_runner, Job, JobError, RunnerConfig, RunnerError, Writer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

/// Writes a fixed set of lines on an interval, then returns. Used to drive
/// the streaming/tailing scenarios deterministically with `tokio::time`.
struct LineEmitter {
    lines: Vec<&'static str>,
    interval: Duration,
}

impl Job for LineEmitter {
    async fn start(&self, _ctx: CancellationToken, mut writer: Writer) -> Result<(), JobError> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.tick().await; // first tick fires immediately
        for line in &self.lines {
            writer.write_all(line.as_bytes()).await?;
            ticker.tick().await;
        }
        Ok(())
    }

    async fn stop(&self, _ctx: CancellationToken) -> Result<(), JobError> {
        Ok(())
    }
}

/// Writes one chunk and returns immediately, dropping its writer.
struct InstantJob(&'static [u8]);

impl Job for InstantJob {
    async fn start(&self, _ctx: CancellationToken, mut writer: Writer) -> Result<(), JobError> {
        writer.write_all(self.0).await?;
        Ok(())
    }

    async fn stop(&self, _ctx: CancellationToken) -> Result<(), JobError> {
        Ok(())
    }
}

/// Never produces output on its own; stays "running" until `stop` is
/// called, at which point it drops its writer.
struct HangingJob {
    stopped: Arc<AtomicBool>,
}

impl Job for HangingJob {
    async fn start(&self, ctx: CancellationToken, writer: Writer) -> Result<(), JobError> {
        ctx.cancelled().await;
        drop(writer);
        Ok(())
    }

    async fn stop(&self, _ctx: CancellationToken) -> Result<(), JobError> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// `stop` always fails; used to test that `Runner::stop`/`close` surface
/// the job's own error.
struct FailingStopJob;

impl Job for FailingStopJob {
    async fn start(&self, ctx: CancellationToken, writer: Writer) -> Result<(), JobError> {
        ctx.cancelled().await;
        drop(writer);
        Ok(())
    }

    async fn stop(&self, _ctx: CancellationToken) -> Result<(), JobError> {
        Err("stop always fails in this job".into())
    }
}

#[tokio::test]
async fn run_registers_and_collects_output() {
    let runner = new_runner(RunnerConfig::default());
    let id = runner
        .run(CancellationToken::new(), Arc::new(InstantJob(b"hello")))
        .await
        .unwrap();

    // give the spawned start() task a chance to write and return.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let status = runner.status(id).unwrap();
    assert_eq!(status.id, id);

    let mut reader = runner.new_reader(id).await.unwrap();
    let mut out = Vec::new();
    reader.read_to_end(&mut out).await.unwrap();
    assert_eq!(out, b"hello");
}

#[tokio::test]
async fn new_reader_on_unknown_id_is_not_found() {
    let runner = new_runner(RunnerConfig::default());
    let id = runner
        .run(CancellationToken::new(), Arc::new(InstantJob(b"x")))
        .await
        .unwrap();
    // spin up and immediately evict by constructing a tiny-capacity runner instead
    let tiny = new_runner(RunnerConfig::new(1, 1024, 64, Duration::from_millis(10)));
    let evicted_id = tiny
        .run(CancellationToken::new(), Arc::new(InstantJob(b"a")))
        .await
        .unwrap();
    tiny.run(CancellationToken::new(), Arc::new(InstantJob(b"b")))
        .await
        .unwrap();

    assert!(matches!(
        tiny.new_reader(evicted_id).await,
        Err(RunnerError::JobNotFound(_))
    ));
    // the original runner is unaffected
    assert!(runner.status(id).is_some());
}

#[tokio::test]
async fn late_joining_reader_sees_full_retained_history() {
    let runner = new_runner(RunnerConfig::default());
    let id = runner
        .run(CancellationToken::new(), Arc::new(InstantJob(b"already written")))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let mut reader = runner.new_reader(id).await.unwrap();
    let mut out = Vec::new();
    reader.read_to_end(&mut out).await.unwrap();
    assert_eq!(out, b"already written");
}

#[tokio::test]
async fn multiple_readers_each_see_the_full_stream() {
    let runner = new_runner(RunnerConfig::default());
    let id = runner
        .run(
            CancellationToken::new(),
            Arc::new(LineEmitter {
                lines: vec!["a", "b", "c"],
                interval: Duration::from_millis(5),
            }),
        )
        .await
        .unwrap();

    let mut r1 = runner.new_reader(id).await.unwrap();
    let mut r2 = runner.new_reader(id).await.unwrap();

    let mut out1 = Vec::new();
    let mut out2 = Vec::new();
    let (res1, res2) = tokio::join!(r1.read_to_end(&mut out1), r2.read_to_end(&mut out2));
    res1.unwrap();
    res2.unwrap();

    assert_eq!(out1, b"abc");
    assert_eq!(out2, b"abc");
}

#[tokio::test]
async fn stop_invokes_job_stop_and_unblocks_readers() {
    let runner = new_runner(RunnerConfig::default());
    let stopped = Arc::new(AtomicBool::new(false));
    let id = runner
        .run(
            CancellationToken::new(),
            Arc::new(HangingJob {
                stopped: Arc::clone(&stopped),
            }),
        )
        .await
        .unwrap();

    assert!(runner.status(id).is_some());

    runner.stop(CancellationToken::new(), id).await.unwrap();
    assert!(stopped.load(Ordering::SeqCst));

    // HangingJob::start never returns on its own (it awaits the token
    // passed to `run`, which nothing here cancels); stop() must force the
    // writer closed itself for the collector to observe EOF.
    tokio::time::sleep(Duration::from_millis(20)).await;
    let status = runner.status(id).unwrap();
    assert!(!status.running);
    assert!(status.stopped_at.is_some());
}

#[tokio::test]
async fn stop_on_already_stopped_job_is_rejected() {
    let runner = new_runner(RunnerConfig::default());
    let id = runner
        .run(CancellationToken::new(), Arc::new(InstantJob(b"done")))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(matches!(
        runner.stop(CancellationToken::new(), id).await,
        Err(RunnerError::JobNotRunning(_))
    ));
}

#[tokio::test]
async fn stop_propagates_the_jobs_own_error() {
    let runner = new_runner(RunnerConfig::default());
    let id = runner
        .run(CancellationToken::new(), Arc::new(FailingStopJob))
        .await
        .unwrap();

    let err = runner.stop(CancellationToken::new(), id).await.unwrap_err();
    match err {
        RunnerError::Job { id: failed_id, .. } => assert_eq!(failed_id, id),
        other => panic!("expected RunnerError::Job, got {other:?}"),
    }
}

#[tokio::test]
async fn close_stops_every_running_job() {
    let runner = new_runner(RunnerConfig::default());
    let stopped_a = Arc::new(AtomicBool::new(false));
    let stopped_b = Arc::new(AtomicBool::new(false));

    runner
        .run(
            CancellationToken::new(),
            Arc::new(HangingJob {
                stopped: Arc::clone(&stopped_a),
            }),
        )
        .await
        .unwrap();
    runner
        .run(
            CancellationToken::new(),
            Arc::new(HangingJob {
                stopped: Arc::clone(&stopped_b),
            }),
        )
        .await
        .unwrap();
    runner
        .run(CancellationToken::new(), Arc::new(InstantJob(b"already done")))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    runner.close(CancellationToken::new()).await.unwrap();

    assert!(stopped_a.load(Ordering::SeqCst));
    assert!(stopped_b.load(Ordering::SeqCst));
}

#[tokio::test]
async fn list_reports_every_job_in_the_index() {
    let runner = new_runner(RunnerConfig::default());
    let id1 = runner
        .run(CancellationToken::new(), Arc::new(InstantJob(b"1")))
        .await
        .unwrap();
    let id2 = runner
        .run(CancellationToken::new(), Arc::new(InstantJob(b"2")))
        .await
        .unwrap();

    let ids: Vec<_> = runner.list().into_iter().map(|s| s.id).collect();
    assert!(ids.contains(&id1));
    assert!(ids.contains(&id2));
}

#[tokio::test]
async fn run_rejects_an_already_cancelled_context() {
    let runner = new_runner(RunnerConfig::default());
    let ctx = CancellationToken::new();
    ctx.cancel();

    let err = runner.run(ctx, Arc::new(InstantJob(b"x"))).await.unwrap_err();
    assert!(matches!(err, RunnerError::Cancelled));
}
