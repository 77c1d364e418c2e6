use crate::record::JobShared;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, DuplexStream};
use tracing::{debug, warn};

/// Reads a job's output until EOF, appending every chunk to the job's ring
/// buffer and broadcasting after each append (spec.md §4.4.1).
///
/// Runs as its own `tokio::spawn`ed task for the lifetime of the job: one
/// collector per job, reading from the reader half of the `tokio::io::
/// duplex` pipe whose writer half is shared between the job's `Writer`
/// handle and this job's `JobShared`. The task driving `Job::start` to
/// completion closes that writer once `start` returns, and
/// `Runner::stop`/`close` can force it closed earlier — either is what
/// ends this loop with EOF.
pub(crate) async fn run(shared: Arc<JobShared>, mut reader: DuplexStream, read_size: usize) {
    shared.set_running();
    shared.wakeup.broadcast();
    debug!(job_id = %shared.id, "collector started");

    let mut buf = vec![0u8; read_size];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => shared.append(&buf[..n]),
            Err(err) => {
                warn!(job_id = %shared.id, error = %err, "collector read failed, stopping");
                break;
            }
        }
    }

    shared.mark_stopped();
    debug!(job_id = %shared.id, "collector stopped");
}
