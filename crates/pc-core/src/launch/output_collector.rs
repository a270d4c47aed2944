use crate::{OutputBuffer, OutputStream};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, warn};
use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const READ_CHUNK_BYTES: usize = 4096;

/// Background task copying one child pipe into an `OutputBuffer`.
///
/// The task ends at EOF, on a read error, or when cancelled. A cancelled
/// task hands the still-open pipe back so it can be drained elsewhere.
pub(crate) struct OutputCollector {
    label: String,
    buffer: Arc<Mutex<OutputBuffer>>,
    task: JoinHandle<Option<OutputStream>>,
}

impl OutputCollector {
    pub(crate) fn start(
        label: String,
        stream: OutputStream,
        capacity: usize,
        cancel: CancellationToken,
    ) -> Self {
        let buffer = Arc::new(Mutex::new(OutputBuffer::new(capacity)));
        let task = tokio::spawn(collect(label.clone(), stream, Arc::clone(&buffer), cancel));
        Self {
            label,
            buffer,
            task,
        }
    }

    /// Wait up to `grace` for the task to finish and return what it buffered.
    ///
    /// A pipe handed back by a cancelled task is drained to nowhere in a
    /// detached task, so the child never blocks writing to it.
    pub(crate) async fn join(self, grace: Duration) -> String {
        let Self {
            label,
            buffer,
            mut task,
        } = self;

        match tokio::time::timeout(grace, &mut task).await {
            Ok(Ok(Some(stream))) => drain_detached(stream),
            Ok(Ok(None)) => {}
            Ok(Err(e)) => warn!("Output collector {label} failed: {e}"),
            Err(_) => {
                warn!("Output collector {label} did not finish within {grace:?}");
                task.abort();
            }
        }

        let buffer = buffer.lock().unwrap_or_else(|e| e.into_inner());
        if buffer.dropped() > 0 {
            debug!("Output collector {label} dropped {} bytes", buffer.dropped());
        }
        buffer.contents()
    }
}

async fn collect(
    label: String,
    mut stream: OutputStream,
    buffer: Arc<Mutex<OutputBuffer>>,
    cancel: CancellationToken,
) -> Option<OutputStream> {
    let mut chunk = [0u8; READ_CHUNK_BYTES];
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Some(stream),
            read = stream.read(&mut chunk) => match read {
                Ok(0) => return None,
                Ok(n) => buffer
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(&chunk[..n]),
                Err(e) => {
                    debug!("Output collector {label} stopped reading: {e}");
                    return None;
                }
            },
        }
    }
}

fn drain_detached(mut stream: OutputStream) {
    tokio::spawn(async move {
        let _ = tokio::io::copy(&mut stream, &mut tokio::io::sink()).await;
    });
}
