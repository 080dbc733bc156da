// src/exec/streams.rs

use std::process::ExitStatus;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::engine::{LineEvent, SupervisorEvent};
use crate::protocol::{DecodedLine, LineDecoder};
use crate::types::StreamSource;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Attach a reader task to one of the engine's output streams.
///
/// This is a fire-and-forget function: the spawned task emits one
/// `SupervisorEvent::Line` (or `DecodeFailed`) per line, in arrival order,
/// followed by exactly one `StreamClosed` at end of stream.
pub fn spawn_stream_reader<R>(
    reader: R,
    source: StreamSource,
    events: mpsc::Sender<SupervisorEvent>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        read_stream(reader, source, &events).await;
        debug!(source = %source, "stream reader ended");
        let _ = events.send(SupervisorEvent::StreamClosed(source)).await;
    })
}

/// Read `reader` to the end, forwarding every decoded line.
///
/// Reads are chunked; the [`LineDecoder`] reassembles lines that straddle
/// chunk boundaries. Stops early if the coordinator has gone away.
pub async fn read_stream<R>(
    mut reader: R,
    source: StreamSource,
    events: &mpsc::Sender<SupervisorEvent>,
) where
    R: AsyncRead + Unpin,
{
    let mut decoder = LineDecoder::new(source);
    let mut buf = vec![0u8; READ_CHUNK_SIZE];

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!(source = %source, error = %e, "error reading engine output; treating as end of stream");
                break;
            }
        };

        for line in decoder.push(&buf[..n]) {
            if !forward(line, source, events).await {
                return;
            }
        }
    }

    if let Some(line) = decoder.finish() {
        forward(line, source, events).await;
    }
}

async fn forward(
    line: DecodedLine,
    source: StreamSource,
    events: &mpsc::Sender<SupervisorEvent>,
) -> bool {
    let event = match line {
        Ok(line) => SupervisorEvent::Line(LineEvent { source, line }),
        Err(e) => SupervisorEvent::DecodeFailed(e),
    };
    events.send(event).await.is_ok()
}

/// Wait for the engine to exit and report its code.
///
/// Either the process exits on its own (normal case), or a kill is requested
/// through `kill_rx` (shutdown), in which case the process is killed and
/// then reaped as usual. A dropped `kill_rx` sender does not kill anything.
pub fn spawn_exit_waiter(
    mut child: Child,
    mut kill_rx: oneshot::Receiver<()>,
    events: mpsc::Sender<SupervisorEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let status = tokio::select! {
            status = child.wait() => status,
            kill = &mut kill_rx => {
                if kill.is_ok() {
                    info!("killing engine process");
                    if let Err(e) = child.start_kill() {
                        warn!(error = %e, "failed to kill engine process");
                    }
                }
                child.wait().await
            }
        };

        let code = match status {
            Ok(status) => exit_code_of(status),
            Err(e) => {
                error!(error = %e, "failed to wait for engine process");
                None
            }
        };

        let _ = events.send(SupervisorEvent::Exited { code }).await;
    })
}

/// Exit code of a finished process; `None` when terminated by a signal.
pub fn exit_code_of(status: ExitStatus) -> Option<i32> {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            info!(signal, "engine terminated by signal");
        }
    }
    status.code()
}
