//! The byte proxy: pumps stdin↔master, invoking observer callbacks on each
//! chunk before forwarding it, and polls the child so shell exit ends the
//! loop promptly.
//!
//! PTY file descriptors don't play well with tokio's native epoll-based
//! readiness (they're not always pollable the way sockets are), so each
//! direction's blocking read lives on its own OS thread and pushes chunks
//! back to the async loop over a channel; the async loop itself only
//! awaits channel receives, writes, and a periodic tick. This keeps the
//! "one loop owns the fds and the splitter state" invariant intact even
//! though the reads themselves are not non-blocking syscalls.

use std::io::{Read, Write};
use std::time::Duration;

use portable_pty::ExitStatus;
use tokio::sync::mpsc;
use tracing::error;

use super::PtyHost;

/// Main-loop / idle cadence: keep this low enough that a dead child is
/// noticed within a couple hundred milliseconds even with no I/O.
const TICK_INTERVAL: Duration = Duration::from_millis(100);
const READ_CHUNK_SIZE: usize = 4096;

pub struct ProxyOutcome {
    pub exit_status: Option<ExitStatus>,
}

enum ReadEvent {
    Data(Vec<u8>),
    Closed,
}

fn spawn_reader(mut reader: Box<dyn Read + Send>) -> mpsc::Receiver<ReadEvent> {
    let (tx, rx) = mpsc::channel(64);
    tokio::task::spawn_blocking(move || {
        let mut buf = [0u8; READ_CHUNK_SIZE];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => {
                    let _ = tx.blocking_send(ReadEvent::Closed);
                    break;
                }
                Ok(n) => {
                    if tx.blocking_send(ReadEvent::Data(buf[..n].to_vec())).is_err() {
                        break;
                    }
                }
                Err(_) => {
                    let _ = tx.blocking_send(ReadEvent::Closed);
                    break;
                }
            }
        }
    });
    rx
}

fn spawn_writer(mut writer: Box<dyn Write + Send>) -> mpsc::Sender<Vec<u8>> {
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(64);
    tokio::task::spawn_blocking(move || {
        while let Some(data) = rx.blocking_recv() {
            if writer.write_all(&data).is_err() {
                break;
            }
            let _ = writer.flush();
        }
    });
    tx
}

/// Run the proxy loop until the child shell exits or either side closes.
///
/// `on_master_data`/`on_stdin_data` are invoked with each newly-read chunk
/// before it is forwarded to the opposite fd; returning `false` from
/// either is an `ObserverRejected` request to shut down gracefully.
/// `on_idle` runs on the ~100ms tick whenever no bytes flowed that tick —
/// it is how a silent child exit (or the splitter's own foreground
/// transition) gets noticed promptly even without further I/O.
pub async fn run_proxy<FM, FS, FI>(
    host: &mut PtyHost,
    mut on_master_data: FM,
    mut on_stdin_data: FS,
    mut on_idle: FI,
) -> std::io::Result<ProxyOutcome>
where
    FM: FnMut(&[u8]) -> bool,
    FS: FnMut(&[u8]) -> bool,
    FI: FnMut(),
{
    host.set_raw_mode().map_err(std::io::Error::other)?;

    let master_reader = host.try_clone_reader()?;
    let master_writer = host.take_writer()?;

    let mut master_rx = spawn_reader(master_reader);
    let mut stdin_rx = spawn_reader(Box::new(std::io::stdin()));
    let master_tx = spawn_writer(master_writer);
    let stdout_tx = spawn_writer(Box::new(std::io::stdout()));

    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let outcome = loop {
        tokio::select! {
            biased;

            event = stdin_rx.recv() => {
                match event {
                    Some(ReadEvent::Data(data)) => {
                        if !on_stdin_data(&data) || master_tx.send(data).await.is_err() {
                            break ProxyOutcome { exit_status: wait_for_child(host) };
                        }
                    }
                    Some(ReadEvent::Closed) | None => {
                        break ProxyOutcome { exit_status: wait_for_child(host) };
                    }
                }
            }

            event = master_rx.recv() => {
                match event {
                    Some(ReadEvent::Data(data)) => {
                        if !on_master_data(&data) || stdout_tx.send(data).await.is_err() {
                            break ProxyOutcome { exit_status: wait_for_child(host) };
                        }
                    }
                    Some(ReadEvent::Closed) | None => {
                        break ProxyOutcome { exit_status: wait_for_child(host) };
                    }
                }
            }

            _ = ticker.tick() => {
                match host.try_wait() {
                    Ok(Some(status)) => break ProxyOutcome { exit_status: Some(status) },
                    Ok(None) => on_idle(),
                    Err(err) => {
                        error!(%err, "failed to poll child status");
                        on_idle();
                    }
                }
            }
        }
    };

    host.restore_terminal();
    Ok(outcome)
}

fn wait_for_child(host: &mut PtyHost) -> Option<ExitStatus> {
    match host.wait() {
        Ok(status) => Some(status),
        Err(err) => {
            error!(%err, "failed to reap child process");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    // The proxy loop requires a real PTY and child process to exercise
    // end-to-end; that's covered by driving a real shell through
    // `PtyHost`/`StreamSplitter` rather than by a unit test here.
    // Unit-testable here: the tick interval is sane and non-zero.
    use super::TICK_INTERVAL;

    #[test]
    fn tick_interval_is_within_the_liveness_budget() {
        assert!(TICK_INTERVAL.as_millis() <= 200);
    }
}
