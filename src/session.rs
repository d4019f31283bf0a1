//! Wires the PTY host, splitter, renderer, store, and HTTP frontend into
//! one running session: spawn the shell, run the byte proxy and a
//! dequeue loop concurrently, register `SIGWINCH`, and run until the
//! shell exits.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{info, warn};

use crate::auth::AuthToken;
use crate::http::{self, Frontend};
use crate::pty::{self, PtyHost};
use crate::splitter::{Epoch, StreamSplitter};
use crate::store::{Snapshot, SnapshotStore};
use crate::vt;

/// Everything needed to start a wrapped session.
pub struct SessionConfig {
    pub name: String,
    pub shell_path: String,
}

/// Fork the shell, stand up the history store and HTTP frontend, and run
/// the proxy loop to completion. Returns the shell's exit code.
pub async fn run(config: SessionConfig) -> anyhow::Result<i32> {
    let store = Arc::new(SnapshotStore::new(config.name.clone()));
    let token = AuthToken::generate();

    let frontend = http::serve(config.name.clone(), store.clone(), token.clone()).await?;
    publish_handoff_env(&frontend, &token);

    let (columns, lines) = pty::parent_window_size();
    let mut host = PtyHost::spawn(&config.shell_path, columns, lines)?;
    info!(pid = host.shell_pid(), %columns, %lines, "wrapped shell started");

    let foreground_probe = host.foreground_probe();
    let resize_handle = host.resize_handle();

    let (epoch_tx, epoch_rx) = mpsc::unbounded_channel::<Epoch>();
    let splitter = Rc::new(RefCell::new(StreamSplitter::new(
        move || foreground_probe.is_shell_foreground(),
        epoch_tx,
    )));

    let dequeue = tokio::spawn(dequeue_epochs(epoch_rx, store.clone()));

    #[cfg(unix)]
    let sigwinch = tokio::spawn(watch_sigwinch(resize_handle));

    let on_master = splitter.clone();
    let on_stdin = splitter.clone();
    let on_idle = splitter.clone();

    let outcome = pty::run_proxy(
        &mut host,
        |data| {
            on_master.borrow_mut().on_master_data(data);
            true
        },
        |data| {
            on_stdin.borrow_mut().on_stdin_data(data);
            true
        },
        || on_idle.borrow_mut().on_idle(),
    )
    .await?;

    #[cfg(unix)]
    sigwinch.abort();

    drop(splitter);
    dequeue.await.ok();

    frontend.shutdown().await;

    Ok(outcome
        .exit_status
        .map(|status| status.exit_code() as i32)
        .unwrap_or(1))
}

/// Publish the server URL and token into the environment before the
/// wrapped shell forks, so a sibling `betterhist get` run from inside it
/// can find this session.
fn publish_handoff_env(frontend: &Frontend, token: &AuthToken) {
    std::env::set_var(
        crate::auth::SERVER_ENV_VAR,
        format!("http://127.0.0.1:{}", frontend.port),
    );
    std::env::set_var(crate::auth::AUTH_ENV_VAR, token.as_str());
}

/// Drain completed `(user, command)` epochs, render each to text at the
/// geometry active when it was captured, and append it to the store.
///
/// Rendering runs on the blocking-task pool rather than inline on this
/// task: it's pure CPU work, and keeping it off the async task lets the
/// dequeue loop keep draining the channel while a large buffer renders.
async fn dequeue_epochs(mut epoch_rx: UnboundedReceiver<Epoch>, store: Arc<SnapshotStore>) {
    while let Some((user_buffer, command_buffer)) = epoch_rx.recv().await {
        let (columns, lines) = pty::parent_window_size();
        let timestamp = wall_clock_seconds();
        let store = store.clone();

        let rendered = tokio::task::spawn_blocking(move || {
            let user_view = vt::render(&user_buffer, columns, lines);
            let command_view = vt::render(&command_buffer, columns, lines);
            (user_view, command_view)
        })
        .await;

        let (user_view, command_view) = match rendered {
            Ok(views) => views,
            Err(err) => {
                warn!(%err, "render task panicked, dropping epoch");
                continue;
            }
        };

        store.append(Snapshot {
            timestamp,
            columns,
            lines,
            user_view,
            command_view,
        });
    }
}

fn wall_clock_seconds() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(unix)]
async fn watch_sigwinch(resize_handle: pty::ResizeHandle) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut stream = match signal(SignalKind::window_change()) {
        Ok(stream) => stream,
        Err(err) => {
            warn!(%err, "failed to register SIGWINCH handler");
            return;
        }
    };
    loop {
        stream.recv().await;
        resize_handle.on_sigwinch();
    }
}
