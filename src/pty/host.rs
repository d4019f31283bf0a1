//! Forks the wrapped shell under a PTY and owns the master side of it.
//!
//! Built on `portable-pty` rather than hand-rolled `fork`/`execvp`.
//! Foreground-process-group queries — the same `TIOCGPGRP` the splitter
//! needs — are exposed by `portable-pty`'s `MasterPty::process_group_leader`,
//! so the splitter never has to reach for a raw fd itself.

use std::os::fd::BorrowedFd;
use std::sync::Arc;

use nix::sys::termios::{self, SetArg, Termios};
use parking_lot::Mutex;
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum PtyError {
    #[error("failed to fork/exec shell: {0}")]
    Spawn(String),
    #[error("failed to resize pty: {0}")]
    Resize(String),
}

const STDIN_FD: i32 = 0;

fn stdin_fd() -> BorrowedFd<'static> {
    // SAFETY: fd 0 is valid for the lifetime of the process.
    unsafe { BorrowedFd::borrow_raw(STDIN_FD) }
}

/// A cheap, cloneable handle onto the master's foreground process group,
/// independent of the `&mut PtyHost` the proxy loop holds — so the
/// splitter can query it without aliasing the proxy's borrow.
#[derive(Clone)]
pub struct ForegroundProbe {
    master: Arc<Mutex<Box<dyn MasterPty + Send>>>,
    shell_pid: u32,
}

impl ForegroundProbe {
    pub fn is_shell_foreground(&self) -> bool {
        self.master.lock().process_group_leader() == Some(self.shell_pid as libc::pid_t)
    }
}

/// A cheap, cloneable handle for propagating window-size changes to the
/// master, independent of the `&mut PtyHost` the proxy loop holds — so a
/// `SIGWINCH` handler can run concurrently with the proxy.
#[derive(Clone)]
pub struct ResizeHandle {
    master: Arc<Mutex<Box<dyn MasterPty + Send>>>,
}

impl ResizeHandle {
    pub fn set_window_size(&self, columns: u16, lines: u16) {
        let result = self.master.lock().resize(PtySize {
            rows: lines,
            cols: columns,
            pixel_width: 0,
            pixel_height: 0,
        });
        if let Err(err) = result {
            warn!(%err, "failed to propagate window size to pty");
        }
    }

    pub fn on_sigwinch(&self) {
        let (columns, lines) = parent_window_size();
        self.set_window_size(columns, lines);
    }
}

/// The live wrapped shell: PTY master, child handle, and the parent's
/// saved termios (restored on every exit path).
pub struct PtyHost {
    master: Arc<Mutex<Box<dyn MasterPty + Send>>>,
    child: Box<dyn Child + Send + Sync>,
    shell_pid: u32,
    saved_termios: Option<Termios>,
}

impl PtyHost {
    /// Fork the shell at `shell_path` with `-i` so it starts interactively,
    /// same as an ordinary login shell invocation.
    pub fn spawn(shell_path: &str, columns: u16, lines: u16) -> Result<Self, PtyError> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: lines,
                cols: columns,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::Spawn(e.to_string()))?;

        let shell_name = std::path::Path::new(shell_path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(shell_path);
        let mut cmd = CommandBuilder::new(shell_path);
        cmd.arg0(shell_name);
        cmd.arg("-i");

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| PtyError::Spawn(e.to_string()))?;
        let shell_pid = child.process_id().unwrap_or(0);

        // The slave side is only needed to spawn the child; the host never
        // reads or writes it directly.
        drop(pair.slave);

        Ok(Self {
            master: Arc::new(Mutex::new(pair.master)),
            child,
            shell_pid,
            saved_termios: None,
        })
    }

    pub fn shell_pid(&self) -> u32 {
        self.shell_pid
    }

    pub fn try_clone_reader(&self) -> std::io::Result<Box<dyn std::io::Read + Send>> {
        self.master
            .lock()
            .try_clone_reader()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    pub fn take_writer(&self) -> std::io::Result<Box<dyn std::io::Write + Send>> {
        self.master
            .lock()
            .take_writer()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// A cloneable handle the splitter can use to query the foreground
    /// process group without holding a borrow of this `PtyHost`.
    pub fn foreground_probe(&self) -> ForegroundProbe {
        ForegroundProbe {
            master: self.master.clone(),
            shell_pid: self.shell_pid,
        }
    }

    /// A cloneable handle for propagating window-size changes, usable
    /// concurrently with an exclusive borrow of this `PtyHost`.
    pub fn resize_handle(&self) -> ResizeHandle {
        ResizeHandle { master: self.master.clone() }
    }

    /// True iff no child command is currently in the foreground — i.e.
    /// the shell itself holds the terminal.
    pub fn is_shell_foreground(&self) -> bool {
        self.master.lock().process_group_leader() == Some(self.shell_pid as libc::pid_t)
    }

    /// Propagate `columns`×`lines` to the master. Ioctl failures here are
    /// logged, never fatal.
    pub fn set_window_size(&self, columns: u16, lines: u16) {
        self.resize_handle().set_window_size(columns, lines);
    }

    /// Read the parent's current terminal geometry from stdin (`TIOCGWINSZ`)
    /// and propagate it to the master. Called at startup and on every
    /// `SIGWINCH`.
    pub fn on_sigwinch(&self) {
        self.resize_handle().on_sigwinch();
    }

    /// Put the parent's stdin into raw mode, saving the prior termios for
    /// [`Self::restore_terminal`].
    pub fn set_raw_mode(&mut self) -> Result<(), PtyError> {
        let original = termios::tcgetattr(stdin_fd()).map_err(|e| PtyError::Spawn(e.to_string()))?;
        let mut raw = original.clone();
        termios::cfmakeraw(&mut raw);
        termios::tcsetattr(stdin_fd(), SetArg::TCSANOW, &raw)
            .map_err(|e| PtyError::Spawn(e.to_string()))?;
        self.saved_termios = Some(original);
        Ok(())
    }

    /// Restore the termios captured by [`Self::set_raw_mode`]. Idempotent:
    /// safe to call from every exit path (success, error, panic via
    /// `Drop`) without double-restoring.
    pub fn restore_terminal(&mut self) {
        if let Some(original) = self.saved_termios.take() {
            if let Err(err) = termios::tcsetattr(stdin_fd(), SetArg::TCSAFLUSH, &original) {
                warn!(%err, "failed to restore terminal state");
            }
        }
    }

    pub fn try_wait(&mut self) -> std::io::Result<Option<portable_pty::ExitStatus>> {
        self.child.try_wait()
    }

    pub fn wait(&mut self) -> std::io::Result<portable_pty::ExitStatus> {
        self.child.wait()
    }
}

impl Drop for PtyHost {
    fn drop(&mut self) {
        self.restore_terminal();
    }
}

/// The parent's current terminal geometry, falling back to 80x24 when
/// stdin isn't a tty (e.g. under a test harness or when output is piped).
pub fn parent_window_size() -> (u16, u16) {
    current_window_size().unwrap_or((80, 24))
}

fn current_window_size() -> Option<(u16, u16)> {
    let mut size: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(STDIN_FD, libc::TIOCGWINSZ, &mut size as *mut _) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some((size.ws_col, size.ws_row))
    } else {
        None
    }
}
