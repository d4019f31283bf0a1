//! The stream splitter: a synchronous two-state machine that partitions
//! proxied stdin/master traffic into alternating `(user_bytes,
//! command_bytes)` epochs.
//!
//! Master-side bytes accumulate into a single working buffer regardless
//! of state; stdin bytes are never themselves appended (the terminal's
//! own echo, arriving back over the master, is what ends up in the
//! rendered view). State transitions are driven by a caller-supplied
//! `is_shell_foreground` predicate plus an explicit carriage return on
//! stdin.

use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    WaitForUser,
    WaitForCommand,
}

/// One emitted `(user, command)` epoch pair.
pub type Epoch = (Vec<u8>, Vec<u8>);

/// Partitions byte arrivals into alternating user-input/command-output
/// epochs. Pure and synchronous: all I/O (the foreground-pgrp check) is
/// injected through `is_shell_foreground`, and the only side effect is
/// pushing completed epochs onto `emit`.
pub struct StreamSplitter<F>
where
    F: FnMut() -> bool,
{
    state: State,
    buffer: Vec<u8>,
    pending_user_buffer: Option<Vec<u8>>,
    is_shell_foreground: F,
    emit: UnboundedSender<Epoch>,
}

impl<F> StreamSplitter<F>
where
    F: FnMut() -> bool,
{
    pub fn new(is_shell_foreground: F, emit: UnboundedSender<Epoch>) -> Self {
        Self {
            state: State::WaitForUser,
            buffer: Vec::new(),
            pending_user_buffer: None,
            is_shell_foreground,
            emit,
        }
    }

    fn transition_user_to_command(&mut self) {
        if self.state == State::WaitForUser {
            self.state = State::WaitForCommand;
            self.pending_user_buffer = Some(std::mem::take(&mut self.buffer));
        }
    }

    fn transition_command_to_user(&mut self) {
        if self.state == State::WaitForCommand {
            self.state = State::WaitForUser;
            let command_buffer = std::mem::take(&mut self.buffer);
            let user_buffer = self.pending_user_buffer.take().unwrap_or_default();
            // The receiver only disconnects at shutdown, once nothing will
            // observe further epochs; dropping one in that window is fine.
            let _ = self.emit.send((user_buffer, command_buffer));
        }
    }

    /// The shell produced output: `data` is appended to the working buffer
    /// regardless of state, then, if the shell has returned to the
    /// foreground while we were waiting for its output, the epoch closes.
    pub fn on_master_data(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        if self.state == State::WaitForCommand && (self.is_shell_foreground)() {
            self.transition_command_to_user();
        }
    }

    /// The user typed `data`.
    pub fn on_stdin_data(&mut self, data: &[u8]) {
        if self.state == State::WaitForCommand && (self.is_shell_foreground)() {
            self.transition_command_to_user();
        }

        if self.state == State::WaitForUser {
            if data.contains(&b'\r') {
                self.transition_user_to_command();
            } else if !(self.is_shell_foreground)() {
                self.transition_user_to_command();
            }
        }
    }

    /// Called on a periodic idle tick (no bytes flowed this tick).
    pub fn on_idle(&mut self) {
        if self.state == State::WaitForCommand && (self.is_shell_foreground)() {
            self.transition_command_to_user();
        }
    }
}
