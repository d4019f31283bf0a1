//! Library surface for the `betterhist` binary: wraps a shell in a PTY,
//! splits its I/O into command epochs, renders each through a small VT
//! emulator, and serves the resulting history over a loopback HTTP API.

pub mod auth;
pub mod client;
pub mod config;
pub mod http;
pub mod pty;
pub mod render_md;
pub mod session;
pub mod splitter;
pub mod store;
pub mod vt;

/// The store/route name every session publishes itself under. A single
/// wrapped shell per process is the only scenario this tool handles, so
/// one fixed name is simpler than a user-facing naming scheme.
pub const DEFAULT_LIST_NAME: &str = "history";
