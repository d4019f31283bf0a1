//! PTY hosting and the bidirectional byte proxy.

mod host;
mod proxy;

pub use host::{parent_window_size, ForegroundProbe, PtyError, PtyHost, ResizeHandle};
pub use proxy::{run_proxy, ProxyOutcome};
