//! In-memory VT screen emulation used to turn a raw byte epoch into the
//! text a user would actually have seen on screen.

mod renderer;

pub use renderer::render;
