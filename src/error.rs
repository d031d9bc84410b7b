//! Error taxonomy for the public API
//!
//! Transport and parse failures that the library contains internally
//! (malformed inbound messages, events for unknown windows) are logged and
//! dropped per protocol policy and deliberately have no variant here.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level connect failure: refused, unreachable, timed out.
    #[error("failed to connect: {0}")]
    Connect(#[source] io::Error),

    /// Send or wait attempted after the connection went away.
    #[error("connection closed")]
    ConnectionClosed,

    /// No reply arrived within the configured request timeout.
    #[error("request timed out")]
    Timeout,

    /// A rect with a NaN component was passed to a draw call.
    #[error("invalid rect: NaN coordinate")]
    InvalidRect,

    /// Operation on a window that is already closed.
    #[error("window is closed")]
    WindowClosed,

    /// The server answered a typed request with the wrong message kind.
    #[error("unexpected reply: wanted {0}")]
    UnexpectedReply(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
