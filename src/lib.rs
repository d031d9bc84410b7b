//! winq - thin client for a remote windowing server
//!
//! Speaks the compositor's newline-delimited JSON protocol over one
//! persistent TCP stream: synchronous command/response pairs, asynchronous
//! push events routed to per-window listeners, and an optional local pixel
//! buffer that batches drawing into a single image upload.
//!
//! ```no_run
//! use winq::{App, Color, EventKind, Message, Rect};
//!
//! # async fn run() -> winq::Result<()> {
//! let app = App::connect().await?;
//! app.send_and_wait(Message::app_connect()).await?;
//!
//! let win = app.open_window(Rect::from_ints(50, 50, 300, 200)).await?;
//! win.on(EventKind::MouseDown, |ev| println!("click: {ev:?}"));
//! win.draw_rect(Rect::from_ints(0, 0, 300, 200), Color::rgb(255, 255, 255)).await?;
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod client;
pub mod conn;
pub mod correlate;
pub mod error;
pub mod geom;
pub mod proto;
pub mod window;

pub use buffer::{PixelBuffer, PixelLayout};
pub use client::{App, ClientConfig, DEFAULT_PORT};
pub use error::{Error, Result};
pub use geom::{Color, Rect, Size, WireRect, BLACK, MAGENTA, WHITE};
pub use proto::{DbClause, DbClauseKind, DbObj, Message};
pub use window::{EventKind, Window, WindowEvent};
