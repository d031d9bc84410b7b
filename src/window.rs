//! Per-window state: bounds, draw mode, listeners, buffered pixel store
//!
//! A [`Window`] is a cheap clone handle over shared state; the router task
//! dispatches into the same handle the application holds. Drawing either
//! goes straight to the wire (immediate mode) or lands in an owned
//! [`PixelBuffer`] until [`Window::flush`] ships the whole thing as one
//! image upload (buffered mode).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::mpsc;
use tracing::debug;

use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};
use crate::geom::{Color, Rect, Size, WireRect};
use crate::proto::{
    DrawImageCommand, DrawRectCommand, Message, OpenWindowResponse, WindowCloseRequest,
};

/// Registry shared between the client façade and its router task.
pub(crate) type WindowMap = Mutex<HashMap<String, Window>>;

pub type Callback = Arc<dyn Fn(&WindowEvent) + Send + Sync>;

/// The kinds of events a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MouseDown,
    MouseUp,
    MouseMove,
    KeyDown,
    Resize,
}

/// Typed payloads delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    MouseDown { x: i32, y: i32 },
    MouseUp { x: i32, y: i32 },
    MouseMove { x: i32, y: i32 },
    KeyDown { key: String, code: String },
    Resize(Size),
}

impl WindowEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WindowEvent::MouseDown { .. } => EventKind::MouseDown,
            WindowEvent::MouseUp { .. } => EventKind::MouseUp,
            WindowEvent::MouseMove { .. } => EventKind::MouseMove,
            WindowEvent::KeyDown { .. } => EventKind::KeyDown,
            WindowEvent::Resize(_) => EventKind::Resize,
        }
    }

    /// Split a window-scoped push message into its target id and payload.
    pub(crate) fn from_message(msg: &Message) -> Option<(String, WindowEvent)> {
        match msg {
            Message::MouseDown(e) => Some((
                e.window_id.clone(),
                WindowEvent::MouseDown { x: e.x, y: e.y },
            )),
            Message::MouseUp(e) => {
                Some((e.window_id.clone(), WindowEvent::MouseUp { x: e.x, y: e.y }))
            }
            Message::MouseMove(e) => Some((
                e.window_id.clone(),
                WindowEvent::MouseMove { x: e.x, y: e.y },
            )),
            Message::KeyDown(e) => Some((
                e.window_id.clone(),
                WindowEvent::KeyDown {
                    key: e.key.clone(),
                    code: e.code.clone(),
                },
            )),
            Message::WindowResized(e) => {
                Some((e.window_id.clone(), WindowEvent::Resize(e.size)))
            }
            _ => None,
        }
    }
}

struct WindowState {
    bounds: WireRect,
    /// `Some` is buffered mode; the buffer always matches `bounds`.
    buffer: Option<PixelBuffer>,
    listeners: HashMap<EventKind, Vec<Callback>>,
    closed: bool,
}

struct WindowInner {
    app_id: String,
    window_id: String,
    window_type: String,
    outbound: mpsc::Sender<Message>,
    registry: Weak<WindowMap>,
    state: Mutex<WindowState>,
}

/// Client-side handle for one remote compositor surface.
#[derive(Clone)]
pub struct Window {
    inner: Arc<WindowInner>,
}

impl Window {
    pub(crate) fn new(
        info: OpenWindowResponse,
        outbound: mpsc::Sender<Message>,
        registry: Weak<WindowMap>,
    ) -> Self {
        Self {
            inner: Arc::new(WindowInner {
                app_id: info.app_id,
                window_id: info.window_id,
                window_type: info.window_type,
                outbound,
                registry,
                state: Mutex::new(WindowState {
                    bounds: info.bounds,
                    buffer: None,
                    listeners: HashMap::new(),
                    closed: false,
                }),
            }),
        }
    }

    pub fn window_id(&self) -> &str {
        &self.inner.window_id
    }

    pub fn window_type(&self) -> &str {
        &self.inner.window_type
    }

    pub fn bounds(&self) -> WireRect {
        self.lock().bounds
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn is_buffered(&self) -> bool {
        self.lock().buffer.is_some()
    }

    /// Switch draw modes. Entering buffered mode allocates a fresh
    /// placeholder-filled buffer sized to the current bounds; leaving it
    /// drops any staged content without sending it.
    pub fn set_buffered(&self, buffered: bool) {
        let mut state = self.lock();
        if buffered && state.buffer.is_none() {
            let b = state.bounds;
            state.buffer = Some(PixelBuffer::new(b.w.max(0) as u32, b.h.max(0) as u32));
        } else if !buffered {
            state.buffer = None;
        }
    }

    /// Register an additional listener. Listeners for a kind fire in
    /// registration order; callbacks run on the router task and must not
    /// block it.
    pub fn on<F>(&self, kind: EventKind, callback: F)
    where
        F: Fn(&WindowEvent) + Send + Sync + 'static,
    {
        self.lock()
            .listeners
            .entry(kind)
            .or_default()
            .push(Arc::new(callback));
    }

    /// Paint a filled rect: into the owned buffer when buffered, otherwise
    /// straight to the wire. Coordinates are floored either way.
    pub async fn draw_rect(&self, rect: Rect, color: Color) -> Result<()> {
        let cmd = {
            let mut state = self.lock();
            if state.closed {
                return Err(Error::WindowClosed);
            }
            if let Some(buffer) = state.buffer.as_mut() {
                buffer.draw_rect(rect.floored(), color);
                return Ok(());
            }
            DrawRectCommand {
                app_id: self.inner.app_id.clone(),
                window_id: self.inner.window_id.clone(),
                rect: rect.floored(),
                color,
            }
        };
        self.send(Message::DrawRectCommand(cmd)).await
    }

    /// Blit an image. A rect with any NaN component is rejected before
    /// anything is sent or painted.
    pub async fn draw_image(&self, rect: Rect, image: &PixelBuffer) -> Result<()> {
        if !rect.is_valid() {
            return Err(Error::InvalidRect);
        }
        let cmd = {
            let mut state = self.lock();
            if state.closed {
                return Err(Error::WindowClosed);
            }
            if let Some(buffer) = state.buffer.as_mut() {
                buffer.draw_image(rect.floored(), image);
                return Ok(());
            }
            DrawImageCommand {
                app_id: self.inner.app_id.clone(),
                window_id: self.inner.window_id.clone(),
                rect: rect.floored(),
                buffer: image.clone(),
            }
        };
        self.send(Message::DrawImageCommand(cmd)).await
    }

    /// Ship the buffered content as one image upload covering the full
    /// window. No-op in immediate mode.
    pub async fn flush(&self) -> Result<()> {
        let cmd = {
            let state = self.lock();
            if state.closed {
                return Err(Error::WindowClosed);
            }
            let Some(buffer) = state.buffer.as_ref() else {
                return Ok(());
            };
            DrawImageCommand {
                app_id: self.inner.app_id.clone(),
                window_id: self.inner.window_id.clone(),
                rect: WireRect::new(0, 0, buffer.width as i32, buffer.height as i32),
                buffer: buffer.clone(),
            }
        };
        self.send(Message::DrawImageCommand(cmd)).await
    }

    /// Close the window: announce it to the server and transition locally
    /// without waiting for confirmation. Further draws fail with
    /// [`Error::WindowClosed`]; further events for this id are dropped by
    /// the router. Idempotent.
    pub async fn close(&self) -> Result<()> {
        {
            let mut state = self.lock();
            if state.closed {
                return Ok(());
            }
            state.closed = true;
        }
        if let Some(registry) = self.inner.registry.upgrade() {
            registry
                .lock()
                .unwrap()
                .remove(&self.inner.window_id);
        }
        debug!(window_id = %self.inner.window_id, "window closed");
        self.send(Message::WindowCloseRequest(WindowCloseRequest {
            app_id: self.inner.app_id.clone(),
            window_id: self.inner.window_id.clone(),
        }))
        .await
    }

    /// Route one event into this window. Resize replaces the pixel buffer
    /// (staged content is invalidated, not migrated) before the listener
    /// fan-out; everything else fans out directly.
    pub(crate) fn dispatch(&self, event: WindowEvent) {
        if let WindowEvent::Resize(size) = event {
            self.apply_resize(size);
        }
        self.fire(&event);
    }

    pub(crate) fn mark_closed(&self) {
        self.lock().closed = true;
    }

    fn apply_resize(&self, size: Size) {
        let mut state = self.lock();
        state.bounds.w = size.w;
        state.bounds.h = size.h;
        if state.buffer.is_some() {
            state.buffer = Some(PixelBuffer::new(size.w.max(0) as u32, size.h.max(0) as u32));
        }
    }

    fn fire(&self, event: &WindowEvent) {
        // snapshot under the lock, call outside it: a callback may
        // re-enter (register listeners, inspect bounds)
        let callbacks: Vec<Callback> = self
            .lock()
            .listeners
            .get(&event.kind())
            .map(|l| l.to_vec())
            .unwrap_or_default();
        for cb in callbacks {
            cb(event);
        }
    }

    async fn send(&self, msg: Message) -> Result<()> {
        self.inner
            .outbound
            .send(msg)
            .await
            .map_err(|_| Error::ConnectionClosed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WindowState> {
        self.inner.state.lock().unwrap()
    }
}
