//! Client façade: connection lifecycle, window registry, inbound routing
//!
//! One router task per [`App`] is the single place inbound messages are
//! classified: the connect-ack records the assigned app id, window-scoped
//! push events go through the registry to their window's listeners, the
//! close notification fires the client-level callback, and everything else
//! resolves the oldest pending `send_and_wait`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::conn::Connection;
use crate::correlate::Correlator;
use crate::error::{Error, Result};
use crate::geom::Rect;
use crate::proto::{
    DbClause, DbObj, DbObjectRequest, DbQueryRequest, Message, OpenWindowCommand,
};
use crate::window::{Window, WindowEvent, WindowMap};

/// Port the windowing server listens on by default.
pub const DEFAULT_PORT: u16 = 3333;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub type CloseCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on every correlated wait; a server that never answers
    /// fails the caller with [`Error::Timeout`] instead of parking forever.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

struct Shared {
    app_id: Mutex<Option<String>>,
    close_cb: Mutex<Option<CloseCallback>>,
}

/// Top-level handle: owns the connection, the pending-request queue and the
/// window registry.
pub struct App {
    conn: Connection,
    correlator: Arc<Correlator>,
    windows: Arc<WindowMap>,
    shared: Arc<Shared>,
    config: ClientConfig,
}

impl App {
    /// Connect to the default server address. Resolves once the transport
    /// is open; inbound handling starts immediately. The app id stays
    /// unset until the `AppConnect` handshake is answered (see
    /// [`Message::app_connect`]).
    pub async fn connect() -> Result<Self> {
        Self::connect_with(ClientConfig::default()).await
    }

    pub async fn connect_with(config: ClientConfig) -> Result<Self> {
        let (conn, inbound) = Connection::open(&config.host, config.port).await?;
        let correlator = Arc::new(Correlator::new());
        let windows: Arc<WindowMap> = Arc::new(Mutex::new(HashMap::new()));
        let shared = Arc::new(Shared {
            app_id: Mutex::new(None),
            close_cb: Mutex::new(None),
        });

        tokio::spawn(route_loop(
            inbound,
            Arc::clone(&correlator),
            Arc::clone(&windows),
            Arc::clone(&shared),
        ));

        Ok(Self {
            conn,
            correlator,
            windows,
            shared,
            config,
        })
    }

    /// Server-assigned app id; `None` before the connect handshake resolves.
    pub fn id(&self) -> Option<String> {
        self.shared.app_id.lock().unwrap().clone()
    }

    /// Fire-and-forget send.
    pub async fn send(&self, msg: Message) -> Result<()> {
        self.conn.send(msg).await
    }

    /// Send a request and wait for its reply: the next inbound message that
    /// is not a routed push event. Callers queue up FIFO; each gets its own
    /// reply slot.
    pub async fn send_and_wait(&self, msg: Message) -> Result<Message> {
        let slot = self.correlator.register().await;
        self.conn.send(msg).await?;
        match timeout(self.config.request_timeout, slot).await {
            Err(_) => Err(Error::Timeout),
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Ok(Ok(reply)) => Ok(reply),
        }
    }

    /// Open a plain window with the given bounds and register it for event
    /// routing. Fractional bounds are floored.
    pub async fn open_window(&self, bounds: Rect) -> Result<Window> {
        let reply = self
            .send_and_wait(Message::OpenWindowCommand(OpenWindowCommand {
                window_type: "plain".to_string(),
                window_title: "some-window".to_string(),
                bounds: bounds.floored(),
            }))
            .await?;
        let Message::OpenWindowResponse(info) = reply else {
            return Err(Error::UnexpectedReply("OpenWindowResponse"));
        };
        let win = Window::new(info, self.conn.sender(), Arc::downgrade(&self.windows));
        self.windows
            .lock()
            .unwrap()
            .insert(win.window_id().to_string(), win.clone());
        debug!(window_id = %win.window_id(), "window opened");
        Ok(win)
    }

    /// At-most-one callback fired when the server confirms a window close.
    pub fn on_close_window<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.shared.close_cb.lock().unwrap() = Some(Arc::new(callback));
    }

    /// Tear down locally: mark every window closed, stop the stream pumps
    /// and fail pending requests. There is no goodbye message in the
    /// protocol; the server notices the half-close.
    pub fn disconnect(&self) {
        debug!("disconnecting app");
        {
            let mut windows = self.windows.lock().unwrap();
            for win in windows.values() {
                win.mark_closed();
            }
            windows.clear();
        }
        self.conn.disconnect();
    }

    /// Run a clause query against the server-side document store.
    pub async fn db_query(&self, query: Vec<DbClause>) -> Result<Vec<DbObj>> {
        let reply = self
            .send_and_wait(Message::DBQueryRequest(DbQueryRequest {
                app_id: self.id().unwrap_or_default(),
                query,
            }))
            .await?;
        match reply {
            Message::DBQueryResponse(resp) => Ok(resp.results),
            _ => Err(Error::UnexpectedReply("DBQueryResponse")),
        }
    }

    /// Store a new object. The id is assigned client-side before sending,
    /// matching what the server expects; the stored object comes back.
    pub async fn db_add(&self, mut object: DbObj) -> Result<DbObj> {
        object.id = Uuid::new_v4().to_string();
        let reply = self
            .send_and_wait(Message::DBAddRequest(DbObjectRequest {
                app_id: self.id().unwrap_or_default(),
                object,
            }))
            .await?;
        match reply {
            Message::DBAddResponse(resp) => Ok(resp.object),
            _ => Err(Error::UnexpectedReply("DBAddResponse")),
        }
    }

    pub async fn db_update(&self, object: DbObj) -> Result<DbObj> {
        let reply = self
            .send_and_wait(Message::DBUpdateRequest(DbObjectRequest {
                app_id: self.id().unwrap_or_default(),
                object,
            }))
            .await?;
        match reply {
            Message::DBUpdateResponse(resp) => Ok(resp.object),
            _ => Err(Error::UnexpectedReply("DBUpdateResponse")),
        }
    }

    pub async fn db_delete(&self, object: DbObj) -> Result<DbObj> {
        let reply = self
            .send_and_wait(Message::DBDeleteRequest(DbObjectRequest {
                app_id: self.id().unwrap_or_default(),
                object,
            }))
            .await?;
        match reply {
            Message::DBDeleteResponse(resp) => Ok(resp.object),
            _ => Err(Error::UnexpectedReply("DBDeleteResponse")),
        }
    }
}

async fn route_loop(
    mut inbound: mpsc::Receiver<Message>,
    correlator: Arc<Correlator>,
    windows: Arc<WindowMap>,
    shared: Arc<Shared>,
) {
    while let Some(msg) = inbound.recv().await {
        match msg {
            Message::AppConnectResponse(resp) => {
                // connect-ack: record the id, then wake the handshake caller
                *shared.app_id.lock().unwrap() = Some(resp.app_id.clone());
                debug!(app_id = %resp.app_id, "app id assigned");
                correlator
                    .resolve(Message::AppConnectResponse(resp))
                    .await;
            }
            Message::CloseWindowResponse(_) => {
                let cb = shared.close_cb.lock().unwrap().clone();
                match cb {
                    Some(cb) => cb(),
                    None => debug!("close notification with no callback registered"),
                }
            }
            msg => match WindowEvent::from_message(&msg) {
                Some((window_id, event)) => {
                    let win = windows.lock().unwrap().get(&window_id).cloned();
                    match win {
                        Some(win) => win.dispatch(event),
                        None => warn!("dropping event for unknown window {window_id}"),
                    }
                }
                None => {
                    if let Some(unclaimed) = correlator.resolve(msg).await {
                        debug!("dropping reply nobody waits for: {unclaimed:?}");
                    }
                }
            },
        }
    }
    // connection gone: wake every parked caller
    correlator.fail_all().await;
    debug!("router stopped");
}
