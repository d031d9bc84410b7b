//! Transport: one persistent TCP stream with line-delimited JSON framing
//!
//! Every message is a single newline-terminated JSON document. Messages are
//! newline-free by protocol rule, so the delimiter is unambiguous and the
//! framing survives split or coalesced TCP deliveries. A line that fails to
//! decode is logged and dropped - never fatal to the connection.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::proto::Message;

const QUEUE_DEPTH: usize = 256;

/// Owns the stream via two pump tasks: a reader that decodes inbound lines
/// and a writer that drains the outbound queue. Public operations never
/// touch the socket directly.
pub struct Connection {
    outbound: mpsc::Sender<Message>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Connection {
    /// Open the stream and start both pumps. Decoded inbound messages
    /// arrive on the returned receiver until the peer closes or
    /// [`Connection::disconnect`] is called.
    pub async fn open(host: &str, port: u16) -> Result<(Self, mpsc::Receiver<Message>)> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(Error::Connect)?;
        stream.set_nodelay(true).ok();
        debug!("connected to {host}:{port}");

        let (read_half, write_half) = stream.into_split();
        let (out_tx, out_rx) = mpsc::channel(QUEUE_DEPTH);
        let (in_tx, in_rx) = mpsc::channel(QUEUE_DEPTH);

        let reader = tokio::spawn(read_loop(read_half, in_tx));
        let writer = tokio::spawn(write_loop(write_half, out_rx));

        Ok((
            Self {
                outbound: out_tx,
                reader,
                writer,
            },
            in_rx,
        ))
    }

    /// Fire-and-forget send. Fails with [`Error::ConnectionClosed`] once the
    /// connection is down; there is no flow control beyond the queue depth.
    pub async fn send(&self, msg: Message) -> Result<()> {
        self.outbound
            .send(msg)
            .await
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Handle other parts of the client (windows) send through. Sends fail
    /// once the writer pump is gone.
    pub(crate) fn sender(&self) -> mpsc::Sender<Message> {
        self.outbound.clone()
    }

    /// Stop both pumps; dropping the stream halves closes the socket.
    /// Subsequent sends fail with [`Error::ConnectionClosed`].
    pub fn disconnect(&self) {
        debug!("disconnecting");
        self.writer.abort();
        self.reader.abort();
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.writer.abort();
        self.reader.abort();
    }
}

async fn read_loop(read_half: OwnedReadHalf, inbound: mpsc::Sender<Message>) {
    let mut lines = BufReader::new(read_half).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Message>(line) {
                    Ok(msg) => {
                        if inbound.send(msg).await.is_err() {
                            break; // router gone
                        }
                    }
                    Err(e) => warn!("dropping malformed message: {e}"),
                }
            }
            Ok(None) => {
                debug!("peer closed the stream");
                break;
            }
            Err(e) => {
                warn!("read error: {e}");
                break;
            }
        }
    }
}

async fn write_loop(mut write_half: OwnedWriteHalf, mut outbound: mpsc::Receiver<Message>) {
    while let Some(msg) = outbound.recv().await {
        let mut line = match serde_json::to_string(&msg) {
            Ok(s) => s,
            Err(e) => {
                warn!("dropping unencodable message: {e}");
                continue;
            }
        };
        line.push('\n');
        if let Err(e) = write_half.write_all(line.as_bytes()).await {
            warn!("write error: {e}");
            break;
        }
    }
    let _ = write_half.shutdown().await;
    debug!("writer stopped");
}
