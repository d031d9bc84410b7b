//! Request/response correlation
//!
//! The protocol carries no request ids: the server answers each stream's
//! requests in arrival order, so FIFO order *is* the correlation. Every
//! `send_and_wait` caller claims its own slot in the queue - a later call
//! can never orphan an earlier one - and the next inbound message that is
//! not claimed by event routing resolves the front slot.

use std::collections::VecDeque;

use tokio::sync::{oneshot, Mutex};
use tracing::trace;

use crate::proto::Message;

#[derive(Default)]
pub struct Correlator {
    pending: Mutex<VecDeque<oneshot::Sender<Message>>>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next reply slot. The receiver resolves with the next
    /// unrouted inbound message, or errors if the connection goes away.
    pub async fn register(&self) -> oneshot::Receiver<Message> {
        let (tx, rx) = oneshot::channel();
        let mut pending = self.pending.lock().await;
        pending.push_back(tx);
        trace!(depth = pending.len(), "reply slot registered");
        rx
    }

    /// Resolve the oldest live pending request. Slots whose caller gave up
    /// (timed out) are skipped. Returns the message back when nobody is
    /// waiting for it.
    pub async fn resolve(&self, msg: Message) -> Option<Message> {
        let mut pending = self.pending.lock().await;
        let mut msg = msg;
        while let Some(slot) = pending.pop_front() {
            match slot.send(msg) {
                Ok(()) => return None,
                Err(back) => msg = back,
            }
        }
        Some(msg)
    }

    /// Drop every pending slot so parked callers observe a closed channel
    /// instead of waiting forever. Called when the connection dies.
    pub async fn fail_all(&self) {
        self.pending.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::AppConnectResponse;

    fn reply(id: &str) -> Message {
        Message::AppConnectResponse(AppConnectResponse { app_id: id.into() })
    }

    #[tokio::test]
    async fn test_resolves_in_fifo_order() {
        let c = Correlator::new();
        let first = c.register().await;
        let second = c.register().await;

        assert!(c.resolve(reply("one")).await.is_none());
        assert!(c.resolve(reply("two")).await.is_none());

        assert_eq!(first.await.unwrap(), reply("one"));
        assert_eq!(second.await.unwrap(), reply("two"));
    }

    #[tokio::test]
    async fn test_skips_abandoned_slots() {
        let c = Correlator::new();
        let gone = c.register().await;
        drop(gone); // caller timed out
        let live = c.register().await;

        assert!(c.resolve(reply("one")).await.is_none());
        assert_eq!(live.await.unwrap(), reply("one"));
    }

    #[tokio::test]
    async fn test_unclaimed_message_is_returned() {
        let c = Correlator::new();
        assert_eq!(c.resolve(reply("one")).await, Some(reply("one")));
    }

    #[tokio::test]
    async fn test_fail_all_closes_parked_callers() {
        let c = Correlator::new();
        let slot = c.register().await;
        c.fail_all().await;
        assert!(slot.await.is_err());
    }
}
