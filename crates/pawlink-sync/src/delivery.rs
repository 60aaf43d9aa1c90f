//! The delivery ladder: strict tier fallback for every logical send.
//!
//! A send is fire-and-forget. The caller never learns whether it arrived;
//! failures only drive the downgrade to the next tier, and exhaustion of
//! the last tier loses the update (accepted risk).

use std::sync::Arc;

use tracing::{debug, warn};

use crate::messages::{self, PeerMessage};
use crate::transport::Transport;

/// Outbound side of a device's sync engine.
///
/// Holds the injected transport and walks the tiers in strict order:
/// direct message, then replace-context, then queued transfer. All
/// message kinds follow the same ladder, because for each of them only
/// the latest value matters until the queue tier is reached.
pub struct Outbox<T: Transport + ?Sized> {
    transport: Arc<T>,
}

impl<T: Transport + ?Sized> Clone for Outbox<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport + ?Sized> Outbox<T> {
    /// Create an outbox over the given transport.
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Send a message down the ladder.
    ///
    /// Never returns an error: a tier failure silently downgrades, and a
    /// failure of the final tier drops the update with a warning. There
    /// is no way to cancel or retract a send once issued.
    pub async fn send(&self, message: &PeerMessage) {
        let frame = match messages::encode(message) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(kind = message.kind(), error = %e, "dropping unencodable message");
                return;
            }
        };

        match self.transport.send_direct(frame.clone()).await {
            Ok(()) => {
                debug!(kind = message.kind(), "delivered via direct message");
                return;
            }
            Err(e) => {
                debug!(kind = message.kind(), error = %e, "direct send failed, trying context");
            }
        }

        match self
            .transport
            .put_context(message.purpose(), frame.clone())
            .await
        {
            Ok(()) => {
                debug!(kind = message.kind(), "parked in replace-context slot");
                return;
            }
            Err(e) => {
                debug!(kind = message.kind(), error = %e, "context write failed, trying queued transfer");
            }
        }

        if let Err(e) = self.transport.enqueue_transfer(frame).await {
            warn!(kind = message.kind(), error = %e, "all delivery tiers failed, update lost");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ContextPurpose;
    use crate::transport::memory::MemoryLink;

    use pawlink_core::{PetId, Stats};

    fn stats_update(energy: i32) -> PeerMessage {
        PeerMessage::StatsUpdate {
            id: PetId::from_bytes([7; 16]),
            stats: Stats::new(energy, 50, 50),
        }
    }

    #[tokio::test]
    async fn test_prefers_direct_when_reachable() {
        let (a, b) = MemoryLink::pair();
        let outbox = Outbox::new(Arc::new(a));

        outbox.send(&stats_update(10)).await;

        assert_eq!(b.recv().await.unwrap(), messages::encode(&stats_update(10)).unwrap());
        assert_eq!(b.pending_context(ContextPurpose::Stats), None);
        assert_eq!(b.pending_transfers(), 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_context_when_direct_fails() {
        let (a, b) = MemoryLink::pair();
        b.set_fail_direct(true);
        let outbox = Outbox::new(Arc::new(a));

        outbox.send(&stats_update(10)).await;

        assert_eq!(
            b.pending_context(ContextPurpose::Stats),
            Some(messages::encode(&stats_update(10)).unwrap())
        );
        assert_eq!(b.pending_transfers(), 0);
    }

    #[tokio::test]
    async fn test_rapid_sends_coalesce_in_context() {
        let (a, b) = MemoryLink::pair();
        b.set_reachable(false);
        let outbox = Outbox::new(Arc::new(a));

        for energy in [10, 20, 30] {
            outbox.send(&stats_update(energy)).await;
        }

        // Only the most recent of the rapid sends survives.
        assert_eq!(
            b.pending_context(ContextPurpose::Stats),
            Some(messages::encode(&stats_update(30)).unwrap())
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_queue_when_context_fails() {
        let (a, b) = MemoryLink::pair();
        b.set_reachable(false);
        b.set_fail_context(true);
        let outbox = Outbox::new(Arc::new(a));

        outbox.send(&stats_update(10)).await;
        outbox.send(&stats_update(20)).await;

        // Queued transfers keep every item, in submission order.
        assert_eq!(b.pending_transfers(), 2);
        b.deliver_pending().await;
        assert_eq!(b.recv().await.unwrap(), messages::encode(&stats_update(10)).unwrap());
        assert_eq!(b.recv().await.unwrap(), messages::encode(&stats_update(20)).unwrap());
    }
}
