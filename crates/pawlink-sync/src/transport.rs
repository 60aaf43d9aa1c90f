//! Transport abstraction for the tiered peer channel.
//!
//! The transport moves opaque frames; message encoding lives in
//! [`crate::messages`]. Implementations may sit on any process-to-process
//! channel that can offer the three delivery tiers.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::watch;

use crate::error::Result;
use crate::messages::ContextPurpose;

/// An encoded wire frame.
pub type Frame = Bytes;

/// Transport trait for the tiered peer channel.
///
/// Implementations must be thread-safe (Send + Sync).
///
/// The three send methods correspond to the delivery tiers; the caller
/// ([`crate::Outbox`]) walks them in strict order. A transport never
/// retries on its own: a tier either accepts the frame or errors
/// immediately.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Tier 1: deliver now, or fail now.
    ///
    /// Errors if the peer process is not currently live and reachable, or
    /// does not acknowledge. No retry at this tier.
    async fn send_direct(&self, frame: Frame) -> Result<()>;

    /// Tier 2: write the durable single-slot mailbox for `purpose`.
    ///
    /// Overwrites any prior undelivered value for the same purpose; the
    /// peer sees only the latest value, next time it is active.
    async fn put_context(&self, purpose: ContextPurpose, frame: Frame) -> Result<()>;

    /// Tier 3: append to the ordered durable queue.
    ///
    /// Every enqueued frame is eventually delivered in submission order,
    /// surviving relaunches of either process.
    async fn enqueue_transfer(&self, frame: Frame) -> Result<()>;

    /// Whether the peer is currently reachable. Advisory only: sends are
    /// attempted regardless, since reachability can change between check
    /// and send.
    fn is_reachable(&self) -> bool;

    /// Subscribe to reachability changes.
    fn reachability(&self) -> watch::Receiver<bool>;

    /// Receive the next inbound frame.
    ///
    /// Blocks until a frame is available or the link is gone.
    async fn recv(&self) -> Result<Frame>;

    /// Receive with timeout.
    ///
    /// Returns None if the timeout expires before a frame arrives.
    async fn recv_timeout(&self, timeout: Duration) -> Result<Option<Frame>>;
}

/// A simple in-memory transport for testing.
///
/// Pairs two endpoints over channels and models each tier explicitly, so
/// tests can fail a tier, park a peer offline, and watch what each
/// mailbox holds.
pub mod memory {
    use super::*;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    use crate::error::SyncError;

    /// One side's inbox: everything the peer has addressed to it.
    struct Inbox {
        /// Live delivery channel (tier 1 lands here immediately).
        tx: mpsc::Sender<Frame>,
        /// Tier 2 slots, one per purpose, latest write wins.
        context: Mutex<BTreeMap<ContextPurpose, Frame>>,
        /// Tier 3 queue, strictly ordered.
        queue: Mutex<VecDeque<Frame>>,
        /// Whether this side is live (its peer observes this).
        reachable: watch::Sender<bool>,
        /// Failure injection: tier 1 delivery to this side fails.
        fail_direct: AtomicBool,
        /// Failure injection: tier 2 writes toward this side fail.
        fail_context: AtomicBool,
    }

    /// A paired in-memory link between two endpoints.
    pub struct MemoryLink;

    impl MemoryLink {
        /// Create a connected endpoint pair. Both sides start reachable.
        pub fn pair() -> (MemoryEndpoint, MemoryEndpoint) {
            let (a_inbox, a_rx) = Inbox::new();
            let (b_inbox, b_rx) = Inbox::new();

            let a = MemoryEndpoint {
                inbox: Arc::clone(&a_inbox),
                peer: Arc::clone(&b_inbox),
                rx: tokio::sync::Mutex::new(a_rx),
            };
            let b = MemoryEndpoint {
                inbox: b_inbox,
                peer: a_inbox,
                rx: tokio::sync::Mutex::new(b_rx),
            };
            (a, b)
        }
    }

    impl Inbox {
        fn new() -> (Arc<Self>, mpsc::Receiver<Frame>) {
            let (tx, rx) = mpsc::channel(1000);
            let (reachable, _) = watch::channel(true);
            (
                Arc::new(Self {
                    tx,
                    context: Mutex::new(BTreeMap::new()),
                    queue: Mutex::new(VecDeque::new()),
                    reachable,
                    fail_direct: AtomicBool::new(false),
                    fail_context: AtomicBool::new(false),
                }),
                rx,
            )
        }
    }

    /// One side of a [`MemoryLink`].
    pub struct MemoryEndpoint {
        inbox: Arc<Inbox>,
        peer: Arc<Inbox>,
        rx: tokio::sync::Mutex<mpsc::Receiver<Frame>>,
    }

    impl MemoryEndpoint {
        /// Mark this side live or offline. Peers observe the change via
        /// [`Transport::is_reachable`] and their reachability watch.
        pub fn set_reachable(&self, reachable: bool) {
            // send() would fail with no subscribers; the flag must update
            // even when nobody watches it.
            let _ = self.inbox.reachable.send_replace(reachable);
        }

        /// Make tier-1 delivery toward this side fail (simulates a live
        /// peer that does not acknowledge).
        pub fn set_fail_direct(&self, fail: bool) {
            self.inbox.fail_direct.store(fail, Ordering::SeqCst);
        }

        /// Make tier-2 writes toward this side fail (simulates a mailbox
        /// whose underlying write errors).
        pub fn set_fail_context(&self, fail: bool) {
            self.inbox.fail_context.store(fail, Ordering::SeqCst);
        }

        /// Move everything parked in this side's context slots and
        /// transfer queue into the live delivery channel, in tier order
        /// (contexts first, then queued transfers in submission order).
        ///
        /// Models the peer process becoming active again.
        pub async fn deliver_pending(&self) {
            let contexts: Vec<Frame> = {
                let mut slots = self.inbox.context.lock().unwrap();
                let drained = slots.values().cloned().collect();
                slots.clear();
                drained
            };
            let queued: Vec<Frame> = {
                let mut queue = self.inbox.queue.lock().unwrap();
                queue.drain(..).collect()
            };
            for frame in contexts.into_iter().chain(queued) {
                let _ = self.inbox.tx.send(frame).await;
            }
        }

        /// Inspect this side's undelivered context slot for a purpose.
        pub fn pending_context(&self, purpose: ContextPurpose) -> Option<Frame> {
            self.inbox.context.lock().unwrap().get(&purpose).cloned()
        }

        /// Number of undelivered queued transfers addressed to this side.
        pub fn pending_transfers(&self) -> usize {
            self.inbox.queue.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for MemoryEndpoint {
        async fn send_direct(&self, frame: Frame) -> Result<()> {
            if !*self.peer.reachable.borrow() {
                return Err(SyncError::Unreachable);
            }
            if self.peer.fail_direct.load(Ordering::SeqCst) {
                return Err(SyncError::Transport("peer did not acknowledge".into()));
            }
            self.peer
                .tx
                .send(frame)
                .await
                .map_err(|_| SyncError::ChannelClosed)
        }

        async fn put_context(&self, purpose: ContextPurpose, frame: Frame) -> Result<()> {
            if self.peer.fail_context.load(Ordering::SeqCst) {
                return Err(SyncError::Transport("context write failed".into()));
            }
            self.peer.context.lock().unwrap().insert(purpose, frame);
            Ok(())
        }

        async fn enqueue_transfer(&self, frame: Frame) -> Result<()> {
            self.peer.queue.lock().unwrap().push_back(frame);
            Ok(())
        }

        fn is_reachable(&self) -> bool {
            *self.peer.reachable.borrow()
        }

        fn reachability(&self) -> watch::Receiver<bool> {
            self.peer.reachable.subscribe()
        }

        async fn recv(&self) -> Result<Frame> {
            let mut rx = self.rx.lock().await;
            rx.recv().await.ok_or(SyncError::ChannelClosed)
        }

        async fn recv_timeout(&self, timeout: Duration) -> Result<Option<Frame>> {
            let mut rx = self.rx.lock().await;
            match tokio::time::timeout(timeout, rx.recv()).await {
                Ok(Some(frame)) => Ok(Some(frame)),
                Ok(None) => Err(SyncError::ChannelClosed),
                Err(_) => Ok(None), // Timeout
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryLink;
    use super::*;
    use crate::error::SyncError;

    fn frame(tag: u8) -> Frame {
        Bytes::from(vec![tag])
    }

    #[tokio::test]
    async fn test_direct_send_recv() {
        let (a, b) = MemoryLink::pair();

        a.send_direct(frame(1)).await.unwrap();
        assert_eq!(b.recv().await.unwrap(), frame(1));
    }

    #[tokio::test]
    async fn test_direct_fails_when_peer_offline() {
        let (a, b) = MemoryLink::pair();
        b.set_reachable(false);

        assert!(matches!(
            a.send_direct(frame(1)).await,
            Err(SyncError::Unreachable)
        ));
        assert!(!a.is_reachable());
    }

    #[tokio::test]
    async fn test_context_slot_coalesces() {
        let (a, b) = MemoryLink::pair();

        a.put_context(ContextPurpose::Stats, frame(1)).await.unwrap();
        a.put_context(ContextPurpose::Stats, frame(2)).await.unwrap();
        assert_eq!(b.pending_context(ContextPurpose::Stats), Some(frame(2)));

        // Only the latest value is delivered on activation.
        b.deliver_pending().await;
        assert_eq!(b.recv().await.unwrap(), frame(2));
        assert_eq!(
            b.recv_timeout(Duration::from_millis(10)).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_queue_preserves_order() {
        let (a, b) = MemoryLink::pair();

        a.enqueue_transfer(frame(1)).await.unwrap();
        a.enqueue_transfer(frame(2)).await.unwrap();
        a.enqueue_transfer(frame(3)).await.unwrap();
        assert_eq!(b.pending_transfers(), 3);

        b.deliver_pending().await;
        assert_eq!(b.recv().await.unwrap(), frame(1));
        assert_eq!(b.recv().await.unwrap(), frame(2));
        assert_eq!(b.recv().await.unwrap(), frame(3));
    }

    #[tokio::test]
    async fn test_reachability_watch() {
        let (a, b) = MemoryLink::pair();
        let mut watch = a.reachability();
        assert!(*watch.borrow());

        b.set_reachable(false);
        watch.changed().await.unwrap();
        assert!(!*watch.borrow());
    }
}
