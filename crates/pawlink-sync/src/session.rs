//! Session lifecycle: the advisory reachability flag.
//!
//! The flag never gates a send - all tiers are tried regardless, since
//! reachability can change between check and send. It exists for display
//! surfaces that want to show link state.

use tokio::sync::watch;

use crate::transport::Transport;

/// Tracks peer reachability as reported by the transport.
pub struct Session {
    reachable: watch::Receiver<bool>,
}

impl Session {
    /// Create a session observing the given transport's connectivity.
    pub fn new<T: Transport + ?Sized>(transport: &T) -> Self {
        Self {
            reachable: transport.reachability(),
        }
    }

    /// The current (cached) reachability flag. Advisory only.
    pub fn is_reachable(&self) -> bool {
        *self.reachable.borrow()
    }

    /// Subscribe to reachability changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.reachable.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::MemoryLink;

    #[tokio::test]
    async fn test_session_tracks_reachability() {
        let (a, b) = MemoryLink::pair();
        let session = Session::new(&a);
        assert!(session.is_reachable());

        b.set_reachable(false);
        assert!(!session.is_reachable());

        b.set_reachable(true);
        assert!(session.is_reachable());
    }

    #[tokio::test]
    async fn test_subscription_sees_changes() {
        let (a, b) = MemoryLink::pair();
        let session = Session::new(&a);
        let mut sub = session.subscribe();

        b.set_reachable(false);
        sub.changed().await.unwrap();
        assert!(!*sub.borrow());
    }
}
