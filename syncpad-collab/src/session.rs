//! Session oracle — the authentication provider's read surface.
//!
//! Sign-in and sign-up flows live with the external provider; this crate
//! only consumes the resulting identity. The oracle is injected (never a
//! process-wide singleton) and identity changes arrive over an explicit
//! subscription that callers drop when they tear down.

use async_trait::async_trait;
use tokio::sync::watch;

use syncpad_core::Identity;

/// Read access to the current authenticated identity.
#[async_trait]
pub trait SessionOracle: Send + Sync {
    /// The identity right now; `None` when signed out.
    async fn current_identity(&self) -> Option<Identity>;

    /// Subscription delivering the identity on every sign-in/out.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;
}

/// Fixed-identity oracle for tests and headless tooling.
pub struct StaticSession {
    tx: watch::Sender<Option<Identity>>,
}

impl StaticSession {
    pub fn signed_in(identity: Identity) -> Self {
        let (tx, _) = watch::channel(Some(identity));
        Self { tx }
    }

    pub fn anonymous() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Simulate a sign-in/out event.
    pub fn set(&self, identity: Option<Identity>) {
        let _ = self.tx.send(identity);
    }
}

#[async_trait]
impl SessionOracle for StaticSession {
    async fn current_identity(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_static_session_identity() {
        let me = Identity::new(Uuid::new_v4(), "me@x.com");
        let session = StaticSession::signed_in(me.clone());
        assert_eq!(session.current_identity().await, Some(me));

        let session = StaticSession::anonymous();
        assert_eq!(session.current_identity().await, None);
    }

    #[tokio::test]
    async fn test_subscription_sees_sign_out() {
        let me = Identity::new(Uuid::new_v4(), "me@x.com");
        let session = StaticSession::signed_in(me);
        let mut rx = session.subscribe();

        session.set(None);
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
