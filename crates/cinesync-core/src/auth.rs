use cinesync_models::Identity;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// In-process authentication collaborator: who is signed in, plus change
/// notification. Clones share the same session.
#[derive(Clone)]
pub struct AuthProvider {
    current: Arc<watch::Sender<Option<Identity>>>,
}

impl AuthProvider {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            current: Arc::new(sender),
        }
    }

    /// Returns `false` if `identity` was already signed in.
    pub fn sign_in(&self, identity: Identity) -> bool {
        let changed = self.current.send_if_modified(|current| {
            if current.as_ref() == Some(&identity) {
                return false;
            }
            *current = Some(identity.clone());
            true
        });
        if changed {
            info!(operation = "sign_in", uid = %identity, "Signed in");
        }
        changed
    }

    /// Returns `false` if nobody was signed in.
    pub fn sign_out(&self) -> bool {
        let previous = self.current.send_if_modified(|current| current.take().is_some());
        if previous {
            info!(operation = "sign_out", "Signed out");
        }
        previous
    }

    pub fn current(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }
}

impl Default for AuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(value: &str) -> Identity {
        Identity::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_sign_in_and_out_notify_subscribers() {
        let auth = AuthProvider::new();
        let mut changes = auth.subscribe();
        assert!(auth.current().is_none());

        assert!(auth.sign_in(uid("u1")));
        changes.changed().await.unwrap();
        assert_eq!(changes.borrow_and_update().clone(), Some(uid("u1")));

        assert!(auth.sign_out());
        changes.changed().await.unwrap();
        assert!(changes.borrow_and_update().is_none());
    }

    #[test]
    fn test_repeated_calls_are_not_changes() {
        let auth = AuthProvider::new();
        let changes = auth.subscribe();

        assert!(auth.sign_in(uid("u1")));
        assert!(!auth.sign_in(uid("u1")));
        assert!(auth.sign_in(uid("u2")));
        assert_eq!(auth.current(), Some(uid("u2")));

        assert!(auth.sign_out());
        assert!(!auth.sign_out());
        drop(changes);
    }

    #[test]
    fn test_clones_share_session() {
        let auth = AuthProvider::new();
        let other = auth.clone();
        auth.sign_in(uid("u1"));
        assert_eq!(other.current(), Some(uid("u1")));
    }
}
