use cinesync_models::UserDocument;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::gateway::decode_document;
use crate::traits::{DocumentListener, DocumentPath, ListenerRegistration};

/// Lifecycle of a [`Subscription`]. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    AwaitingFirstSnapshot,
    Synced,
    Closed,
}

struct Shared {
    closed: AtomicBool,
    registration: ListenerRegistration,
}

impl Shared {
    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.registration.detach();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Live feed of user-document snapshots.
///
/// The first snapshot is the document as it was when the subscription was
/// opened; each later one follows a commit by any client. `None` snapshots
/// mean the document does not exist (or could not be read as a user
/// document). Once closed, `next` never yields another snapshot, including
/// ones already buffered.
pub struct Subscription {
    path: DocumentPath,
    snapshots: mpsc::UnboundedReceiver<Option<Value>>,
    shared: Arc<Shared>,
    state: SubscriptionState,
}

/// Closes a [`Subscription`] from elsewhere, e.g. on sign-out while a task
/// owns the subscription itself.
#[derive(Clone)]
pub struct SubscriptionHandle {
    path: DocumentPath,
    shared: Arc<Shared>,
}

impl Subscription {
    pub(crate) fn new(path: DocumentPath, listener: DocumentListener) -> Self {
        Self {
            path,
            snapshots: listener.snapshots,
            shared: Arc::new(Shared {
                closed: AtomicBool::new(false),
                registration: listener.registration,
            }),
            state: SubscriptionState::AwaitingFirstSnapshot,
        }
    }

    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    pub fn state(&self) -> SubscriptionState {
        if self.shared.is_closed() {
            SubscriptionState::Closed
        } else {
            self.state
        }
    }

    pub fn handle(&self) -> SubscriptionHandle {
        SubscriptionHandle {
            path: self.path.clone(),
            shared: self.shared.clone(),
        }
    }

    /// Wait for the next snapshot. Returns `None` once the subscription is
    /// closed, either explicitly or because the store dropped the listener.
    ///
    /// Cancel safe.
    pub async fn next(&mut self) -> Option<Option<UserDocument>> {
        if self.shared.is_closed() {
            self.state = SubscriptionState::Closed;
            return None;
        }

        let snapshot = self.snapshots.recv().await;

        if self.shared.is_closed() {
            self.state = SubscriptionState::Closed;
            return None;
        }

        match snapshot {
            Some(value) => {
                self.state = SubscriptionState::Synced;
                Some(value.and_then(|value| decode_document(&self.path, value)))
            }
            None => {
                debug!("Listener for {} ended by the store", self.path);
                self.state = SubscriptionState::Closed;
                self.shared.close();
                None
            }
        }
    }

    pub fn close(&mut self) {
        if !self.shared.is_closed() {
            debug!("Closing subscription to {}", self.path);
        }
        self.shared.close();
        self.state = SubscriptionState::Closed;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shared.close();
    }
}

impl SubscriptionHandle {
    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    pub fn close(&self) {
        if !self.shared.is_closed() {
            debug!("Closing subscription to {} via handle", self.path);
        }
        self.shared.close();
    }
}
