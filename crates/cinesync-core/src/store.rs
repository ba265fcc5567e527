use cinesync_gateway::{Subscription, SubscriptionHandle, UserDocumentGateway};
use cinesync_models::membership::is_member;
use cinesync_models::{Identity, ListName, MediaItem, NewMediaItem, UserDocument};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::auth::AuthProvider;
use crate::error::SyncError;

/// What the store knows about the signed-in user's document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentState {
    /// Subscribed, first snapshot not received yet.
    NotYetLoaded,
    /// Signed out, or the document does not exist (or is unreadable).
    Absent,
    Loaded(UserDocument),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreState {
    pub identity: Option<Identity>,
    pub document: DocumentState,
    /// Bumped on every login and logout. Snapshots tagged with an older
    /// session are dropped.
    pub session: u64,
}

impl StoreState {
    fn signed_out(session: u64) -> Self {
        Self {
            identity: None,
            document: DocumentState::Absent,
            session,
        }
    }

    pub fn document(&self) -> Option<&UserDocument> {
        match &self.document {
            DocumentState::Loaded(document) => Some(document),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.document, DocumentState::NotYetLoaded)
    }

    /// Cached entries of `list`; empty unless a document is loaded.
    pub fn items(&self, list: ListName) -> &[MediaItem] {
        self.document().map(|document| document.list(list)).unwrap_or(&[])
    }

    pub fn contains(&self, list: ListName, id: u64) -> bool {
        is_member(self.items(list), id)
    }
}

struct ActiveSession {
    identity: Identity,
    handle: SubscriptionHandle,
    pump: JoinHandle<()>,
}

impl ActiveSession {
    fn close(self) {
        self.handle.close();
        self.pump.abort();
    }
}

#[derive(Default)]
struct Sessions {
    active: Option<ActiveSession>,
    generation: u64,
}

/// Client-side mirror of the signed-in user's document.
///
/// The remote document is the source of truth: mutations go through the
/// gateway and the cached copy only changes when the subscription delivers
/// the resulting snapshot. Views read the cache through [`SyncStore::state`]
/// or observe it through [`SyncStore::changes`].
pub struct SyncStore {
    gateway: Arc<UserDocumentGateway>,
    state: Arc<watch::Sender<StoreState>>,
    // Serializes login and logout.
    sessions: Mutex<Sessions>,
}

impl SyncStore {
    pub fn new(gateway: Arc<UserDocumentGateway>) -> Self {
        let (state, _) = watch::channel(StoreState::signed_out(0));
        Self {
            gateway,
            state: Arc::new(state),
            sessions: Mutex::new(Sessions::default()),
        }
    }

    pub fn state(&self) -> StoreState {
        self.state.borrow().clone()
    }

    pub fn changes(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    pub fn active_identity(&self) -> Option<Identity> {
        self.state.borrow().identity.clone()
    }

    pub fn document(&self) -> Option<UserDocument> {
        self.state.borrow().document().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn watchlist(&self) -> Vec<MediaItem> {
        self.items(ListName::Watchlist)
    }

    pub fn favorites(&self) -> Vec<MediaItem> {
        self.items(ListName::Favorites)
    }

    pub fn items(&self, list: ListName) -> Vec<MediaItem> {
        self.state.borrow().items(list).to_vec()
    }

    pub fn is_in_watchlist(&self, id: u64) -> bool {
        self.contains(ListName::Watchlist, id)
    }

    pub fn is_in_favorites(&self, id: u64) -> bool {
        self.contains(ListName::Favorites, id)
    }

    /// Membership against the cached document. `false` while loading or
    /// signed out.
    pub fn contains(&self, list: ListName, id: u64) -> bool {
        self.state.borrow().contains(list, id)
    }

    /// Wait for the first snapshot of the current session. Returns
    /// immediately when signed out.
    pub async fn wait_until_loaded(&self) -> Result<Option<UserDocument>, SyncError> {
        let mut changes = self.state.subscribe();
        let state = changes
            .wait_for(|state| !state.is_loading())
            .await
            .map_err(|_| SyncError::NotConnected("sync store shut down".to_string()))?;
        Ok(state.document().cloned())
    }

    pub async fn sign_in(&self, identity: Identity) -> Result<(), SyncError> {
        self.set_identity(Some(identity)).await
    }

    pub async fn sign_out(&self) {
        // Logging out never touches the remote store.
        let _ = self.set_identity(None).await;
    }

    /// Switch the store to `identity`.
    ///
    /// Any open session is closed first. Logging in ensures the user's
    /// document exists, then subscribes to it; the state stays
    /// [`DocumentState::NotYetLoaded`] until the first snapshot. If either
    /// step fails the store is left signed out and the error is returned.
    #[instrument(skip_all, fields(uid = identity.as_ref().map(|i| i.uid()).unwrap_or("-")))]
    pub async fn set_identity(&self, identity: Option<Identity>) -> Result<(), SyncError> {
        let mut sessions = self.sessions.lock().await;

        let current = sessions.active.as_ref().map(|active| &active.identity);
        if current == identity.as_ref() {
            debug!(operation = "set_identity", "Identity unchanged");
            return Ok(());
        }

        if let Some(active) = sessions.active.take() {
            info!(operation = "logout", uid = %active.identity, "Closing session");
            active.close();
        }

        sessions.generation += 1;
        let generation = sessions.generation;
        self.state.send_replace(StoreState::signed_out(generation));

        let Some(identity) = identity else {
            return Ok(());
        };

        let subscription = match self.open_session(&identity).await {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!(operation = "login", error = %e, "Login aborted");
                return Err(e);
            }
        };

        self.state.send_replace(StoreState {
            identity: Some(identity.clone()),
            document: DocumentState::NotYetLoaded,
            session: generation,
        });

        let handle = subscription.handle();
        let pump = tokio::spawn(pump_snapshots(subscription, self.state.clone(), generation));
        info!(operation = "login", session = generation, "Session opened");

        sessions.active = Some(ActiveSession {
            identity,
            handle,
            pump,
        });
        Ok(())
    }

    async fn open_session(&self, identity: &Identity) -> Result<Subscription, SyncError> {
        self.gateway.ensure_document(identity).await?;
        Ok(self.gateway.subscribe(identity).await?)
    }

    /// Apply sign-in and sign-out events from `auth` until the provider is
    /// dropped. Failed logins are logged and leave the store signed out.
    pub fn follow_auth(self: &Arc<Self>, auth: &AuthProvider) -> JoinHandle<()> {
        let mut identities = auth.subscribe();
        let store = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let identity = identities.borrow_and_update().clone();
                if let Err(e) = store.set_identity(identity).await {
                    warn!(operation = "follow_auth", error = %e, "Could not apply sign-in");
                }
                if identities.changed().await.is_err() {
                    debug!(operation = "follow_auth", "Auth provider dropped");
                    break;
                }
            }
        })
    }

    pub async fn add_to_watchlist(&self, item: NewMediaItem) -> Result<MediaItem, SyncError> {
        self.add(ListName::Watchlist, item).await
    }

    pub async fn add_to_favorites(&self, item: NewMediaItem) -> Result<MediaItem, SyncError> {
        self.add(ListName::Favorites, item).await
    }

    pub async fn remove_from_watchlist(&self, id: u64) -> Result<(), SyncError> {
        self.remove(ListName::Watchlist, id).await
    }

    pub async fn remove_from_favorites(&self, id: u64) -> Result<(), SyncError> {
        self.remove(ListName::Favorites, id).await
    }

    /// Stamp `item` with the current time and append it to `list`.
    ///
    /// Returns the stored entry once the remote write is confirmed. The cache
    /// is untouched here and catches up with the next snapshot.
    pub async fn add(&self, list: ListName, item: NewMediaItem) -> Result<MediaItem, SyncError> {
        let identity = self.require_identity()?;
        let item = item.stamp(self.gateway.clock().now());
        self.gateway.add_item(&identity, list, &item).await?;
        Ok(item)
    }

    /// Remove every entry of `list` with this id.
    pub async fn remove(&self, list: ListName, id: u64) -> Result<(), SyncError> {
        let identity = self.require_identity()?;
        self.gateway.remove_item(&identity, list, id).await?;
        Ok(())
    }

    pub async fn shutdown(&self) {
        self.sign_out().await;
        debug!(operation = "shutdown", "Sync store shut down");
    }

    fn require_identity(&self) -> Result<Identity, SyncError> {
        self.active_identity().ok_or(SyncError::NotAuthenticated)
    }
}

async fn pump_snapshots(
    mut subscription: Subscription,
    state: Arc<watch::Sender<StoreState>>,
    session: u64,
) {
    while let Some(snapshot) = subscription.next().await {
        let applied = state.send_if_modified(|current| {
            if current.session != session {
                return false;
            }
            current.document = match snapshot {
                Some(document) => DocumentState::Loaded(document),
                None => DocumentState::Absent,
            };
            true
        });
        if !applied {
            debug!(session, "Session ended, dropping snapshot");
            break;
        }
    }
}
