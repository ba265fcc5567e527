use cinesync_config::{Config, PathManager};
use cinesync_gateway::{Clock, MemoryDocumentStore, SystemClock, UserDocumentGateway};
use cinesync_models::Identity;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::auth::AuthProvider;
use crate::error::SyncError;
use crate::store::SyncStore;

/// Everything a process needs to talk to user documents, built once at
/// startup and shut down explicitly.
///
/// The sync store follows the auth provider for the lifetime of the context.
/// Must be created inside a tokio runtime.
pub struct AppContext {
    config: Config,
    documents: MemoryDocumentStore,
    store: Arc<SyncStore>,
    auth: AuthProvider,
    auth_task: JoinHandle<()>,
}

impl AppContext {
    pub fn new(config: Config, documents: MemoryDocumentStore, clock: Arc<dyn Clock>) -> Self {
        let gateway = Arc::new(
            UserDocumentGateway::new(Arc::new(documents.clone()))
                .with_collection(config.store.collection.as_str())
                .with_clock(clock),
        );
        let store = Arc::new(SyncStore::new(gateway));
        let auth = AuthProvider::new();
        let auth_task = store.follow_auth(&auth);

        Self {
            config,
            documents,
            store,
            auth,
            auth_task,
        }
    }

    /// Open the document store the configuration points at: the JSON file
    /// from `store.data_file` (or the default under the data directory), or
    /// a purely in-memory one when `store.in_memory` is set.
    pub fn from_config(config: Config, paths: &PathManager) -> Result<Self, SyncError> {
        let documents = match config.documents_file(paths.documents_file()) {
            Some(file) => {
                debug!(path = %file.display(), "Opening document store");
                MemoryDocumentStore::open(file)?
            }
            None => {
                debug!("Using in-memory document store");
                MemoryDocumentStore::new()
            }
        };
        Ok(Self::new(config, documents, Arc::new(SystemClock)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn documents(&self) -> &MemoryDocumentStore {
        &self.documents
    }

    pub fn store(&self) -> &Arc<SyncStore> {
        &self.store
    }

    pub fn auth(&self) -> &AuthProvider {
        &self.auth
    }

    /// Sign in through the auth provider and wait for the store to open the
    /// session, so login failures reach the caller.
    pub async fn sign_in(&self, identity: Identity) -> Result<(), SyncError> {
        self.auth.sign_in(identity.clone());
        self.store.set_identity(Some(identity)).await
    }

    pub async fn sign_out(&self) {
        self.auth.sign_out();
        self.store.sign_out().await;
    }

    pub async fn shutdown(self) {
        self.auth_task.abort();
        self.store.shutdown().await;
        info!(operation = "shutdown", "Context shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinesync_gateway::DocumentPath;
    use cinesync_models::{ListName, MediaKind, NewMediaItem};

    fn new_item(id: u64) -> NewMediaItem {
        NewMediaItem {
            id,
            title: "Example".to_string(),
            media_kind: MediaKind::Tv,
            release_year: 2019,
            rating: 8.1,
            poster_ref: String::new(),
        }
    }

    #[tokio::test]
    async fn test_sign_in_uses_configured_collection() {
        let mut config = Config::default();
        config.store.collection = "profiles".to_string();
        let context = AppContext::new(config, MemoryDocumentStore::new(), Arc::new(SystemClock));

        context.sign_in(Identity::new("u1").unwrap()).await.unwrap();
        assert_eq!(context.auth().current(), Some(Identity::new("u1").unwrap()));
        assert!(context
            .documents()
            .peek(&DocumentPath::new("profiles", "u1"))
            .is_some());

        context.sign_out().await;
        assert!(context.store().active_identity().is_none());
        context.shutdown().await;
    }

    #[tokio::test]
    async fn test_from_config_persists_between_contexts() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::from_base(dir.path());
        paths.ensure_directories().unwrap();
        let identity = Identity::new("u1").unwrap();

        let context = AppContext::from_config(Config::default(), &paths).unwrap();
        context.sign_in(identity.clone()).await.unwrap();
        context.store().wait_until_loaded().await.unwrap();
        context
            .store()
            .add(ListName::Watchlist, new_item(1399))
            .await
            .unwrap();
        context.shutdown().await;

        let context = AppContext::from_config(Config::default(), &paths).unwrap();
        context.sign_in(identity).await.unwrap();
        let document = context.store().wait_until_loaded().await.unwrap().unwrap();
        assert_eq!(document.watchlist.len(), 1);
        assert_eq!(document.watchlist[0].id, 1399);
        context.shutdown().await;
    }

    #[tokio::test]
    async fn test_in_memory_config_skips_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::from_base(dir.path());
        let mut config = Config::default();
        config.store.in_memory = true;

        let context = AppContext::from_config(config, &paths).unwrap();
        assert!(context.documents().persist_path().is_none());
        context.shutdown().await;
        assert!(!paths.documents_file().exists());
    }
}
