use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Mutex;
use tokio::sync::mpsc;
use crate::error::StoreError;

/// Location of a single document: `{collection}/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    collection: String,
    id: String,
}

impl DocumentPath {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A single-field change applied by [`DocumentStore::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Replace the field with a literal value.
    Set(Value),
    /// Append each element not already deeply equal to an existing element.
    ArrayUnion(Vec<Value>),
    /// Remove every element deeply equal to one of the given elements.
    ArrayRemove(Vec<Value>),
}

/// Detaches a listener from its store. Runs at most once, on `detach` or drop.
pub struct ListenerRegistration {
    detach: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl ListenerRegistration {
    pub fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Mutex::new(Some(Box::new(detach))),
        }
    }

    pub fn detach(&self) {
        let detach = self
            .detach
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(detach) = detach {
            detach();
        }
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistration").finish_non_exhaustive()
    }
}

/// Raw snapshot feed for one document. `None` snapshots mean the document
/// does not exist.
#[derive(Debug)]
pub struct DocumentListener {
    pub snapshots: mpsc::UnboundedReceiver<Option<Value>>,
    pub registration: ListenerRegistration,
}

/// Primitives the gateway needs from a document database.
///
/// Implementations must deliver listener snapshots in commit order, and must
/// send a newly registered listener the current snapshot before any later
/// commit.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn store_name(&self) -> &str;

    async fn get(&self, path: &DocumentPath) -> Result<Option<Value>, StoreError>;

    /// Create or fully replace the document. `data` must be a JSON object.
    async fn set(&self, path: &DocumentPath, data: Value) -> Result<(), StoreError>;

    /// Apply field updates to an existing document. Fails with
    /// [`StoreError::NotFound`] if the document does not exist.
    async fn update(
        &self,
        path: &DocumentPath,
        updates: Vec<(String, FieldUpdate)>,
    ) -> Result<(), StoreError>;

    async fn listen(&self, path: &DocumentPath) -> Result<DocumentListener, StoreError>;
}
