use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::error::StoreError;
use crate::traits::{DocumentListener, DocumentPath, DocumentStore, FieldUpdate, ListenerRegistration};
use crate::write_gate::WriteGate;

type Documents = BTreeMap<String, Value>;
type ListenerMap = HashMap<String, Vec<(u64, mpsc::UnboundedSender<Option<Value>>)>>;

/// In-process document store with live listeners.
///
/// Cloning yields another handle to the same documents, so several gateways
/// (one per simulated client) can share one store. Optionally mirrors all
/// documents to a JSON file, rewritten after every commit.
#[derive(Clone)]
pub struct MemoryDocumentStore {
    inner: Arc<Inner>,
}

struct Inner {
    documents: Mutex<Documents>,
    listeners: Mutex<ListenerMap>,
    next_listener_id: AtomicU64,
    offline: AtomicBool,
    reject_writes: AtomicBool,
    gate: WriteGate,
    reads: AtomicUsize,
    writes: AtomicUsize,
    persist_path: Option<PathBuf>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::with_documents(Documents::new(), None)
    }

    /// Open a store persisted at `path`. A missing file starts empty; a
    /// corrupt one is logged and replaced on the next commit.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Persistence(format!("{}: {}", parent.display(), e)))?;
        }
        let documents = load_documents(&path);
        Ok(Self::with_documents(documents, Some(path)))
    }

    fn with_documents(documents: Documents, persist_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                documents: Mutex::new(documents),
                listeners: Mutex::new(HashMap::new()),
                next_listener_id: AtomicU64::new(1),
                offline: AtomicBool::new(false),
                reject_writes: AtomicBool::new(false),
                gate: WriteGate::new(),
                reads: AtomicUsize::new(0),
                writes: AtomicUsize::new(0),
                persist_path,
            }),
        }
    }

    pub fn persist_path(&self) -> Option<&Path> {
        self.inner.persist_path.as_deref()
    }

    /// Every operation fails with [`StoreError::Unavailable`] while offline.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Writes fail with [`StoreError::PermissionDenied`] while set.
    pub fn set_reject_writes(&self, reject: bool) {
        self.inner.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Park every subsequent write until released.
    pub fn hold_writes(&self) {
        self.inner.gate.hold();
    }

    /// Let `count` parked (or future) writes through, oldest first.
    pub fn release_writes(&self, count: usize) {
        self.inner.gate.release(count);
    }

    /// Stop parking writes and let all parked writes through.
    pub fn resume_writes(&self) {
        self.inner.gate.resume();
    }

    pub async fn wait_for_parked_writes(&self, count: usize) {
        self.inner.gate.wait_for_parked(count).await;
    }

    /// Number of `get` calls received, including failed ones.
    pub fn reads(&self) -> usize {
        self.inner.reads.load(Ordering::SeqCst)
    }

    /// Number of `set`/`update` calls received, including failed ones.
    pub fn writes(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self, path: &DocumentPath) -> usize {
        self.inner
            .lock_listeners()
            .get(&path.to_string())
            .map(|listeners| listeners.len())
            .unwrap_or(0)
    }

    /// Raw document contents, bypassing fault injection and counters.
    pub fn peek(&self, path: &DocumentPath) -> Option<Value> {
        self.inner.lock_documents().get(&path.to_string()).cloned()
    }

    /// Pick up commits another process made to the persisted file. Every
    /// document that differs from memory is swapped in and delivered to its
    /// listeners. Returns how many documents changed.
    ///
    /// An unreadable file is an error and leaves memory untouched.
    pub fn reload(&self) -> Result<usize, StoreError> {
        let Some(persist_path) = &self.inner.persist_path else {
            return Ok(0);
        };
        if !persist_path.exists() {
            return Ok(0);
        }
        let on_disk = read_documents(persist_path)?;

        let mut documents = self.inner.lock_documents();
        let changed: BTreeSet<String> = documents
            .keys()
            .chain(on_disk.keys())
            .filter(|key| documents.get(*key) != on_disk.get(*key))
            .cloned()
            .collect();

        *documents = on_disk;
        for key in &changed {
            self.inner.notify(key, documents.get(key).cloned());
        }
        if !changed.is_empty() {
            debug!("Reloaded {} changed document(s) from {}", changed.len(), persist_path.display());
        }
        Ok(changed.len())
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }

    async fn begin_write(&self, path: &DocumentPath) -> Result<(), StoreError> {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.gate.pass().await;
        self.check_online()?;
        if self.inner.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::PermissionDenied(path.to_string()));
        }
        Ok(())
    }

    /// Apply `mutate` to a copy of the documents, persist it, then swap it in
    /// and notify listeners of `path`.
    fn commit<F>(&self, path: &DocumentPath, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Documents) -> Result<(), StoreError>,
    {
        let key = path.to_string();
        let mut documents = self.inner.lock_documents();

        let mut next = documents.clone();
        mutate(&mut next)?;

        if let Some(persist_path) = &self.inner.persist_path {
            save_documents(persist_path, &next)?;
        }

        *documents = next;
        let snapshot = documents.get(&key).cloned();
        self.inner.notify(&key, snapshot);
        Ok(())
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn lock_documents(&self) -> MutexGuard<'_, Documents> {
        self.documents.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_listeners(&self) -> MutexGuard<'_, ListenerMap> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    // Called with the documents lock held so deliveries follow commit order.
    fn notify(&self, key: &str, snapshot: Option<Value>) {
        let mut listeners = self.lock_listeners();
        if let Some(entries) = listeners.get_mut(key) {
            entries.retain(|(_, sender)| sender.send(snapshot.clone()).is_ok());
            trace!("Delivered snapshot of {} to {} listener(s)", key, entries.len());
            if entries.is_empty() {
                listeners.remove(key);
            }
        }
    }

    fn detach(&self, key: &str, listener_id: u64) {
        let mut listeners = self.lock_listeners();
        if let Some(entries) = listeners.get_mut(key) {
            entries.retain(|(id, _)| *id != listener_id);
            if entries.is_empty() {
                listeners.remove(key);
            }
        }
        debug!("Detached listener {} from {}", listener_id, key);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn store_name(&self) -> &str {
        "memory"
    }

    async fn get(&self, path: &DocumentPath) -> Result<Option<Value>, StoreError> {
        self.inner.reads.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        Ok(self.inner.lock_documents().get(&path.to_string()).cloned())
    }

    async fn set(&self, path: &DocumentPath, data: Value) -> Result<(), StoreError> {
        if !data.is_object() {
            return Err(StoreError::InvalidArgument(format!(
                "document data for {} must be an object",
                path
            )));
        }
        self.begin_write(path).await?;

        let key = path.to_string();
        self.commit(path, move |documents| {
            documents.insert(key, data);
            Ok(())
        })
    }

    async fn update(
        &self,
        path: &DocumentPath,
        updates: Vec<(String, FieldUpdate)>,
    ) -> Result<(), StoreError> {
        self.begin_write(path).await?;

        let key = path.to_string();
        self.commit(path, move |documents| {
            let document = documents
                .get_mut(&key)
                .and_then(Value::as_object_mut)
                .ok_or_else(|| StoreError::NotFound(key.clone()))?;
            for (field, update) in updates {
                apply_update(document, field, update);
            }
            Ok(())
        })
    }

    async fn listen(&self, path: &DocumentPath) -> Result<DocumentListener, StoreError> {
        self.check_online()?;

        let key = path.to_string();
        let listener_id = self.inner.next_listener_id.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = mpsc::unbounded_channel();

        {
            // Same lock order as commit: documents, then listeners.
            let documents = self.inner.lock_documents();
            let current = documents.get(&key).cloned();
            let _ = sender.send(current);
            self.inner
                .lock_listeners()
                .entry(key.clone())
                .or_default()
                .push((listener_id, sender));
        }
        debug!("Attached listener {} to {}", listener_id, key);

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let registration = ListenerRegistration::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.detach(&key, listener_id);
            }
        });

        Ok(DocumentListener {
            snapshots: receiver,
            registration,
        })
    }
}

fn apply_update(document: &mut Map<String, Value>, field: String, update: FieldUpdate) {
    match update {
        FieldUpdate::Set(value) => {
            document.insert(field, value);
        }
        FieldUpdate::ArrayUnion(elements) => {
            // A non-array field is replaced by the union with an empty array.
            let existing = document.remove(&field);
            let mut array = match existing {
                Some(Value::Array(array)) => array,
                _ => Vec::new(),
            };
            for element in elements {
                if !array.contains(&element) {
                    array.push(element);
                }
            }
            document.insert(field, Value::Array(array));
        }
        FieldUpdate::ArrayRemove(elements) => {
            let existing = document.remove(&field);
            let array = match existing {
                Some(Value::Array(array)) => array
                    .into_iter()
                    .filter(|value| !elements.contains(value))
                    .collect(),
                _ => Vec::new(),
            };
            document.insert(field, Value::Array(array));
        }
    }
}

fn load_documents(path: &Path) -> Documents {
    if !path.exists() {
        debug!("No document file at {}, starting empty", path.display());
        return Documents::new();
    }

    match read_documents(path) {
        Ok(documents) => {
            info!("Loaded {} document(s) from {}", documents.len(), path.display());
            documents
        }
        Err(e) => {
            warn!("{}. Starting empty; the file will be overwritten on the next write.", e);
            Documents::new()
        }
    }
}

fn read_documents(path: &Path) -> Result<Documents, StoreError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| StoreError::Persistence(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| StoreError::Persistence(format!("{} is corrupt: {}", path.display(), e)))
}

fn save_documents(path: &Path, documents: &Documents) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(documents)
        .map_err(|e| StoreError::Persistence(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| {
        warn!("Failed to write document file {}: {}", path.display(), e);
        StoreError::Persistence(format!("{}: {}", path.display(), e))
    })?;
    trace!("Saved {} document(s) to {}", documents.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests;
