use chrono::SecondsFormat;
use cinesync_models::membership::without_member;
use cinesync_models::{Identity, ListName, MediaItem, UserDocument};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::GatewayError;
use crate::subscription::Subscription;
use crate::traits::{DocumentPath, DocumentStore, FieldUpdate};

pub const DEFAULT_COLLECTION: &str = "users";

const UPDATED_AT_FIELD: &str = "updatedAt";

/// The only component that reads or writes user documents.
///
/// Each authenticated identity owns one document at `{collection}/{uid}`
/// holding a watchlist, a favorites list and two timestamps.
pub struct UserDocumentGateway {
    store: Arc<dyn DocumentStore>,
    collection: String,
    clock: Arc<dyn Clock>,
}

impl UserDocumentGateway {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            collection: DEFAULT_COLLECTION.to_string(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn document_path(&self, identity: &Identity) -> DocumentPath {
        DocumentPath::new(self.collection.as_str(), identity.uid())
    }

    /// Create the user's document with empty lists unless one already exists.
    ///
    /// Returns `true` if a document was created. Never overwrites an existing
    /// document, so `createdAt` keeps the value from the first call.
    #[instrument(skip_all, fields(uid = %identity))]
    pub async fn ensure_document(&self, identity: &Identity) -> Result<bool, GatewayError> {
        let path = self.document_path(identity);
        let existing = self.store.get(&path).await.map_err(GatewayError::read_failed)?;
        if existing.is_some() {
            debug!(operation = "ensure_document", "Document already exists");
            return Ok(false);
        }

        let document = UserDocument::empty(self.clock.now());
        let data = to_value(&path, &document)?;
        self.store
            .set(&path, data)
            .await
            .map_err(|e| GatewayError::write_failed(&path, e))?;

        info!(operation = "ensure_document", path = %path, "Created user document");
        Ok(true)
    }

    /// Fetch the user's document as of now. `Ok(None)` when it does not exist
    /// yet or cannot be read as a user document.
    #[instrument(skip_all, fields(uid = %identity))]
    pub async fn read_document(
        &self,
        identity: &Identity,
    ) -> Result<Option<UserDocument>, GatewayError> {
        let path = self.document_path(identity);
        let raw = self.store.get(&path).await.map_err(GatewayError::read_failed)?;
        Ok(raw.and_then(|value| decode_document(&path, value)))
    }

    /// Union-append `item` to `list`.
    ///
    /// The store skips an entry deeply equal to an existing one (every field,
    /// `addedDate` included). Two adds of the same id with different
    /// timestamps therefore produce two entries; callers wanting one entry
    /// per id must check membership first.
    #[instrument(skip_all, fields(uid = %identity, list = %list, id = item.id))]
    pub async fn add_item(
        &self,
        identity: &Identity,
        list: ListName,
        item: &MediaItem,
    ) -> Result<(), GatewayError> {
        let path = self.document_path(identity);
        let element = item_value(&path, item)?;

        self.store
            .update(
                &path,
                vec![
                    (list.field_name().to_string(), FieldUpdate::ArrayUnion(vec![element])),
                    self.touch(),
                ],
            )
            .await
            .map_err(|e| {
                warn!(operation = "add_item", error = %e, "Add rejected");
                GatewayError::write_failed(&path, e)
            })?;

        debug!(operation = "add_item", "Item added");
        Ok(())
    }

    /// Remove every entry of `list` whose id is `id`.
    ///
    /// Reads the document, filters the list and writes it back whole. The
    /// read and the write are separate round trips: a concurrent remove from
    /// another client computed from the same read can undo this one.
    #[instrument(skip_all, fields(uid = %identity, list = %list, id))]
    pub async fn remove_item(
        &self,
        identity: &Identity,
        list: ListName,
        id: u64,
    ) -> Result<(), GatewayError> {
        let path = self.document_path(identity);
        let Some(document) = self.read_document(identity).await? else {
            debug!(operation = "remove_item", "No user document, nothing to remove");
            return Ok(());
        };

        let current = document.list(list);
        let remaining = without_member(current, id);
        debug!(
            operation = "remove_item",
            before = current.len(),
            after = remaining.len(),
            "Writing filtered list"
        );

        let remaining = to_value(&path, &remaining)?;
        self.store
            .update(
                &path,
                vec![
                    (list.field_name().to_string(), FieldUpdate::Set(remaining)),
                    self.touch(),
                ],
            )
            .await
            .map_err(|e| {
                warn!(operation = "remove_item", error = %e, "Remove rejected");
                GatewayError::write_failed(&path, e)
            })?;

        Ok(())
    }

    /// Remove entries deeply equal to `item`, `addedDate` included. Entries
    /// sharing only the id are kept.
    #[instrument(skip_all, fields(uid = %identity, list = %list, id = item.id))]
    pub async fn remove_exact(
        &self,
        identity: &Identity,
        list: ListName,
        item: &MediaItem,
    ) -> Result<(), GatewayError> {
        let path = self.document_path(identity);
        let element = item_value(&path, item)?;

        self.store
            .update(
                &path,
                vec![
                    (list.field_name().to_string(), FieldUpdate::ArrayRemove(vec![element])),
                    self.touch(),
                ],
            )
            .await
            .map_err(|e| GatewayError::write_failed(&path, e))
    }

    /// Open a live feed of the user's document. The first snapshot is the
    /// current state (`None` if the document does not exist yet).
    #[instrument(skip_all, fields(uid = %identity))]
    pub async fn subscribe(&self, identity: &Identity) -> Result<Subscription, GatewayError> {
        let path = self.document_path(identity);
        let listener = self
            .store
            .listen(&path)
            .await
            .map_err(GatewayError::read_failed)?;
        debug!(
            operation = "subscribe",
            store = self.store.store_name(),
            path = %path,
            "Subscribed to user document"
        );
        Ok(Subscription::new(path, listener))
    }

    fn touch(&self) -> (String, FieldUpdate) {
        (
            UPDATED_AT_FIELD.to_string(),
            FieldUpdate::Set(Value::String(
                self.clock.now().to_rfc3339_opts(SecondsFormat::AutoSi, true),
            )),
        )
    }
}

/// Read a raw document as a [`UserDocument`]; malformed documents count as absent.
pub(crate) fn decode_document(path: &DocumentPath, value: Value) -> Option<UserDocument> {
    match serde_json::from_value::<UserDocument>(value) {
        Ok(document) => Some(document),
        Err(e) => {
            warn!(path = %path, error = %e, "Malformed user document, treating as absent");
            None
        }
    }
}

/// Encode a list entry. A non-finite rating encodes as `null`, which no
/// longer decodes as a user document.
fn item_value(path: &DocumentPath, item: &MediaItem) -> Result<Value, GatewayError> {
    if !item.rating.is_finite() {
        warn!(operation = "encode_item", rating = item.rating, "Rejected non-finite rating");
        return Err(GatewayError::WriteRejected {
            path: path.to_string(),
            reason: format!("rating must be a finite number, got {}", item.rating),
        });
    }
    to_value(path, item)
}

fn to_value<T: serde::Serialize>(path: &DocumentPath, value: &T) -> Result<Value, GatewayError> {
    serde_json::to_value(value).map_err(|e| GatewayError::WriteRejected {
        path: path.to_string(),
        reason: format!("could not encode document data: {}", e),
    })
}
