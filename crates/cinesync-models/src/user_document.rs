use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::list::ListName;
use crate::media::MediaItem;

/// The durable per-user aggregate stored at `users/{uid}`.
///
/// Every field is required when deserializing. A document missing one of
/// them is treated as not existing yet by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    pub watchlist: Vec<MediaItem>, // Insertion order, append-on-add
    pub favorites: Vec<MediaItem>,
    pub created_at: DateTime<Utc>, // Set once on creation
    pub updated_at: DateTime<Utc>, // Overwritten by every mutation
}

impl UserDocument {
    /// A fresh document with both lists empty.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            watchlist: Vec::new(),
            favorites: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn list(&self, list: ListName) -> &[MediaItem] {
        match list {
            ListName::Watchlist => &self.watchlist,
            ListName::Favorites => &self.favorites,
        }
    }
}
