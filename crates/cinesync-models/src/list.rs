use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two per-user collections kept in a user document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ListName {
    Watchlist,
    Favorites,
}

impl ListName {
    pub const ALL: [ListName; 2] = [ListName::Watchlist, ListName::Favorites];

    /// Name of the document field holding this list.
    pub fn field_name(&self) -> &'static str {
        match self {
            ListName::Watchlist => "watchlist",
            ListName::Favorites => "favorites",
        }
    }
}

impl fmt::Display for ListName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown list '{0}' (expected 'watchlist' or 'favorites')")]
pub struct ParseListNameError(pub String);

impl FromStr for ListName {
    type Err = ParseListNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "watchlist" => Ok(ListName::Watchlist),
            "favorites" | "favourites" => Ok(ListName::Favorites),
            other => Err(ParseListNameError(other.to_string())),
        }
    }
}
