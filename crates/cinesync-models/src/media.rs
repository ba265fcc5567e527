use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single piece of media saved to one of a user's lists.
///
/// Field names on the wire follow the documents already stored by the web
/// client (`type`, `year`, `poster`, `addedDate`), so existing user documents
/// deserialize unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    pub id: u64, // Upstream catalog id; movie and TV ids share one numeric space here
    pub title: String,
    #[serde(rename = "type")]
    pub media_kind: MediaKind,
    #[serde(rename = "year")]
    pub release_year: u32,
    pub rating: f64, // Upstream score, 0-10 for the movie/TV catalog
    #[serde(rename = "poster")]
    pub poster_ref: String,
    #[serde(rename = "addedDate")]
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown media kind '{0}' (expected 'movie' or 'tv')")]
pub struct ParseMediaKindError(pub String);

impl FromStr for MediaKind {
    type Err = ParseMediaKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "movie" => Ok(MediaKind::Movie),
            "tv" | "show" => Ok(MediaKind::Tv),
            other => Err(ParseMediaKindError(other.to_string())),
        }
    }
}

/// A media item as handed over by a view, before it has been stamped with
/// the time it was added.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMediaItem {
    pub id: u64,
    pub title: String,
    #[serde(rename = "type")]
    pub media_kind: MediaKind,
    #[serde(rename = "year")]
    pub release_year: u32,
    pub rating: f64,
    #[serde(rename = "poster")]
    pub poster_ref: String,
}

impl NewMediaItem {
    pub fn stamp(self, added_at: DateTime<Utc>) -> MediaItem {
        MediaItem {
            id: self.id,
            title: self.title,
            media_kind: self.media_kind,
            release_year: self.release_year,
            rating: self.rating,
            poster_ref: self.poster_ref,
            added_at,
        }
    }
}

impl From<MediaItem> for NewMediaItem {
    fn from(item: MediaItem) -> Self {
        Self {
            id: item.id,
            title: item.title,
            media_kind: item.media_kind,
            release_year: item.release_year,
            rating: item.rating,
            poster_ref: item.poster_ref,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> MediaItem {
        MediaItem {
            id: 42,
            title: "Example".to_string(),
            media_kind: MediaKind::Movie,
            release_year: 2020,
            rating: 7.5,
            poster_ref: "/p.jpg".to_string(),
            added_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["type"], "movie");
        assert_eq!(json["year"], 2020);
        assert_eq!(json["poster"], "/p.jpg");
        assert_eq!(json["addedDate"], "2024-05-01T12:00:00Z");
        assert!(json.get("media_kind").is_none());
    }

    #[test]
    fn test_reads_existing_client_document_entry() {
        let raw = r#"{"id":1399,"title":"Game of Thrones","type":"tv","year":2011,
            "rating":8.4,"poster":"/u3bZgnGQ9T01sWNhyveQz0wH0Hl.jpg",
            "addedDate":"2025-03-14T09:26:53.589Z"}"#;
        let item: MediaItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item.id, 1399);
        assert_eq!(item.media_kind, MediaKind::Tv);
        assert_eq!(item.release_year, 2011);
    }

    #[test]
    fn test_media_kind_parse() {
        assert_eq!("movie".parse::<MediaKind>().unwrap(), MediaKind::Movie);
        assert_eq!("TV".parse::<MediaKind>().unwrap(), MediaKind::Tv);
        assert!("anime".parse::<MediaKind>().is_err());
    }

    #[test]
    fn test_stamp_keeps_fields() {
        let item = sample();
        let later = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let restamped = NewMediaItem::from(item.clone()).stamp(later);
        assert_eq!(restamped.id, item.id);
        assert_eq!(restamped.title, item.title);
        assert_eq!(restamped.added_at, later);
        assert_ne!(restamped, item);
    }
}
