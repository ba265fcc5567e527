// Id-based identity checks over a user's lists.
//
// The numeric id is the only identity criterion. `media_kind` is ignored, so
// a movie and a TV show sharing an id are the same entry as far as these
// functions are concerned.

use crate::media::MediaItem;

/// True if any entry of `items` has the given id. Empty lists are never members.
pub fn is_member(items: &[MediaItem], id: u64) -> bool {
    items.iter().any(|item| item.id == id)
}

/// First entry with the given id, in list order.
pub fn find_member(items: &[MediaItem], id: u64) -> Option<&MediaItem> {
    items.iter().find(|item| item.id == id)
}

/// How many entries share the given id. More than one means the list holds
/// duplicates added with different timestamps.
pub fn count_members(items: &[MediaItem], id: u64) -> usize {
    items.iter().filter(|item| item.id == id).count()
}

/// Order-preserving copy of `items` without any entry whose id is `id`.
pub fn without_member(items: &[MediaItem], id: u64) -> Vec<MediaItem> {
    items.iter().filter(|item| item.id != id).cloned().collect()
}
