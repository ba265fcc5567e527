pub mod identity;
pub mod list;
pub mod media;
pub mod membership;
pub mod user_document;

pub use identity::{Identity, IdentityError};
pub use list::{ListName, ParseListNameError};
pub use media::{MediaItem, MediaKind, NewMediaItem, ParseMediaKindError};
pub use membership::{count_members, find_member, is_member, without_member};
pub use user_document::UserDocument;
