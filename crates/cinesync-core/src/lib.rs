pub mod auth;
pub mod context;
pub mod error;
pub mod store;

pub use cinesync_models::membership::{count_members, find_member, is_member, without_member};

pub use auth::AuthProvider;
pub use context::AppContext;
pub use error::SyncError;
pub use store::{DocumentState, StoreState, SyncStore};
