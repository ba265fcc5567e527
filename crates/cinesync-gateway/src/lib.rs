pub mod clock;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod subscription;
pub mod traits;
mod write_gate;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{GatewayError, StoreError};
pub use gateway::{UserDocumentGateway, DEFAULT_COLLECTION};
pub use memory::MemoryDocumentStore;
pub use subscription::{Subscription, SubscriptionHandle, SubscriptionState};
pub use traits::{DocumentListener, DocumentPath, DocumentStore, FieldUpdate, ListenerRegistration};
