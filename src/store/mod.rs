//! Session store façade and tick driver

mod session_store;
mod ticker;

pub use session_store::{SessionStore, StoreOptions, StoreSnapshot};
pub use ticker::{SharedStore, TickDriver, TickHandle, TickSlot};
