pub mod connection;
pub mod memory;
pub mod store;

pub use connection::{connect, connect_with_settings, DbPool};
pub use memory::InMemoryInventoryStore;
pub use store::SqlInventoryStore;
