pub mod document;
pub mod manager;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use document::Collection;
pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::{IdentityStore, RecordStore};
