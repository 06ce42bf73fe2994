pub mod accounts;
pub mod connection;
pub mod listings;
pub mod sessions;
pub mod store;

pub use connection::{init_db, Database};
pub use store::SqliteStore;
