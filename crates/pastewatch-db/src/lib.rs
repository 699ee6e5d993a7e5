pub mod config;
pub mod database;
pub mod file;
pub mod mongo;
pub mod postgres;
pub mod store;

pub use config::{DatabaseConfig, FileStoreConfig, MongoConfig};
pub use database::Database;
pub use file::{FileStore, StoredPaste};
pub use mongo::{MongoPasteStore, PasteDocument};
pub use postgres::PgPasteStore;
pub use store::AnyStore;
