use pastewatch_core::error::AppError;
use pastewatch_core::models::Paste;
use pastewatch_core::traits::PasteStore;

use crate::file::FileStore;
use crate::mongo::MongoPasteStore;
use crate::postgres::PgPasteStore;

/// Backend chosen at startup from `STORAGE_TYPE`.
#[derive(Clone)]
pub enum AnyStore {
    Postgres(PgPasteStore),
    Mongo(MongoPasteStore),
    File(FileStore),
}

impl AnyStore {
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Mongo(_) => "mongo",
            Self::File(_) => "file",
        }
    }
}

impl From<PgPasteStore> for AnyStore {
    fn from(store: PgPasteStore) -> Self {
        Self::Postgres(store)
    }
}

impl From<MongoPasteStore> for AnyStore {
    fn from(store: MongoPasteStore) -> Self {
        Self::Mongo(store)
    }
}

impl From<FileStore> for AnyStore {
    fn from(store: FileStore) -> Self {
        Self::File(store)
    }
}

impl PasteStore for AnyStore {
    async fn initialize(&self) -> Result<(), AppError> {
        match self {
            Self::Postgres(store) => store.initialize().await,
            Self::Mongo(store) => store.initialize().await,
            Self::File(store) => store.initialize().await,
        }
    }

    async fn is_saved(&self, key: &str) -> Result<bool, AppError> {
        match self {
            Self::Postgres(store) => store.is_saved(key).await,
            Self::Mongo(store) => store.is_saved(key).await,
            Self::File(store) => store.is_saved(key).await,
        }
    }

    async fn save(&self, paste: &Paste) -> Result<(), AppError> {
        match self {
            Self::Postgres(store) => store.save(paste).await,
            Self::Mongo(store) => store.save(paste).await,
            Self::File(store) => store.save(paste).await,
        }
    }
}
