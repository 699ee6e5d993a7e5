use mongodb::bson::{self, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database as MongoDatabase, IndexModel};
use pastewatch_core::error::AppError;
use pastewatch_core::models::Paste;
use pastewatch_core::traits::PasteStore;
use pastewatch_core::DedupCache;
use serde::{Deserialize, Serialize};

use crate::config::MongoConfig;

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// A paste as stored in the MongoDB collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasteDocument {
    #[serde(flatten)]
    pub paste: Paste,
    pub content_hash: String,
    pub published_at: Option<bson::DateTime>,
    pub scraped_at: bson::DateTime,
}

impl PasteDocument {
    fn new(paste: &Paste) -> Self {
        Self {
            content_hash: paste.content_hash(),
            published_at: paste
                .published_at()
                .map(|at| bson::DateTime::from_millis(at.timestamp_millis())),
            scraped_at: bson::DateTime::now(),
            paste: paste.clone(),
        }
    }
}

/// MongoDB-backed paste store with an in-memory dedup cache in front.
///
/// Uniqueness of `key` is enforced by a unique index created in `initialize`.
#[derive(Clone)]
pub struct MongoPasteStore {
    database: MongoDatabase,
    pastes: Collection<PasteDocument>,
    cache: DedupCache,
}

impl MongoPasteStore {
    /// Build a client from the configured URI. No connection is made until
    /// the first operation.
    pub async fn connect(config: &MongoConfig, cache: DedupCache) -> Result<Self, AppError> {
        let client = Client::with_uri_str(&config.uri)
            .await
            .map_err(|e| AppError::ConfigError(format!("Invalid MONGO_URI: {e}")))?;
        let database = client.database(&config.database);
        let pastes = database.collection(&config.collection);

        Ok(Self {
            database,
            pastes,
            cache,
        })
    }

    pub fn cache(&self) -> &DedupCache {
        &self.cache
    }

    /// Load a stored paste by key.
    pub async fn get(&self, key: &str) -> Result<Option<PasteDocument>, AppError> {
        self.pastes
            .find_one(doc! { "key": key })
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    async fn ensure_key_index(&self) -> Result<(), AppError> {
        let index = IndexModel::builder()
            .keys(doc! { "key": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.pastes
            .create_index(index)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create key index: {e}")))?;
        Ok(())
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE
    )
}

impl PasteStore for MongoPasteStore {
    async fn initialize(&self) -> Result<(), AppError> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to reach MongoDB: {e}")))?;
        self.ensure_key_index().await?;
        tracing::info!(collection = %self.pastes.name(), "Mongo paste store ready");
        Ok(())
    }

    async fn is_saved(&self, key: &str) -> Result<bool, AppError> {
        if self.cache.contains(key) {
            return Ok(true);
        }

        let count = self
            .pastes
            .count_documents(doc! { "key": key })
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(count > 0)
    }

    async fn save(&self, paste: &Paste) -> Result<(), AppError> {
        self.pastes
            .insert_one(PasteDocument::new(paste))
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    AppError::DuplicatePaste(paste.key.clone())
                } else {
                    AppError::DatabaseError(format!("Can't insert paste {}: {e}", paste.key))
                }
            })?;

        self.cache.insert(paste.key.clone());
        Ok(())
    }
}
