use pastewatch_core::error::AppError;
use pastewatch_core::models::Paste;
use pastewatch_core::traits::PasteStore;
use pastewatch_core::DedupCache;
use sqlx::{PgPool, Pool, Postgres};

/// PostgreSQL-backed paste store with an in-memory dedup cache in front.
#[derive(Clone)]
pub struct PgPasteStore {
    pool: Pool<Postgres>,
    cache: DedupCache,
}

impl PgPasteStore {
    pub fn new(pool: PgPool) -> Self {
        Self::with_cache(pool, DedupCache::default())
    }

    pub fn with_cache(pool: PgPool, cache: DedupCache) -> Self {
        Self { pool, cache }
    }

    pub fn cache(&self) -> &DedupCache {
        &self.cache
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    /// Load a stored paste by key.
    pub async fn get(&self, key: &str) -> Result<Option<Paste>, AppError> {
        let row = sqlx::query_as::<_, PasteRow>(
            r#"
            SELECT key, date, expire, title, syntax, username, content
            FROM pastes
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct PasteRow {
    key: String,
    date: String,
    expire: String,
    title: String,
    syntax: String,
    username: String,
    content: String,
}

impl From<PasteRow> for Paste {
    fn from(row: PasteRow) -> Self {
        Paste {
            key: row.key,
            date: row.date,
            expire: row.expire,
            title: row.title,
            syntax: row.syntax,
            user: row.username,
            content: row.content,
        }
    }
}

// -- Trait implementation --

impl PasteStore for PgPasteStore {
    async fn initialize(&self) -> Result<(), AppError> {
        self.health_check().await?;
        self.migrate().await?;
        tracing::info!("Postgres paste store ready");
        Ok(())
    }

    async fn is_saved(&self, key: &str) -> Result<bool, AppError> {
        if self.cache.contains(key) {
            return Ok(true);
        }

        let (exists,): (bool,) =
            sqlx::query_as(r#"SELECT EXISTS(SELECT 1 FROM pastes WHERE key = $1)"#)
                .bind(key)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(exists)
    }

    async fn save(&self, paste: &Paste) -> Result<(), AppError> {
        // Postgres TEXT cannot hold NUL; the hash still covers the raw content.
        let content = paste.content.replace('\0', "");

        sqlx::query(
            r#"
            INSERT INTO pastes (key, date, expire, title, syntax, username, content, content_hash, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&paste.key)
        .bind(&paste.date)
        .bind(&paste.expire)
        .bind(&paste.title)
        .bind(&paste.syntax)
        .bind(&paste.user)
        .bind(&content)
        .bind(paste.content_hash())
        .bind(paste.published_at())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::DuplicatePaste(paste.key.clone())
            }
            other => AppError::DatabaseError(format!("Can't insert paste {}: {other}", paste.key)),
        })?;

        self.cache.insert(paste.key.clone());
        Ok(())
    }
}
