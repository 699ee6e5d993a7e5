use std::future::Future;

use crate::error::AppError;
use crate::models::Paste;

/// Result of asking the provider for one paste's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Raw paste content.
    Content(String),
    /// The provider asked us to slow down; no content was returned.
    Throttled,
}

/// Source of recently published pastes.
pub trait FeedClient: Send + Sync + Clone + 'static {
    /// List the most recent pastes, content unset.
    fn list_latest(&self) -> impl Future<Output = Result<Vec<Paste>, AppError>> + Send;

    /// Fetch the content of a single paste.
    ///
    /// Throttling is reported as `Ok(FetchOutcome::Throttled)`, never as an error.
    fn fetch_content(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<FetchOutcome, AppError>> + Send;
}

/// Durable sink for scraped pastes.
///
/// Implementations own a [`DedupCache`](crate::dedup::DedupCache): `is_saved`
/// consults it before the durable lookup and `save` inserts into it only
/// once the durable write succeeded.
pub trait PasteStore: Send + Sync + Clone + 'static {
    /// Establish the durable connection. Called once before the first cycle.
    fn initialize(&self) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Whether a paste with `key` was already stored. "Not found" is `Ok(false)`.
    fn is_saved(&self, key: &str) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Persist a fetched paste. A duplicate key is an error, never a silent overwrite.
    fn save(&self, paste: &Paste) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// One-way notifications to an external liveness monitor.
///
/// Errors mean the notification itself could not be delivered.
pub trait HealthReporter: Send + Sync {
    fn report_start(&self) -> impl Future<Output = Result<(), AppError>> + Send;

    fn report_success(&self) -> impl Future<Output = Result<(), AppError>> + Send;

    fn report_failure(&self, message: &str)
    -> impl Future<Output = Result<(), AppError>> + Send;
}
