//! One bounded-concurrency pass over a feed listing.
//!
//! Every listed paste gets its own task, spawned eagerly. A task runs only
//! while it holds a permit from the shared admission limiter, so at most
//! `concurrency` pastes are in progress at once. Permits are owned by the
//! task and dropped on every exit path.
//!
//! The first hard failure or throttling signal halts the cycle. Tasks still
//! waiting for admission give up without touching the network; tasks past
//! admission skip the fetch unless it already started. Requests in flight
//! run to completion. Throttling takes precedence over failure when the
//! results are reduced.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::models::Paste;
use crate::traits::{FeedClient, FetchOutcome, PasteStore};

/// Pastes fetched in parallel when no bound is configured.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Counters for a cycle that ran to completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Pastes in the listing.
    pub listed: usize,
    /// Pastes fetched and stored during this cycle.
    pub saved: usize,
    /// Pastes skipped because the store already had them.
    pub skipped: usize,
}

/// How a scrape cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Every listed paste was stored or already present.
    Completed(CycleSummary),
    /// The listing, or at least one paste, failed with a hard error.
    Failed(AppError),
    /// The provider is rate limiting us; the caller should back off.
    Throttled,
}

/// What a single paste task ended with.
#[derive(Debug)]
enum PasteOutcome {
    Saved,
    AlreadySaved,
    Throttled,
    Failed(AppError),
    /// Halted before doing any provider work.
    Abandoned,
}

/// Latch that lets exactly one task announce throttling per cycle.
#[derive(Debug, Default)]
struct ThrottleLatch(AtomicBool);

impl ThrottleLatch {
    /// Returns true for the first caller only.
    fn trigger(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Runs scrape cycles against a feed and a store.
///
/// The admission limiter lives as long as the cycle runner, so the bound
/// is enforced per runner rather than per listing.
pub struct ScrapeCycle<F, S>
where
    F: FeedClient,
    S: PasteStore,
{
    feed: F,
    store: S,
    limiter: Arc<Semaphore>,
    concurrency: usize,
}

impl<F, S> ScrapeCycle<F, S>
where
    F: FeedClient,
    S: PasteStore,
{
    /// Create a cycle runner. A concurrency of zero is raised to one.
    pub fn new(feed: F, store: S, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            feed,
            store,
            limiter: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run one cycle: list, fan out, and reduce to a single outcome.
    pub async fn run(&self) -> CycleOutcome {
        let pastes = match self.feed.list_latest().await {
            Ok(pastes) => pastes,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list latest pastes");
                return CycleOutcome::Failed(e);
            }
        };

        let listed = pastes.len();
        tracing::info!(listed, concurrency = self.concurrency, "Scraping listing");

        let halt = CancellationToken::new();
        let latch = Arc::new(ThrottleLatch::default());
        let mut tasks = JoinSet::new();

        for paste in pastes {
            let task = PasteTask {
                feed: self.feed.clone(),
                store: self.store.clone(),
                limiter: Arc::clone(&self.limiter),
                halt: halt.clone(),
                latch: Arc::clone(&latch),
            };
            tasks.spawn(task.process(paste));
        }

        let mut summary = CycleSummary {
            listed,
            ..Default::default()
        };
        let mut failure: Option<AppError> = None;

        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.unwrap_or_else(|e| {
                halt.cancel();
                PasteOutcome::Failed(AppError::Generic(format!("Paste task aborted: {e}")))
            });

            match outcome {
                PasteOutcome::Saved => summary.saved += 1,
                PasteOutcome::AlreadySaved => summary.skipped += 1,
                PasteOutcome::Abandoned | PasteOutcome::Throttled => {}
                PasteOutcome::Failed(e) => {
                    if failure.is_none() {
                        failure = Some(e);
                    } else {
                        tracing::debug!(error = %e, "Additional paste failure in halted cycle");
                    }
                }
            }
        }

        if latch.is_triggered() {
            CycleOutcome::Throttled
        } else if let Some(e) = failure {
            CycleOutcome::Failed(e)
        } else {
            tracing::info!(
                listed = summary.listed,
                saved = summary.saved,
                skipped = summary.skipped,
                "Scrape cycle finished"
            );
            CycleOutcome::Completed(summary)
        }
    }
}

/// Everything one paste task needs, owned so the task can be spawned.
struct PasteTask<F, S> {
    feed: F,
    store: S,
    limiter: Arc<Semaphore>,
    halt: CancellationToken,
    latch: Arc<ThrottleLatch>,
}

impl<F, S> PasteTask<F, S>
where
    F: FeedClient,
    S: PasteStore,
{
    async fn process(self, paste: Paste) -> PasteOutcome {
        let outcome = self.scrape(paste).await;
        if matches!(outcome, PasteOutcome::Throttled | PasteOutcome::Failed(_)) {
            self.halt.cancel();
        }
        outcome
    }

    async fn scrape(&self, mut paste: Paste) -> PasteOutcome {
        // Held until this function returns, whichever way it returns.
        let _permit = tokio::select! {
            biased;
            () = self.halt.cancelled() => return PasteOutcome::Abandoned,
            permit = Arc::clone(&self.limiter).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(e) => return PasteOutcome::Failed(AppError::Generic(format!("Admission limiter closed: {e}"))),
            },
        };

        match self.store.is_saved(&paste.key).await {
            Ok(true) => {
                tracing::debug!(key = %paste.key, "Already saved");
                return PasteOutcome::AlreadySaved;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(key = %paste.key, error = %e, "Dedup check failed");
                return PasteOutcome::Failed(e);
            }
        }

        if self.halt.is_cancelled() {
            return PasteOutcome::Abandoned;
        }

        let content = match self.feed.fetch_content(&paste.key).await {
            Ok(FetchOutcome::Content(content)) => content,
            Ok(FetchOutcome::Throttled) => {
                if self.latch.trigger() {
                    tracing::warn!(key = %paste.key, "Provider is throttling, halting cycle");
                } else {
                    tracing::debug!(key = %paste.key, "Throttled again, pause already scheduled");
                }
                return PasteOutcome::Throttled;
            }
            Err(e) => {
                tracing::warn!(key = %paste.key, error = %e, "Fetch failed");
                return PasteOutcome::Failed(e);
            }
        };

        paste.content = content;
        match self.store.save(&paste).await {
            Ok(()) => {
                tracing::debug!(key = %paste.key, bytes = paste.content.len(), "Saved paste");
                PasteOutcome::Saved
            }
            Err(e) => {
                tracing::warn!(key = %paste.key, error = %e, "Save failed");
                PasteOutcome::Failed(e)
            }
        }
    }
}
