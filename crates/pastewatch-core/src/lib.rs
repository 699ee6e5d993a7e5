pub mod cycle;
pub mod dedup;
pub mod error;
pub mod models;
pub mod supervisor;
pub mod traits;


pub use cycle::{CycleOutcome, CycleSummary, DEFAULT_CONCURRENCY, ScrapeCycle};
pub use dedup::{DEFAULT_CACHE_CAPACITY, DedupCache};
pub use error::AppError;
pub use models::{Paste, compute_hash};
pub use supervisor::{
    HealthSignal, Supervisor, SupervisorConfig, SupervisorEvent, SupervisorReporter,
    TracingSupervisorReporter,
};
pub use traits::{FeedClient, FetchOutcome, HealthReporter, PasteStore};
