//! Interval-driven supervisor around the scrape cycle.
//!
//! ```text
//! IDLE --[tick]--> RUNNING --[completed]--> IDLE
//!                     |
//!                     +--[throttled]--> COOLING_DOWN --[cooldown elapsed]--> IDLE
//!                     |
//!                     +--[failed / health report error]--> TERMINATED
//! ```
//!
//! Cycles never overlap: the next tick is awaited only after the current
//! cycle resolved. A failed cycle is not retried here; the process exits and
//! the external process manager decides whether to restart it.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::cycle::{CycleOutcome, CycleSummary, DEFAULT_CONCURRENCY, ScrapeCycle};
use crate::error::AppError;
use crate::traits::{FeedClient, HealthReporter, PasteStore};

/// Shortest tick period the supervisor accepts.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Signal sent to the health monitor around each cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthSignal {
    Start,
    Success,
    Fail(String),
}

impl HealthSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthSignal::Start => "start",
            HealthSignal::Success => "success",
            HealthSignal::Fail(_) => "fail",
        }
    }

    async fn send<H: HealthReporter>(&self, health: &H) -> Result<(), AppError> {
        match self {
            HealthSignal::Start => health.report_start().await,
            HealthSignal::Success => health.report_success().await,
            HealthSignal::Fail(message) => health.report_failure(message).await,
        }
    }
}

/// Configuration for the supervisor loop.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Period between cycle starts.
    pub interval: Duration,
    /// Extra pause after a throttled cycle.
    pub cooldown: Duration,
    /// Maximum pastes in flight within one cycle.
    pub concurrency: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(180),
            cooldown: Duration::from_secs(120),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl SupervisorConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// Events emitted by the supervisor for monitoring/logging.
#[derive(Debug, Clone)]
pub enum SupervisorEvent<'a> {
    Started {
        interval: Duration,
        concurrency: usize,
    },
    Idle,
    CycleStarted,
    CycleCompleted {
        summary: &'a CycleSummary,
    },
    CycleFailed {
        error: &'a AppError,
    },
    Throttled {
        cooldown: Duration,
    },
    CooldownFinished,
    HealthReportFailed {
        signal: &'a HealthSignal,
        error: &'a AppError,
    },
    Terminated {
        error: &'a AppError,
    },
    Stopped,
}

/// Trait for receiving supervisor events (decoupled logging).
pub trait SupervisorReporter: Send + Sync {
    fn report(&self, event: SupervisorEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSupervisorReporter;

impl SupervisorReporter for TracingSupervisorReporter {
    fn report(&self, event: SupervisorEvent<'_>) {
        match event {
            SupervisorEvent::Started {
                interval,
                concurrency,
            } => {
                tracing::info!(interval_secs = interval.as_secs(), %concurrency, "Supervisor started");
            }
            SupervisorEvent::Idle => {
                tracing::info!("Waiting for timer");
            }
            SupervisorEvent::CycleStarted => {
                tracing::info!("Started scraper");
            }
            SupervisorEvent::CycleCompleted { summary } => {
                tracing::info!(
                    listed = summary.listed,
                    saved = summary.saved,
                    skipped = summary.skipped,
                    "Scrape cycle completed"
                );
            }
            SupervisorEvent::CycleFailed { error } => {
                let source = if error.is_feed_error() { "feed" } else { "store" };
                tracing::error!(%error, %source, "Scrape cycle failed");
            }
            SupervisorEvent::Throttled { cooldown } => {
                tracing::warn!(cooldown_secs = cooldown.as_secs(), "Provider throttling, slowing down");
            }
            SupervisorEvent::CooldownFinished => {
                tracing::info!("Cooldown finished");
            }
            SupervisorEvent::HealthReportFailed { signal, error } => {
                tracing::error!(signal = signal.as_str(), %error, "Health report failed");
            }
            SupervisorEvent::Terminated { error } => {
                tracing::error!(%error, "Supervisor terminated");
            }
            SupervisorEvent::Stopped => {
                tracing::info!("Supervisor stopped");
            }
        }
    }
}

/// Result of one supervised cycle that did not terminate the loop.
#[derive(Debug)]
enum TickResult {
    Completed(CycleSummary),
    Throttled,
}

/// Runs the scrape cycle on a fixed interval and reports health around it.
pub struct Supervisor<F, S, H>
where
    F: FeedClient,
    S: PasteStore,
    H: HealthReporter,
{
    cycle: ScrapeCycle<F, S>,
    health: H,
    config: SupervisorConfig,
}

impl<F, S, H> Supervisor<F, S, H>
where
    F: FeedClient,
    S: PasteStore,
    H: HealthReporter,
{
    pub fn new(feed: F, store: S, health: H, config: SupervisorConfig) -> Self {
        Self {
            cycle: ScrapeCycle::new(feed, store, config.concurrency),
            health,
            config,
        }
    }

    /// Run cycles until a fatal error or cancellation.
    ///
    /// Returns `Ok(())` only when `cancel_token` fires while idle or cooling
    /// down. A failed cycle or an undeliverable health signal ends the loop
    /// with that error.
    pub async fn run<R: SupervisorReporter>(
        &self,
        cancel_token: CancellationToken,
        reporter: &R,
    ) -> Result<(), AppError> {
        reporter.report(SupervisorEvent::Started {
            interval: self.config.interval,
            concurrency: self.cycle.concurrency(),
        });

        let result = self.supervise(&cancel_token, reporter).await;
        match &result {
            Ok(()) => reporter.report(SupervisorEvent::Stopped),
            Err(error) => reporter.report(SupervisorEvent::Terminated { error }),
        }
        result
    }

    /// Run a single supervised cycle without the timer.
    ///
    /// Throttling is reported to the monitor as a failure and returned as
    /// [`AppError::RateLimitExceeded`], since there is no next tick to defer to.
    pub async fn run_once<R: SupervisorReporter>(
        &self,
        reporter: &R,
    ) -> Result<CycleSummary, AppError> {
        match self.tick(reporter).await? {
            TickResult::Completed(summary) => Ok(summary),
            TickResult::Throttled => {
                reporter.report(SupervisorEvent::Throttled {
                    cooldown: Duration::ZERO,
                });
                let error = AppError::RateLimitExceeded;
                let _ = self
                    .signal(HealthSignal::Fail(error.to_string()), reporter)
                    .await;
                Err(error)
            }
        }
    }

    async fn supervise<R: SupervisorReporter>(
        &self,
        cancel_token: &CancellationToken,
        reporter: &R,
    ) -> Result<(), AppError> {
        let mut ticker = tokio::time::interval(self.config.interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            reporter.report(SupervisorEvent::Idle);
            tokio::select! {
                _ = ticker.tick() => {}
                () = cancel_token.cancelled() => return Ok(()),
            }

            match self.tick(reporter).await? {
                TickResult::Completed(_) => {}
                TickResult::Throttled => {
                    reporter.report(SupervisorEvent::Throttled {
                        cooldown: self.config.cooldown,
                    });
                    let interrupted = tokio::select! {
                        () = tokio::time::sleep(self.config.cooldown) => false,
                        () = cancel_token.cancelled() => true,
                    };

                    // The throttled cycle did not fail; close the monitor's run
                    // even when shutting down mid-cooldown.
                    self.signal(HealthSignal::Success, reporter).await?;
                    if interrupted {
                        return Ok(());
                    }
                    reporter.report(SupervisorEvent::CooldownFinished);
                    // Next cycle starts a full interval after the cooldown.
                    ticker.reset();
                }
            }
        }
    }

    async fn tick<R: SupervisorReporter>(&self, reporter: &R) -> Result<TickResult, AppError> {
        self.signal(HealthSignal::Start, reporter).await?;
        reporter.report(SupervisorEvent::CycleStarted);

        match self.cycle.run().await {
            CycleOutcome::Completed(summary) => {
                reporter.report(SupervisorEvent::CycleCompleted { summary: &summary });
                self.signal(HealthSignal::Success, reporter).await?;
                Ok(TickResult::Completed(summary))
            }
            CycleOutcome::Throttled => Ok(TickResult::Throttled),
            CycleOutcome::Failed(error) => {
                reporter.report(SupervisorEvent::CycleFailed { error: &error });
                // Already reported through the event; the cycle error is what terminates.
                let _ = self
                    .signal(HealthSignal::Fail(error.to_string()), reporter)
                    .await;
                Err(error)
            }
        }
    }

    async fn signal<R: SupervisorReporter>(
        &self,
        signal: HealthSignal,
        reporter: &R,
    ) -> Result<(), AppError> {
        signal.send(&self.health).await.inspect_err(|error| {
            reporter.report(SupervisorEvent::HealthReportFailed {
                signal: &signal,
                error,
            });
        })
    }
}
