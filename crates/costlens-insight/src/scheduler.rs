//! Background recommendation generation.
//!
//! This module provides a background task that periodically runs the rule
//! engine so a fresh batch appears after a review without manual triggering.
//! Cycles are idempotent: while any pending recommendation exists a cycle is
//! a no-op.
//!
//! ```no_run
//! use costlens_insight::{CostStore, GenerationScheduler};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(CostStore::open("~/.costlens/costs.db")?);
//!
//!     // Refresh recommendations every six hours until aborted
//!     let handle = GenerationScheduler::new(store).start();
//!
//!     // serve queries, run reports, review recommendations
//!
//!     handle.abort();
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use costlens_core::GenerationConfig;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::query::InsightQuery;
use crate::recommend::RecommenderConfig;
use crate::store::{CostStore, GenerationOutcome};

/// Default generation interval in seconds (6 hours).
pub const DEFAULT_GENERATION_INTERVAL_SECS: u64 = 21_600;

/// Background scheduler for recommendation generation.
pub struct GenerationScheduler {
    store: Arc<CostStore>,
    recommender: RecommenderConfig,
    interval: Duration,
}

impl GenerationScheduler {
    /// Create a scheduler with the default interval (6 hours).
    pub fn new(store: Arc<CostStore>) -> Self {
        Self {
            store,
            recommender: RecommenderConfig::default(),
            interval: Duration::from_secs(DEFAULT_GENERATION_INTERVAL_SECS),
        }
    }

    /// Create a scheduler with a custom interval.
    pub fn with_interval(store: Arc<CostStore>, interval: Duration) -> Self {
        Self {
            store,
            recommender: RecommenderConfig::default(),
            interval,
        }
    }

    /// Create a scheduler from generation settings.
    pub fn from_settings(store: Arc<CostStore>, settings: &GenerationConfig) -> Self {
        Self {
            store,
            recommender: RecommenderConfig::new().with_lookback_days(settings.lookback_days),
            interval: Duration::from_secs(settings.interval_secs),
        }
    }

    /// Start the background generation task.
    ///
    /// Aborting the returned handle stops the loop.
    pub fn start(self) -> JoinHandle<()> {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting generation scheduler"
        );

        tokio::spawn(async move {
            self.run_loop().await;
        })
    }

    /// Run the generation loop.
    async fn run_loop(&self) {
        let mut interval = tokio::time::interval(self.interval);

        // The first tick completes immediately, so a cycle runs on startup.
        loop {
            interval.tick().await;
            self.run_generation();
        }
    }

    /// Run a single generation cycle, logging the outcome.
    pub fn run_generation(&self) {
        debug!("Running generation cycle");

        match self.run_once() {
            Ok(GenerationOutcome::Generated { count }) => {
                info!(count, "Generation cycle completed");
            }
            Ok(GenerationOutcome::PendingBatchExists { pending }) => {
                debug!(pending, "Generation cycle skipped, batch awaiting review");
            }
            Err(e) => {
                error!("Generation cycle failed: {}", e);
            }
        }
    }

    /// Run generation once (synchronous, for manual triggering).
    pub fn run_once(&self) -> Result<GenerationOutcome> {
        let query = InsightQuery::with_config(&self.store, self.recommender.clone());
        query.generate(Utc::now().date_naive())
    }

    /// Get the generation interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}
