//! High-level query surface over the cost store.
//!
//! [`InsightQuery`] bundles the read/report operations and the guarded
//! generation path. Reports fetch a record snapshot from the store and hand
//! it to the pure analytics functions; rounding to cents happens here, at
//! the outer edge.

use chrono::NaiveDate;
use tracing::debug;

use crate::aggregate;
use crate::error::Result;
use crate::forecast;
use crate::models::{BudgetReport, OptimizationReport, RecommendationStatus, round_cents};
use crate::recommend::{Recommender, RecommenderConfig};
use crate::store::{CostStore, GenerationOutcome};

/// Query interface for forecasts and recommendations.
pub struct InsightQuery<'a> {
    store: &'a CostStore,
    recommender: Recommender,
}

impl<'a> InsightQuery<'a> {
    /// Create a new query interface with default engine settings.
    pub fn new(store: &'a CostStore) -> Self {
        Self::with_config(store, RecommenderConfig::default())
    }

    /// Create a new query interface with custom engine settings.
    pub fn with_config(store: &'a CostStore, config: RecommenderConfig) -> Self {
        Self {
            store,
            recommender: Recommender::new(config),
        }
    }

    /// Month-to-date budget forecast as of `today`.
    pub fn budget_report(&self, today: NaiveDate) -> Result<BudgetReport> {
        let records = self.store.records_since(forecast::month_start(today))?;
        let budget = self.store.budget()?.map(|b| b.amount);
        Ok(forecast::forecast(&records, budget, today))
    }

    /// Summary of all recommendations and their review state.
    pub fn optimization_report(&self, today: NaiveDate) -> Result<OptimizationReport> {
        let optimizations = self.store.list_recommendations()?;

        let mut total_estimated_savings = 0.0;
        let mut total_applied_savings = 0.0;
        let mut pending_count = 0;
        let mut applied_count = 0;
        let mut ignored_count = 0;

        for rec in &optimizations {
            total_estimated_savings += rec.estimated_savings;
            match rec.status {
                RecommendationStatus::Pending => pending_count += 1,
                RecommendationStatus::Applied => {
                    applied_count += 1;
                    total_applied_savings += rec.estimated_savings;
                }
                RecommendationStatus::Ignored => ignored_count += 1,
            }
        }

        let month_start = forecast::month_start(today);
        let month_records = self.store.records_since(month_start)?;
        let current_spend = aggregate::window_total(&month_records, month_start);
        let savings_percentage = if current_spend > 0.0 {
            total_estimated_savings / current_spend * 100.0
        } else {
            0.0
        };

        Ok(OptimizationReport {
            optimizations,
            total_estimated_savings: round_cents(total_estimated_savings),
            total_applied_savings: round_cents(total_applied_savings),
            pending_count,
            applied_count,
            ignored_count,
            savings_percentage: round_cents(savings_percentage),
        })
    }

    /// Run the rule engine over the trailing window and persist the batch.
    ///
    /// No-op while any recommendation is still pending review. The fast
    /// pending check here only skips wasted evaluation; the authoritative
    /// check runs inside the store's insert transaction.
    pub fn generate(&self, today: NaiveDate) -> Result<GenerationOutcome> {
        let pending = self.store.pending_count()?;
        if pending > 0 {
            debug!(pending, "Generation skipped, batch awaiting review");
            return Ok(GenerationOutcome::PendingBatchExists { pending });
        }

        let window_start = self.recommender.window_start(today);
        let records = self.store.records_since(window_start)?;
        let batch = self.recommender.evaluate(&records, today);

        self.store.insert_recommendations_guarded(&batch)
    }

    /// Mark a recommendation as applied.
    pub fn apply_recommendation(&self, id: i64) -> Result<()> {
        self.store
            .update_recommendation_status(id, RecommendationStatus::Applied)
    }

    /// Mark a recommendation as ignored.
    pub fn ignore_recommendation(&self, id: i64) -> Result<()> {
        self.store
            .update_recommendation_status(id, RecommendationStatus::Ignored)
    }
}
