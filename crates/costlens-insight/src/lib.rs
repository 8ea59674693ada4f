//! # costlens-insight
//!
//! Cost aggregation, budget forecasting, and optimization recommendations.
//!
//! This crate provides:
//! - [`CostStore`] - SQLite storage for records, budgets, and recommendations
//! - [`RecordImporter`] - Parse cost records from JSONL billing exports
//! - [`Recommender`] - Ordered rule engine producing savings recommendations
//! - [`InsightQuery`] - Budget and optimization reports over the store
//! - [`GenerationScheduler`] - Background task that refreshes recommendations
//!
//! ## Recommendation lifecycle
//!
//! Generation writes a batch of `pending` recommendations. While any of them
//! remain pending, further generation attempts are no-ops; once every one is
//! applied or ignored, the next attempt produces a fresh batch.
//!
//! ## Example
//!
//! ```no_run
//! use chrono::Utc;
//! use costlens_insight::{CostStore, InsightQuery, RecordImporter};
//!
//! fn main() -> anyhow::Result<()> {
//!     // Open or create the cost store
//!     let store = CostStore::open("~/.costlens/costs.db")?;
//!
//!     // Import a JSONL billing export
//!     let importer = RecordImporter::new();
//!     let batch = importer.parse_file("billing.jsonl")?;
//!     store.insert_records(&batch.records)?;
//!
//!     // Report and generate
//!     let query = InsightQuery::new(&store);
//!     let today = Utc::now().date_naive();
//!     let report = query.budget_report(today)?;
//!     println!("Spend so far: {:.2}", report.current_spend);
//!
//!     query.generate(today)?;
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod error;
pub mod forecast;
pub mod ingest;
pub mod models;
pub mod query;
pub mod recommend;
pub mod scheduler;
pub mod seed;
pub mod store;

// Re-export main types
pub use aggregate::{GroupKey, GroupStats};
pub use error::{InsightError, Result};
pub use ingest::{ImportBatch, RecordImporter};
pub use models::{
    AlertThreshold, Budget, BudgetReport, CostRecord, OptimizationRecommendation,
    OptimizationReport, ProjectionStatus, RecommendationStatus, ServiceProjection,
};
pub use query::InsightQuery;
pub use recommend::{GroupRule, Recommender, RecommenderConfig};
pub use scheduler::GenerationScheduler;
pub use seed::{SeedSummary, seed_demo_data};
pub use store::{CostStore, GenerationOutcome};
