//! Data models for cost insight.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InsightError;

/// A single normalized billing record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRecord {
    /// Unique identifier (assigned by the store)
    pub id: Option<i64>,

    /// Service name (e.g., "EC2", "Cloud SQL")
    pub service: String,

    /// Cloud provider (e.g., "AWS", "Azure", "GCP")
    pub provider: String,

    /// Amount spent in USD
    pub amount: f64,

    /// Calendar day the spend occurred on
    pub date: NaiveDate,

    /// Project the spend belongs to
    pub project: String,

    /// Deployment environment (e.g., "Production", "Development")
    pub environment: String,

    /// When this record was ingested
    pub created_at: DateTime<Utc>,
}

impl CostRecord {
    /// Create a new record with required fields.
    pub fn new(
        service: impl Into<String>,
        provider: impl Into<String>,
        amount: f64,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            service: service.into(),
            provider: provider.into(),
            amount,
            date,
            project: "Main Project".to_string(),
            environment: "Production".to_string(),
            created_at: Utc::now(),
        }
    }

    /// Set the project.
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    /// Set the environment.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }
}

/// The monthly budget. At most one logical budget exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    /// Budget amount in USD
    pub amount: f64,

    /// When the budget was first set
    pub created_at: DateTime<Utc>,

    /// When the budget was last changed
    pub updated_at: DateTime<Utc>,
}

/// The alert threshold. Single mutable value, same lifecycle as [`Budget`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertThreshold {
    /// Threshold amount in USD
    pub amount: f64,

    /// When the threshold was last changed
    pub updated_at: DateTime<Utc>,
}

/// Review status of an optimization recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    /// Generated, awaiting reviewer action
    Pending,
    /// Reviewer accepted the recommendation
    Applied,
    /// Reviewer dismissed the recommendation
    Ignored,
}

impl RecommendationStatus {
    /// Stable string form, used for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Applied => "applied",
            Self::Ignored => "ignored",
        }
    }
}

impl std::fmt::Display for RecommendationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecommendationStatus {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "applied" => Ok(Self::Applied),
            "ignored" => Ok(Self::Ignored),
            other => Err(InsightError::Store(format!(
                "unknown recommendation status: {other}"
            ))),
        }
    }
}

/// A cost-saving recommendation produced by the rule engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationRecommendation {
    /// Unique identifier (assigned by the store)
    pub id: Option<i64>,

    /// Short title for display
    pub title: String,

    /// Detailed description of the suggested action
    pub description: String,

    /// Estimated savings in USD if followed
    pub estimated_savings: f64,

    /// Service the recommendation targets ("Multi-Cloud" / "Development"
    /// for cross-cutting rules)
    pub service: String,

    /// Provider the recommendation targets ("All" for cross-cutting rules)
    pub provider: String,

    /// Review status
    pub status: RecommendationStatus,

    /// When the recommendation was generated
    pub created_at: DateTime<Utc>,
}

impl OptimizationRecommendation {
    /// Create a new pending recommendation.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        estimated_savings: f64,
        service: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            estimated_savings,
            service: service.into(),
            provider: provider.into(),
            status: RecommendationStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Budget health tier for a projected service spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionStatus {
    /// Projection below 50% of budget
    Green,
    /// Projection at 50% or more of budget
    Yellow,
    /// Projection at 80% or more of budget
    Red,
}

impl ProjectionStatus {
    /// Classify a budget-usage percentage into a tier.
    ///
    /// Boundaries are half-open on the lower tiers: exactly 50.0 is yellow
    /// and exactly 80.0 is red.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage < 50.0 {
            Self::Green
        } else if percentage < 80.0 {
            Self::Yellow
        } else {
            Self::Red
        }
    }

    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

impl std::fmt::Display for ProjectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-service run-rate projection. Derived on every forecast, not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceProjection {
    /// Service name
    pub service: String,

    /// Average spend per elapsed day this month
    pub daily_spend: f64,

    /// Projected spend for the full month
    pub monthly_projection: f64,

    /// Budget health tier for this projection
    pub status: ProjectionStatus,
}

/// Month-to-date budget forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetReport {
    /// Configured budget amount, if one has been set
    pub budget: Option<f64>,

    /// Spend so far this month
    pub current_spend: f64,

    /// Budget minus current spend (negative when over budget)
    pub remaining: f64,

    /// Projected month-end spend at the current run rate
    pub forecasted_spend: f64,

    /// Current spend as a percentage of the budget (0 when no budget)
    pub percentage_used: f64,

    /// Per-service projections, one entry per service seen this month
    pub services: Vec<ServiceProjection>,
}

/// Summary of recommendations and their review state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationReport {
    /// All recommendations, newest first
    pub optimizations: Vec<OptimizationRecommendation>,

    /// Sum of estimated savings across all recommendations
    pub total_estimated_savings: f64,

    /// Sum of estimated savings across applied recommendations
    pub total_applied_savings: f64,

    /// Number of pending recommendations
    pub pending_count: i64,

    /// Number of applied recommendations
    pub applied_count: i64,

    /// Number of ignored recommendations
    pub ignored_count: i64,

    /// Estimated savings as a percentage of current-month spend
    /// (0 when spend is 0)
    pub savings_percentage: f64,
}

/// Round a monetary value to 2 decimal places.
///
/// Used at the output boundary only; intermediate math keeps full precision.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
