//! Heuristic rule engine for cost-optimization recommendations.
//!
//! Two rule families run over a trailing spend window:
//!
//! - **Per-group rules** fire per (service, provider) group as an ordered
//!   decision list. First match wins, so a group yields at most one
//!   recommendation.
//! - **Cross-cutting rules** fire at most once over the whole window,
//!   independent of the per-group results.
//!
//! Output order is stable for a given input: groups in key order, then the
//! cross-cutting rules. Every recommendation starts out pending.
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use costlens_insight::models::CostRecord;
//! use costlens_insight::recommend::{Recommender, RecommenderConfig};
//!
//! let records = vec![
//!     CostRecord::new("EC2", "AWS", 2.0, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()),
//! ];
//! let recommender = Recommender::new(RecommenderConfig::default());
//! let batch = recommender.evaluate(&records, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
//! assert_eq!(batch[0].title, "Remove Idle EC2 Resources");
//! ```

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::aggregate::{self, GroupKey, GroupStats};
use crate::models::{CostRecord, OptimizationRecommendation};

/// Average below which a group counts as idle.
const IDLE_AVG_CEILING: f64 = 5.0;

/// Average below which a group counts as under-utilized.
const RIGHTSIZE_AVG_CEILING: f64 = 50.0;

/// Minimum record count for the reserved-capacity rule. With a 30-day
/// window this demands a data point for nearly every day.
const RESERVED_MIN_SAMPLES: usize = 25;

/// Savings fraction for removing idle resources.
const IDLE_SAVINGS_RATE: f64 = 0.8;

/// Savings fraction for downsizing under-utilized resources.
const RIGHTSIZE_SAVINGS_RATE: f64 = 0.3;

/// Savings fraction for switching to reserved pricing.
const RESERVED_SAVINGS_RATE: f64 = 0.4;

/// Savings fraction for consolidating providers, applied to window total.
const MULTI_CLOUD_SAVINGS_RATE: f64 = 0.15;

/// Savings fraction for shutting down development environments off-hours.
const DEV_SHUTDOWN_SAVINGS_RATE: f64 = 0.5;

/// A per-group rule. Evaluated in [`GroupRule::ORDER`]; the first rule
/// whose predicate matches claims the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRule {
    /// Minimal usage, resource likely forgotten
    Idle,
    /// Steady but low usage, instance larger than needed
    RightSize,
    /// Consistent heavy usage, committed pricing pays off
    ReservedCapacity,
}

impl GroupRule {
    /// Evaluation order of the decision list.
    pub const ORDER: [GroupRule; 3] = [Self::Idle, Self::RightSize, Self::ReservedCapacity];

    /// Whether this rule fires for the given group statistics.
    ///
    /// The predicates are disjoint by construction, so the decision list
    /// is auditable rule by rule. A group with average ≥ 50 but fewer than
    /// [`RESERVED_MIN_SAMPLES`] records falls through every branch.
    pub fn matches(&self, stats: &GroupStats) -> bool {
        let average = stats.average();
        match self {
            Self::Idle => average < IDLE_AVG_CEILING && stats.total > 0.0,
            Self::RightSize => {
                average >= IDLE_AVG_CEILING && average < RIGHTSIZE_AVG_CEILING
            }
            Self::ReservedCapacity => {
                average >= RIGHTSIZE_AVG_CEILING && stats.count >= RESERVED_MIN_SAMPLES
            }
        }
    }

    /// Estimated savings if the recommendation is followed.
    pub fn estimated_savings(&self, stats: &GroupStats) -> f64 {
        let rate = match self {
            Self::Idle => IDLE_SAVINGS_RATE,
            Self::RightSize => RIGHTSIZE_SAVINGS_RATE,
            Self::ReservedCapacity => RESERVED_SAVINGS_RATE,
        };
        stats.total * rate
    }

    /// Build the recommendation for a matched group.
    fn recommendation(&self, key: &GroupKey, stats: &GroupStats) -> OptimizationRecommendation {
        let savings = self.estimated_savings(stats);
        match self {
            Self::Idle => OptimizationRecommendation::new(
                format!("Remove Idle {} Resources", key.service),
                format!(
                    "Your {} service on {} has minimal usage. Consider removing or \
                     consolidating these resources to save costs.",
                    key.service, key.provider
                ),
                savings,
                &key.service,
                &key.provider,
            ),
            Self::RightSize => OptimizationRecommendation::new(
                format!("Right-size {} Instances", key.service),
                format!(
                    "Your {} service on {} appears underutilized. Consider downsizing \
                     to a smaller instance type.",
                    key.service, key.provider
                ),
                savings,
                &key.service,
                &key.provider,
            ),
            Self::ReservedCapacity => OptimizationRecommendation::new(
                format!("Use Reserved Instances for {}", key.service),
                format!(
                    "Your {} service on {} has consistent usage. Switch to reserved \
                     instances for up to 40% savings.",
                    key.service, key.provider
                ),
                savings,
                &key.service,
                &key.provider,
            ),
        }
    }
}

/// Configuration for the recommendation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Length of the trailing analysis window in days
    pub lookback_days: i64,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self { lookback_days: 30 }
    }
}

impl RecommenderConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the analysis window length.
    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days.max(1);
        self
    }
}

/// The recommendation rule engine.
///
/// Stateless apart from configuration; evaluation is a pure function of
/// the record snapshot and `today`.
pub struct Recommender {
    config: RecommenderConfig,
}

impl Recommender {
    /// Create a new engine.
    pub fn new(config: RecommenderConfig) -> Self {
        Self { config }
    }

    /// First day of the trailing analysis window ending at `today`.
    pub fn window_start(&self, today: NaiveDate) -> NaiveDate {
        today - Duration::days(self.config.lookback_days)
    }

    /// Evaluate all rules over the window and return the pending batch.
    ///
    /// An empty window produces an empty batch, never an error.
    pub fn evaluate(
        &self,
        records: &[CostRecord],
        today: NaiveDate,
    ) -> Vec<OptimizationRecommendation> {
        let window_start = self.window_start(today);
        let groups = aggregate::group_totals(records, window_start);

        let mut batch = Vec::new();

        for (key, stats) in &groups {
            if let Some(rule) = GroupRule::ORDER.iter().find(|rule| rule.matches(stats)) {
                batch.push(rule.recommendation(key, stats));
            }
        }

        // Cross-cutting rules always come after the per-group ones so the
        // batch order is stable for a given input.
        let providers: BTreeSet<&str> = groups.keys().map(|key| key.provider.as_str()).collect();
        if providers.len() > 1 {
            let window_total = aggregate::window_total(records, window_start);
            batch.push(OptimizationRecommendation::new(
                "Consolidate Multi-Cloud Resources",
                format!(
                    "You are using {} cloud providers. Consider consolidating resources \
                     to a single provider for volume discounts.",
                    providers.len()
                ),
                window_total * MULTI_CLOUD_SAVINGS_RATE,
                "Multi-Cloud",
                "All",
            ));
        }

        let environments = aggregate::environment_totals(records, window_start);
        if let Some(dev_total) = environments.get("Development") {
            batch.push(OptimizationRecommendation::new(
                "Optimize Development Environments",
                "Development environments are running 24/7. Implement auto-shutdown \
                 during non-business hours to save costs.",
                dev_total * DEV_SHUTDOWN_SAVINGS_RATE,
                "Development",
                "All",
            ));
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecommendationStatus;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 30).unwrap()
    }

    fn engine() -> Recommender {
        Recommender::new(RecommenderConfig::default())
    }

    fn group(total: f64, count: usize) -> GroupStats {
        GroupStats { total, count }
    }

    #[test]
    fn test_idle_rule_fires_below_average_five() {
        // 10 records of 2.00: total 20, average 2
        let records: Vec<CostRecord> = (1..=10)
            .map(|d| CostRecord::new("EC2", "AWS", 2.0, day(d)))
            .collect();

        let batch = engine().evaluate(&records, today());
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].title, "Remove Idle EC2 Resources");
        assert!((batch[0].estimated_savings - 16.0).abs() < 0.0001);
        assert_eq!(batch[0].service, "EC2");
        assert_eq!(batch[0].provider, "AWS");
        assert_eq!(batch[0].status, RecommendationStatus::Pending);
    }

    #[test]
    fn test_idle_needs_positive_total() {
        assert!(!GroupRule::Idle.matches(&group(0.0, 5)));
        assert!(GroupRule::Idle.matches(&group(4.0, 1)));
    }

    #[test]
    fn test_rightsize_rule() {
        // 10 records of 20: total 200, average 20
        let records: Vec<CostRecord> = (1..=10)
            .map(|d| CostRecord::new("RDS", "AWS", 20.0, day(d)))
            .collect();

        let batch = engine().evaluate(&records, today());
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].title, "Right-size RDS Instances");
        assert!((batch[0].estimated_savings - 60.0).abs() < 0.0001);
    }

    #[test]
    fn test_reserved_capacity_rule() {
        // 30 records of 60: total 1800, average 60, count 30
        let records: Vec<CostRecord> = (1..=30)
            .map(|d| CostRecord::new("EC2", "AWS", 60.0, day(d)))
            .collect();

        let batch = engine().evaluate(&records, today());
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].title, "Use Reserved Instances for EC2");
        assert!((batch[0].estimated_savings - 720.0).abs() < 0.0001);
    }

    #[test]
    fn test_high_average_low_count_falls_through() {
        // Average 100 but only 4 data points: no per-group rule fires
        let records: Vec<CostRecord> = (1..=4)
            .map(|d| CostRecord::new("EC2", "AWS", 100.0, day(d * 7)))
            .collect();

        let batch = engine().evaluate(&records, today());
        assert!(batch.is_empty());
    }

    #[test]
    fn test_average_boundaries() {
        // Exactly 5 is right-size territory, not idle
        assert!(!GroupRule::Idle.matches(&group(5.0, 1)));
        assert!(GroupRule::RightSize.matches(&group(5.0, 1)));

        // Exactly 50 leaves right-size; reserved needs the sample count too
        assert!(!GroupRule::RightSize.matches(&group(50.0, 1)));
        assert!(!GroupRule::ReservedCapacity.matches(&group(50.0, 1)));
        assert!(GroupRule::ReservedCapacity.matches(&group(50.0 * 25.0, 25)));
    }

    #[test]
    fn test_first_match_wins_one_rec_per_group() {
        let stats = group(20.0, 10); // average 2: idle
        let matching: Vec<&GroupRule> = GroupRule::ORDER
            .iter()
            .filter(|rule| rule.matches(&stats))
            .collect();
        assert_eq!(matching, vec![&GroupRule::Idle]);
    }

    #[test]
    fn test_multi_cloud_needs_second_provider() {
        let mut records: Vec<CostRecord> = (1..=10)
            .map(|d| CostRecord::new("EC2", "AWS", 20.0, day(d)))
            .collect();

        let batch = engine().evaluate(&records, today());
        assert!(batch.iter().all(|r| r.service != "Multi-Cloud"));

        records.push(CostRecord::new("Functions", "Azure", 10.0, day(5)));
        let batch = engine().evaluate(&records, today());
        let multi = batch
            .iter()
            .find(|r| r.service == "Multi-Cloud")
            .expect("multi-cloud rule should fire");

        // 0.15 of the whole window: (200 + 10) * 0.15
        assert!((multi.estimated_savings - 31.5).abs() < 0.0001);
        assert_eq!(multi.provider, "All");
        assert!(multi.description.contains("2 cloud providers"));
    }

    #[test]
    fn test_dev_shutdown_rule() {
        let records = vec![
            CostRecord::new("EC2", "AWS", 20.0, day(1)),
            CostRecord::new("EC2", "AWS", 30.0, day(2)).with_environment("Development"),
            CostRecord::new("RDS", "AWS", 10.0, day(3)).with_environment("Development"),
        ];

        let batch = engine().evaluate(&records, today());
        let dev = batch
            .iter()
            .find(|r| r.service == "Development")
            .expect("dev shutdown rule should fire");

        // Half of the Development spend: (30 + 10) * 0.5
        assert!((dev.estimated_savings - 20.0).abs() < 0.0001);
        assert_eq!(dev.title, "Optimize Development Environments");
    }

    #[test]
    fn test_no_dev_records_no_dev_rec() {
        let records = vec![CostRecord::new("EC2", "AWS", 20.0, day(1))];
        let batch = engine().evaluate(&records, today());
        assert!(batch.iter().all(|r| r.service != "Development"));
    }

    #[test]
    fn test_output_order_is_stable() {
        let records = vec![
            CostRecord::new("S3", "AWS", 2.0, day(1)),
            CostRecord::new("Compute Engine", "GCP", 20.0, day(1)),
            CostRecord::new("EC2", "AWS", 2.0, day(2)).with_environment("Development"),
        ];

        let first = engine().evaluate(&records, today());
        let second = engine().evaluate(&records, today());

        let titles = |batch: &[OptimizationRecommendation]| {
            batch.iter().map(|r| r.title.clone()).collect::<Vec<_>>()
        };
        assert_eq!(titles(&first), titles(&second));

        // Cross-cutting rules land after the per-group ones
        let last_two: Vec<&str> = first
            .iter()
            .rev()
            .take(2)
            .map(|r| r.service.as_str())
            .collect();
        assert_eq!(last_two, vec!["Development", "Multi-Cloud"]);
    }

    #[test]
    fn test_records_outside_window_ignored() {
        let recommender =
            Recommender::new(RecommenderConfig::default().with_lookback_days(30));
        let stale = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let records = vec![CostRecord::new("EC2", "AWS", 2.0, stale)];

        let batch = recommender.evaluate(&records, today());
        assert!(batch.is_empty());
    }

    #[test]
    fn test_empty_window_empty_batch() {
        let batch = engine().evaluate(&[], today());
        assert!(batch.is_empty());
    }
}
