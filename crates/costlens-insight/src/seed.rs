//! Demo data seeding.
//!
//! Fills an empty store with a month of synthetic multi-cloud spend so the
//! reports have something to show on first run. Seeding never touches a
//! store that already holds records.

use chrono::{Duration, NaiveDate};
use rand::Rng;
use tracing::info;

use crate::error::Result;
use crate::models::{CostRecord, round_cents};
use crate::query::InsightQuery;
use crate::store::{CostStore, GenerationOutcome};

/// Days of history written by the seeder.
const SEED_DAYS: i64 = 30;

/// Alert threshold installed when none is configured.
const DEFAULT_ALERT_THRESHOLD: f64 = 1000.0;

/// Provider catalog for demo records.
const CATALOG: [(&str, [&str; 4]); 3] = [
    ("AWS", ["EC2", "RDS", "S3", "Lambda"]),
    (
        "Azure",
        ["Virtual Machines", "SQL Database", "Blob Storage", "Functions"],
    ),
    (
        "GCP",
        ["Compute Engine", "Cloud SQL", "Cloud Storage", "Cloud Functions"],
    ),
];

const PROJECTS: [&str; 3] = ["Alpha", "Beta", "Gamma"];
const ENVIRONMENTS: [&str; 3] = ["Production", "Development", "Staging"];

/// Summary of a seeding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    /// Records written; zero when the store already held data.
    pub records_written: usize,

    /// Outcome of the generation pass, when one ran.
    pub generation: Option<GenerationOutcome>,
}

impl SeedSummary {
    /// True if the store already held data and nothing was written.
    pub fn skipped(&self) -> bool {
        self.records_written == 0 && self.generation.is_none()
    }
}

/// Seeds an empty store with demo data and a first recommendation batch.
///
/// Writes 30 days of randomized spend across AWS, Azure, and GCP, installs
/// a default alert threshold when none is set, then runs generation over
/// the fresh records. A store with existing records is left untouched.
pub fn seed_demo_data(store: &CostStore, today: NaiveDate) -> Result<SeedSummary> {
    if store.record_count()? > 0 {
        info!("Store already holds records, skipping seed");
        return Ok(SeedSummary {
            records_written: 0,
            generation: None,
        });
    }

    let mut rng = rand::rng();
    let mut records = Vec::new();

    for day_offset in 0..SEED_DAYS {
        let date = today - Duration::days(day_offset);
        for (provider, services) in CATALOG {
            for service in services {
                let amount = round_cents(rng.random_range(1.0..=50.0));
                let project = PROJECTS[rng.random_range(0..PROJECTS.len())];
                let environment = ENVIRONMENTS[rng.random_range(0..ENVIRONMENTS.len())];

                records.push(
                    CostRecord::new(service, provider, amount, date)
                        .with_project(project)
                        .with_environment(environment),
                );
            }
        }
    }

    let records_written = store.insert_records(&records)?;

    if store.alert_threshold()?.is_none() {
        store.set_alert_threshold(DEFAULT_ALERT_THRESHOLD)?;
    }

    let generation = InsightQuery::new(store).generate(today)?;
    info!(
        records = records_written,
        "Seeded demo data and ran first generation"
    );

    Ok(SeedSummary {
        records_written,
        generation: Some(generation),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_seed_writes_full_catalog() {
        let store = CostStore::open_in_memory().unwrap();
        let summary = seed_demo_data(&store, day(2025, 6, 30)).unwrap();

        // 30 days x 3 providers x 4 services
        assert_eq!(summary.records_written, 360);
        assert_eq!(store.record_count().unwrap(), 360);
        assert!(!summary.skipped());
    }

    #[test]
    fn test_seed_skips_populated_store() {
        let store = CostStore::open_in_memory().unwrap();
        let existing = vec![CostRecord::new("EC2", "AWS", 12.0, day(2025, 6, 1))];
        store.insert_records(&existing).unwrap();

        let summary = seed_demo_data(&store, day(2025, 6, 30)).unwrap();
        assert!(summary.skipped());
        assert_eq!(store.record_count().unwrap(), 1);
    }

    #[test]
    fn test_seed_installs_default_threshold() {
        let store = CostStore::open_in_memory().unwrap();
        seed_demo_data(&store, day(2025, 6, 30)).unwrap();

        let threshold = store.alert_threshold().unwrap().unwrap();
        assert!((threshold.amount - 1000.0).abs() < 0.0001);
    }

    #[test]
    fn test_seed_keeps_existing_threshold() {
        let store = CostStore::open_in_memory().unwrap();
        store.set_alert_threshold(250.0).unwrap();

        seed_demo_data(&store, day(2025, 6, 30)).unwrap();
        let threshold = store.alert_threshold().unwrap().unwrap();
        assert!((threshold.amount - 250.0).abs() < 0.0001);
    }

    #[test]
    fn test_seed_amounts_are_rounded_cents() {
        let store = CostStore::open_in_memory().unwrap();
        seed_demo_data(&store, day(2025, 6, 30)).unwrap();

        for record in store.list_records(None).unwrap() {
            assert!((1.0..=50.0).contains(&record.amount));
            assert!((record.amount - round_cents(record.amount)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_seed_runs_generation() {
        let store = CostStore::open_in_memory().unwrap();
        let summary = seed_demo_data(&store, day(2025, 6, 30)).unwrap();

        // Multi-cloud spend always trips at least the consolidation rule
        assert!(matches!(
            summary.generation,
            Some(GenerationOutcome::Generated { count }) if count > 0
        ));
        assert!(store.pending_count().unwrap() > 0);
    }
}
