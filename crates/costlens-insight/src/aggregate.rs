//! Windowed aggregation of cost records.
//!
//! Pure functions over an in-memory snapshot of records. Groupings use
//! `BTreeMap` so iteration order, and with it generated output, is stable
//! for a given input.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::CostRecord;

/// A (service, provider) pair identifying one spend group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    /// Service name
    pub service: String,
    /// Cloud provider
    pub provider: String,
}

impl GroupKey {
    /// Create a new group key.
    pub fn new(service: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            provider: provider.into(),
        }
    }
}

/// Accumulated spend statistics for one group.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroupStats {
    /// Sum of amounts in the window
    pub total: f64,

    /// Number of records in the window
    pub count: usize,
}

impl GroupStats {
    /// Mean amount per record (0 for an empty group).
    pub fn average(&self) -> f64 {
        if self.count > 0 {
            self.total / self.count as f64
        } else {
            0.0
        }
    }

    fn add(&mut self, amount: f64) {
        self.total += amount;
        self.count += 1;
    }
}

/// Group records by (service, provider) over the window.
///
/// Only records with `date >= window_start` are counted. An empty window
/// yields an empty map, never an error.
pub fn group_totals(
    records: &[CostRecord],
    window_start: NaiveDate,
) -> BTreeMap<GroupKey, GroupStats> {
    let mut groups: BTreeMap<GroupKey, GroupStats> = BTreeMap::new();

    for record in records.iter().filter(|r| r.date >= window_start) {
        groups
            .entry(GroupKey::new(&record.service, &record.provider))
            .or_default()
            .add(record.amount);
    }

    groups
}

/// Sum record amounts by environment over the window.
pub fn environment_totals(
    records: &[CostRecord],
    window_start: NaiveDate,
) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();

    for record in records.iter().filter(|r| r.date >= window_start) {
        *totals.entry(record.environment.clone()).or_default() += record.amount;
    }

    totals
}

/// Sum record amounts by service over the window.
pub fn service_totals(records: &[CostRecord], window_start: NaiveDate) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();

    for record in records.iter().filter(|r| r.date >= window_start) {
        *totals.entry(record.service.clone()).or_default() += record.amount;
    }

    totals
}

/// Sum of all record amounts in the window.
pub fn window_total(records: &[CostRecord], window_start: NaiveDate) -> f64 {
    records
        .iter()
        .filter(|r| r.date >= window_start)
        .map(|r| r.amount)
        .sum()
}
