//! Linear run-rate budget forecasting.
//!
//! Projects month-end spend from spend-to-date: daily average so far,
//! multiplied by the number of days in the month. Each service seen this
//! month gets its own projection and a green/yellow/red tier against the
//! budget. Monetary outputs are rounded to cents at this boundary only;
//! the math itself runs at full precision.

use chrono::{Datelike, NaiveDate};

use crate::aggregate;
use crate::models::{BudgetReport, CostRecord, ProjectionStatus, ServiceProjection, round_cents};

/// Number of days in the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = (date.year(), date.month());
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };

    first_of_next
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(30)
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// Build the month-to-date forecast as of `today`.
///
/// `records` may span any range; only those dated in `today`'s month count.
/// A missing budget is treated as 0: `remaining` goes negative and
/// `percentage_used` stays 0 rather than dividing by zero.
pub fn forecast(records: &[CostRecord], budget: Option<f64>, today: NaiveDate) -> BudgetReport {
    let start = month_start(today);
    let days_elapsed = today.day() as f64;
    let month_days = days_in_month(today) as f64;

    let current_spend = aggregate::window_total(records, start);
    let daily_average = if days_elapsed > 0.0 {
        current_spend / days_elapsed
    } else {
        0.0
    };
    let forecasted_spend = daily_average * month_days;

    let budget_amount = budget.unwrap_or(0.0);
    let remaining = budget_amount - current_spend;
    let percentage_used = if budget_amount > 0.0 {
        current_spend / budget_amount * 100.0
    } else {
        0.0
    };

    let services: Vec<ServiceProjection> = aggregate::service_totals(records, start)
        .into_iter()
        .map(|(service, total)| {
            let daily_spend = if days_elapsed > 0.0 {
                total / days_elapsed
            } else {
                0.0
            };
            let monthly_projection = daily_spend * month_days;
            let status = if budget_amount > 0.0 {
                ProjectionStatus::from_percentage(monthly_projection / budget_amount * 100.0)
            } else {
                ProjectionStatus::Green
            };

            ServiceProjection {
                service,
                daily_spend: round_cents(daily_spend),
                monthly_projection: round_cents(monthly_projection),
                status,
            }
        })
        .collect();

    BudgetReport {
        budget: budget.map(round_cents),
        current_spend: round_cents(current_spend),
        remaining: round_cents(remaining),
        forecasted_spend: round_cents(forecasted_spend),
        percentage_used: round_cents(percentage_used),
        services,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(day(2025, 2, 10)), 28);
        assert_eq!(days_in_month(day(2024, 2, 10)), 29); // leap year
        assert_eq!(days_in_month(day(2025, 4, 1)), 30);
        assert_eq!(days_in_month(day(2025, 12, 31)), 31);
    }

    #[test]
    fn test_month_start() {
        assert_eq!(month_start(day(2025, 3, 17)), day(2025, 3, 1));
        assert_eq!(month_start(day(2025, 3, 1)), day(2025, 3, 1));
    }

    #[test]
    fn test_run_rate_projection() {
        // 300 spent over the first 10 days of a 30-day month
        let records: Vec<CostRecord> = (1..=10)
            .map(|d| CostRecord::new("EC2", "AWS", 30.0, day(2025, 4, d)))
            .collect();

        let report = forecast(&records, Some(2000.0), day(2025, 4, 10));
        assert_eq!(report.current_spend, 300.0);
        assert_eq!(report.forecasted_spend, 900.0); // 30/day * 30 days
        assert_eq!(report.remaining, 1700.0);
        assert_eq!(report.percentage_used, 15.0);
    }

    #[test]
    fn test_status_boundaries_against_budget() {
        // On the last day of a 30-day month the projection equals the total
        let records = vec![
            CostRecord::new("Exactly50", "AWS", 500.0, day(2025, 6, 1)),
            CostRecord::new("Exactly80", "AWS", 800.0, day(2025, 6, 2)),
            CostRecord::new("Under50", "AWS", 499.0, day(2025, 6, 3)),
        ];

        let report = forecast(&records, Some(1000.0), day(2025, 6, 30));
        let status_of = |name: &str| {
            report
                .services
                .iter()
                .find(|s| s.service == name)
                .map(|s| s.status)
                .unwrap()
        };

        assert_eq!(status_of("Exactly50"), ProjectionStatus::Yellow);
        assert_eq!(status_of("Exactly80"), ProjectionStatus::Red);
        assert_eq!(status_of("Under50"), ProjectionStatus::Green);
    }

    #[test]
    fn test_missing_budget_is_zero_not_error() {
        let records = vec![CostRecord::new("EC2", "AWS", 120.0, day(2025, 3, 1))];

        let report = forecast(&records, None, day(2025, 3, 10));
        assert_eq!(report.budget, None);
        assert_eq!(report.current_spend, 120.0);
        assert_eq!(report.remaining, -120.0);
        assert_eq!(report.percentage_used, 0.0);
        // Without a budget every service reads green
        assert_eq!(report.services[0].status, ProjectionStatus::Green);
    }

    #[test]
    fn test_empty_month_yields_zeros() {
        let report = forecast(&[], Some(1000.0), day(2025, 3, 15));
        assert_eq!(report.current_spend, 0.0);
        assert_eq!(report.forecasted_spend, 0.0);
        assert_eq!(report.remaining, 1000.0);
        assert!(report.services.is_empty());
    }

    #[test]
    fn test_records_outside_month_excluded() {
        let records = vec![
            CostRecord::new("EC2", "AWS", 50.0, day(2025, 2, 28)),
            CostRecord::new("EC2", "AWS", 10.0, day(2025, 3, 1)),
        ];

        let report = forecast(&records, Some(1000.0), day(2025, 3, 5));
        assert_eq!(report.current_spend, 10.0);
    }

    #[test]
    fn test_rounding_at_output_boundary() {
        // 100 over 3 elapsed days in March (31 days): 100/3*31 = 1033.333...
        let records = vec![CostRecord::new("EC2", "AWS", 100.0, day(2025, 3, 1))];

        let report = forecast(&records, Some(5000.0), day(2025, 3, 3));
        assert_eq!(report.forecasted_spend, 1033.33);
        assert_eq!(report.services[0].daily_spend, 33.33);
        assert_eq!(report.services[0].monthly_projection, 1033.33);
    }
}
