//! SQLite persistence for cost records, budgets, and recommendations.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, Transaction, params};
use tracing::{debug, info};

use crate::error::{InsightError, Result};
use crate::models::{
    AlertThreshold, Budget, CostRecord, OptimizationRecommendation, RecommendationStatus,
};

/// Current schema version for migrations.
const SCHEMA_VERSION: i32 = 2;

/// Result of a guarded recommendation-generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// A new batch was written
    Generated {
        /// Number of recommendations inserted
        count: usize,
    },
    /// An unreviewed batch already exists; nothing was written
    PendingBatchExists {
        /// Number of recommendations still pending review
        pending: i64,
    },
}

impl GenerationOutcome {
    /// True if the attempt wrote nothing.
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::PendingBatchExists { .. })
    }
}

/// SQLite store for cost insight data.
pub struct CostStore {
    conn: Arc<Mutex<Connection>>,
}

impl CostStore {
    /// Open or create a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Run database migrations.
    fn migrate(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| InsightError::Migration(format!("failed to acquire lock: {e}")))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            [],
        )?;

        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        if current_version < SCHEMA_VERSION {
            info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );
            self.run_migrations(&conn, current_version)?;
        }

        Ok(())
    }

    /// Apply every migration newer than `from_version`, in order.
    fn run_migrations(&self, conn: &Connection, from_version: i32) -> Result<()> {
        if from_version < 1 {
            self.migration_v1(conn)?;
        }
        if from_version < 2 {
            self.migration_v2(conn)?;
        }

        Ok(())
    }

    /// Migration to version 1: cost records, budget, alert threshold.
    fn migration_v1(&self, conn: &Connection) -> Result<()> {
        debug!("Applying migration v1: records, budget, threshold");

        conn.execute(
            "CREATE TABLE IF NOT EXISTS cost_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                service TEXT NOT NULL,
                provider TEXT NOT NULL,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                project TEXT NOT NULL DEFAULT 'Main Project',
                environment TEXT NOT NULL DEFAULT 'Production',
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_cost_records_date
             ON cost_records(date)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_cost_records_service_provider
             ON cost_records(service, provider)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_cost_records_environment
             ON cost_records(environment)",
            [],
        )?;

        // Single-row tables: the CHECK pins the only legal id
        conn.execute(
            "CREATE TABLE IF NOT EXISTS budgets (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                amount REAL NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS alert_thresholds (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                amount REAL NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;

        info!("Migration v1 applied");
        Ok(())
    }

    /// Migration to version 2: optimization recommendations.
    fn migration_v2(&self, conn: &Connection) -> Result<()> {
        debug!("Applying migration v2: recommendations");

        conn.execute(
            "CREATE TABLE IF NOT EXISTS recommendations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                estimated_savings REAL NOT NULL,
                service TEXT NOT NULL,
                provider TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_recommendations_status
             ON recommendations(status)",
            [],
        )?;

        conn.execute("INSERT INTO schema_version (version) VALUES (2)", [])?;

        info!("Migration v2 applied: recommendations");
        Ok(())
    }

    /// Insert a batch of cost records in one transaction.
    pub fn insert_records(&self, records: &[CostRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| InsightError::Store(format!("failed to acquire lock: {e}")))?;

        let tx = conn.transaction()?;
        let count = Self::insert_records_in_tx(&tx, records)?;
        tx.commit()?;

        debug!(count, "Inserted cost records");
        Ok(count)
    }

    /// Insert records within a transaction.
    fn insert_records_in_tx(tx: &Transaction, records: &[CostRecord]) -> Result<usize> {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO cost_records
             (service, provider, amount, date, project, environment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;

        let mut count = 0;
        for record in records {
            stmt.execute(params![
                record.service,
                record.provider,
                record.amount,
                record.date.format("%Y-%m-%d").to_string(),
                record.project,
                record.environment,
                record.created_at.to_rfc3339(),
            ])?;
            count += 1;
        }

        Ok(count)
    }

    /// Get all records with date on or after the given day.
    pub fn records_since(&self, start: NaiveDate) -> Result<Vec<CostRecord>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| InsightError::Store(format!("failed to acquire lock: {e}")))?;

        let mut stmt = conn.prepare_cached(
            "SELECT id, service, provider, amount, date, project, environment, created_at
             FROM cost_records
             WHERE date >= ?1
             ORDER BY date, id",
        )?;

        let records: Vec<CostRecord> = stmt
            .query_map(
                params![start.format("%Y-%m-%d").to_string()],
                Self::row_to_record,
            )?
            .filter_map(|r| r.ok())
            .collect();

        Ok(records)
    }

    /// List records, newest first, optionally capped.
    pub fn list_records(&self, limit: Option<i64>) -> Result<Vec<CostRecord>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| InsightError::Store(format!("failed to acquire lock: {e}")))?;

        let mut stmt = conn.prepare_cached(
            "SELECT id, service, provider, amount, date, project, environment, created_at
             FROM cost_records
             ORDER BY date DESC, id DESC
             LIMIT ?1",
        )?;

        let records: Vec<CostRecord> = stmt
            .query_map(params![limit.unwrap_or(-1)], Self::row_to_record)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(records)
    }

    /// Count all stored cost records.
    pub fn record_count(&self) -> Result<i64> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| InsightError::Store(format!("failed to acquire lock: {e}")))?;

        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM cost_records", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Set the budget amount, creating the row on first use.
    ///
    /// `created_at` is preserved across updates; `updated_at` is bumped.
    pub fn set_budget(&self, amount: f64) -> Result<Budget> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| InsightError::Store(format!("failed to acquire lock: {e}")))?;

        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO budgets (id, amount, created_at, updated_at)
             VALUES (1, ?1, ?2, ?2)
             ON CONFLICT(id) DO UPDATE SET
                amount = excluded.amount,
                updated_at = excluded.updated_at",
            params![amount, now],
        )?;

        let budget = conn.query_row(
            "SELECT amount, created_at, updated_at FROM budgets WHERE id = 1",
            [],
            Self::row_to_budget,
        )?;

        debug!(amount, "Set budget");
        Ok(budget)
    }

    /// Get the budget, if one has been set.
    pub fn budget(&self) -> Result<Option<Budget>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| InsightError::Store(format!("failed to acquire lock: {e}")))?;

        let result = conn.query_row(
            "SELECT amount, created_at, updated_at FROM budgets WHERE id = 1",
            [],
            Self::row_to_budget,
        );

        match result {
            Ok(budget) => Ok(Some(budget)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(InsightError::Database(e)),
        }
    }

    /// Set the alert threshold amount, creating the row on first use.
    pub fn set_alert_threshold(&self, amount: f64) -> Result<AlertThreshold> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| InsightError::Store(format!("failed to acquire lock: {e}")))?;

        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO alert_thresholds (id, amount, updated_at)
             VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET
                amount = excluded.amount,
                updated_at = excluded.updated_at",
            params![amount, now],
        )?;

        let threshold = conn.query_row(
            "SELECT amount, updated_at FROM alert_thresholds WHERE id = 1",
            [],
            Self::row_to_threshold,
        )?;

        debug!(amount, "Set alert threshold");
        Ok(threshold)
    }

    /// Get the alert threshold, if one has been set.
    pub fn alert_threshold(&self) -> Result<Option<AlertThreshold>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| InsightError::Store(format!("failed to acquire lock: {e}")))?;

        let result = conn.query_row(
            "SELECT amount, updated_at FROM alert_thresholds WHERE id = 1",
            [],
            Self::row_to_threshold,
        );

        match result {
            Ok(threshold) => Ok(Some(threshold)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(InsightError::Database(e)),
        }
    }

    /// List all recommendations, newest first.
    pub fn list_recommendations(&self) -> Result<Vec<OptimizationRecommendation>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| InsightError::Store(format!("failed to acquire lock: {e}")))?;

        let mut stmt = conn.prepare_cached(
            "SELECT id, title, description, estimated_savings, service, provider,
                    status, created_at
             FROM recommendations
             ORDER BY created_at DESC, id DESC",
        )?;

        let recommendations: Vec<OptimizationRecommendation> = stmt
            .query_map([], Self::row_to_recommendation)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(recommendations)
    }

    /// Count recommendations still awaiting review.
    pub fn pending_count(&self) -> Result<i64> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| InsightError::Store(format!("failed to acquire lock: {e}")))?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM recommendations WHERE status = 'pending'",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Transition a recommendation to applied or ignored.
    pub fn update_recommendation_status(
        &self,
        id: i64,
        status: RecommendationStatus,
    ) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| InsightError::Store(format!("failed to acquire lock: {e}")))?;

        let changed = conn.execute(
            "UPDATE recommendations SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;

        if changed == 0 {
            return Err(InsightError::recommendation_not_found(id));
        }

        debug!(id, status = status.as_str(), "Updated recommendation status");
        Ok(())
    }

    /// Insert a recommendation batch unless an unreviewed batch exists.
    ///
    /// The pending check and the insert run in a single transaction so two
    /// concurrent callers cannot both observe zero pending rows and both
    /// write a batch.
    pub fn insert_recommendations_guarded(
        &self,
        batch: &[OptimizationRecommendation],
    ) -> Result<GenerationOutcome> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| InsightError::Store(format!("failed to acquire lock: {e}")))?;

        let tx = conn.transaction()?;

        let pending: i64 = tx.query_row(
            "SELECT COUNT(*) FROM recommendations WHERE status = 'pending'",
            [],
            |row| row.get(0),
        )?;

        if pending > 0 {
            debug!(pending, "Skipping generation, pending batch exists");
            return Ok(GenerationOutcome::PendingBatchExists { pending });
        }

        let mut count = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO recommendations
                 (title, description, estimated_savings, service, provider, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;

            for rec in batch {
                stmt.execute(params![
                    rec.title,
                    rec.description,
                    rec.estimated_savings,
                    rec.service,
                    rec.provider,
                    rec.status.as_str(),
                    rec.created_at.to_rfc3339(),
                ])?;
                count += 1;
            }
        }

        tx.commit()?;

        info!(count, "Generated recommendation batch");
        Ok(GenerationOutcome::Generated { count })
    }

    /// Helper to convert a database row to a CostRecord.
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<CostRecord> {
        let date_str: String = row.get(4)?;
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
            .unwrap_or_else(|_| Utc::now().date_naive());

        let created_at_str: String = row.get(7)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(CostRecord {
            id: Some(row.get(0)?),
            service: row.get(1)?,
            provider: row.get(2)?,
            amount: row.get(3)?,
            date,
            project: row.get(5)?,
            environment: row.get(6)?,
            created_at,
        })
    }

    /// Helper to convert a database row to a Budget.
    fn row_to_budget(row: &rusqlite::Row) -> rusqlite::Result<Budget> {
        let created_at_str: String = row.get(1)?;
        let updated_at_str: String = row.get(2)?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Budget {
            amount: row.get(0)?,
            created_at,
            updated_at,
        })
    }

    /// Helper to convert a database row to an AlertThreshold.
    fn row_to_threshold(row: &rusqlite::Row) -> rusqlite::Result<AlertThreshold> {
        let updated_at_str: String = row.get(1)?;
        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(AlertThreshold {
            amount: row.get(0)?,
            updated_at,
        })
    }

    /// Helper to convert a database row to an OptimizationRecommendation.
    fn row_to_recommendation(row: &rusqlite::Row) -> rusqlite::Result<OptimizationRecommendation> {
        let status_str: String = row.get(6)?;
        let status = status_str.parse().unwrap_or(RecommendationStatus::Pending);

        let created_at_str: String = row.get(7)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(OptimizationRecommendation {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            description: row.get(2)?,
            estimated_savings: row.get(3)?,
            service: row.get(4)?,
            provider: row.get(5)?,
            status,
            created_at,
        })
    }
}
