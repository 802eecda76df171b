// 🗄️ Ledger Store
// Injected store abstraction; all access goes through one exclusive lock

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::num::NonZeroU32;
use std::path::Path;
use std::sync::Mutex;

use crate::db::{self, Direction, OwnerId, Transaction, TransactionId};
use crate::error::{LedgerError, Result};
use crate::report::{MonthlyReport, Period};

// ============================================================================
// STORE TRAIT
// ============================================================================

/// What the interpreter's callers and the reporting layer depend on
pub trait LedgerStore: Send + Sync {
    /// Persist a new transaction stamped with the current UTC time.
    /// `amount` must be finite and non-negative, otherwise `InvalidAmount`;
    /// 0 is valid (menu shortcuts use it).
    fn append(
        &self,
        owner: OwnerId,
        amount: f64,
        direction: Direction,
        label: &str,
        note: &str,
    ) -> Result<TransactionId>;

    /// Up to `limit` most recent transactions, newest first
    fn list(&self, owner: OwnerId, limit: NonZeroU32) -> Result<Vec<Transaction>>;

    /// Totals for `[year-month-01, next month)` in UTC.
    /// Fails with `InvalidPeriod` for months outside 1-12.
    fn monthly_report(&self, owner: OwnerId, year: i32, month: u32) -> Result<MonthlyReport>;
}

// ============================================================================
// SQLITE STORE
// ============================================================================

struct Inner {
    conn: Connection,
    /// Last timestamp handed out, so clock steps backwards never reorder inserts
    last_recorded: Option<DateTime<Utc>>,
}

/// SQLite-backed store serialized behind a single mutex
pub struct SqliteStore {
    inner: Mutex<Inner>,
}

impl SqliteStore {
    /// Open (or create) the database file and ensure the schema exists
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), "opened ledger database");
        Self::from_connection(conn)
    }

    /// Private, throwaway database (tests and demos)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        db::setup_database(&conn)?;
        let last_recorded = db::latest_recorded_at(&conn)?;
        tracing::info!(rows = db::verify_count(&conn)?, "ledger schema ready");

        Ok(SqliteStore {
            inner: Mutex::new(Inner {
                conn,
                last_recorded,
            }),
        })
    }

    /// Total number of stored transactions across all owners
    pub fn count(&self) -> Result<i64> {
        let inner = self.inner.lock()?;
        db::verify_count(&inner.conn)
    }
}

impl LedgerStore for SqliteStore {
    fn append(
        &self,
        owner: OwnerId,
        amount: f64,
        direction: Direction,
        label: &str,
        note: &str,
    ) -> Result<TransactionId> {
        if !(amount.is_finite() && amount >= 0.0) {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let mut inner = self.inner.lock()?;

        let now = Utc::now();
        let recorded_at = match inner.last_recorded {
            Some(last) if last > now => last,
            _ => now,
        };

        let id = db::insert_transaction(&inner.conn, owner, amount, direction, label, note, &recorded_at)?;
        inner.last_recorded = Some(recorded_at);

        tracing::debug!(id, owner, amount, %direction, label, "appended transaction");
        Ok(id)
    }

    fn list(&self, owner: OwnerId, limit: NonZeroU32) -> Result<Vec<Transaction>> {
        let inner = self.inner.lock()?;
        let transactions = db::recent_transactions(&inner.conn, owner, limit.get())?;

        tracing::debug!(owner, limit = limit.get(), returned = transactions.len(), "listed transactions");
        Ok(transactions)
    }

    fn monthly_report(&self, owner: OwnerId, year: i32, month: u32) -> Result<MonthlyReport> {
        let period = Period::new(year, month)?;
        let (start, end) = period.window()?;

        // Both aggregates under one lock so they see the same rows
        let inner = self.inner.lock()?;
        let totals = db::totals_by_direction(&inner.conn, owner, &start, &end)?;
        let by_label = db::totals_by_label(&inner.conn, owner, &start, &end)?;
        drop(inner);

        tracing::debug!(owner, %period, groups = by_label.len(), "built monthly report");
        Ok(MonthlyReport {
            period,
            totals,
            by_label,
        })
    }
}
