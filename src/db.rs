use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;
use crate::report::LabelTotal;

/// Opaque identifier of the user who owns a record
pub type OwnerId = i64;

/// Store-assigned, monotonically increasing row id
pub type TransactionId = i64;

/// Direction of money flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Income,
    Expense,
}

impl Direction {
    /// Code used in storage and callback data
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Income => "income",
            Direction::Expense => "expense",
        }
    }

    /// +1 for income, -1 for expense
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Income => 1.0,
            Direction::Expense => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for Direction {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Direction {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(Direction::Income),
            "expense" => Ok(Direction::Expense),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// A recorded income/expense event
/// Immutable once persisted: the core never updates or deletes rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub owner: OwnerId,
    pub amount: f64,
    pub direction: Direction,
    pub label: String,
    pub note: String,
    pub recorded_at: DateTime<Utc>,
}

impl Transaction {
    /// Sortable UTC form with second precision, e.g. `2024-12-31T23:59:59Z`
    pub fn recorded_at_iso(&self) -> String {
        self.recorded_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Signed contribution to the balance
    pub fn signed_amount(&self) -> f64 {
        self.direction.sign() * self.amount
    }
}

/// Fixed-width UTC representation, so that string order == time order
pub fn to_sql_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn from_sql_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL for crash recovery; in-memory databases silently stay on "memory"
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner INTEGER NOT NULL,
            amount REAL NOT NULL CHECK(amount >= 0),
            direction TEXT NOT NULL CHECK(direction IN ('income','expense')),
            label TEXT NOT NULL DEFAULT '',
            note TEXT NOT NULL DEFAULT '',
            recorded_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_owner_recorded_at ON transactions(owner, recorded_at)",
        [],
    )?;

    Ok(())
}

/// Insert one row with an explicit timestamp, returning its id
pub fn insert_transaction(
    conn: &Connection,
    owner: OwnerId,
    amount: f64,
    direction: Direction,
    label: &str,
    note: &str,
    recorded_at: &DateTime<Utc>,
) -> Result<TransactionId> {
    conn.execute(
        "INSERT INTO transactions (owner, amount, direction, label, note, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![owner, amount, direction, label, note, to_sql_timestamp(recorded_at)],
    )?;

    Ok(conn.last_insert_rowid())
}

fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let recorded_at: String = row.get(6)?;

    Ok(Transaction {
        id: row.get(0)?,
        owner: row.get(1)?,
        amount: row.get(2)?,
        direction: row.get(3)?,
        label: row.get(4)?,
        note: row.get(5)?,
        recorded_at: from_sql_timestamp(6, &recorded_at)?,
    })
}

/// Most recent transactions first; equal timestamps fall back to insertion order
pub fn recent_transactions(conn: &Connection, owner: OwnerId, limit: u32) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner, amount, direction, label, note, recorded_at
         FROM transactions
         WHERE owner = ?1
         ORDER BY recorded_at DESC, id DESC
         LIMIT ?2",
    )?;

    let transactions = stmt
        .query_map(params![owner, limit], row_to_transaction)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(transactions)
}

/// Sum of amounts per direction within `[start, end)`
pub fn totals_by_direction(
    conn: &Connection,
    owner: OwnerId,
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
) -> Result<BTreeMap<Direction, f64>> {
    let mut stmt = conn.prepare(
        "SELECT direction, SUM(amount)
         FROM transactions
         WHERE owner = ?1 AND recorded_at >= ?2 AND recorded_at < ?3
         GROUP BY direction",
    )?;

    let totals = stmt
        .query_map(
            params![owner, to_sql_timestamp(start), to_sql_timestamp(end)],
            |row| Ok((row.get::<_, Direction>(0)?, row.get::<_, f64>(1)?)),
        )?
        .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;

    Ok(totals)
}

/// Sum of amounts per (direction, label) within `[start, end)`, largest first
pub fn totals_by_label(
    conn: &Connection,
    owner: OwnerId,
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
) -> Result<Vec<LabelTotal>> {
    let mut stmt = conn.prepare(
        "SELECT direction, label, SUM(amount) AS total
         FROM transactions
         WHERE owner = ?1 AND recorded_at >= ?2 AND recorded_at < ?3
         GROUP BY direction, label
         ORDER BY total DESC, direction ASC, label ASC",
    )?;

    let totals = stmt
        .query_map(
            params![owner, to_sql_timestamp(start), to_sql_timestamp(end)],
            |row| {
                Ok(LabelTotal {
                    direction: row.get(0)?,
                    label: row.get(1)?,
                    total: row.get(2)?,
                })
            },
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(totals)
}

/// Latest stored timestamp across all owners
pub fn latest_recorded_at(conn: &Connection) -> Result<Option<DateTime<Utc>>> {
    let raw: Option<String> =
        conn.query_row("SELECT MAX(recorded_at) FROM transactions", [], |row| row.get(0))?;

    match raw {
        Some(s) => Ok(Some(from_sql_timestamp(0, &s)?)),
        None => Ok(None),
    }
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;

    Ok(count)
}
