// 🗄️ Ledger Store - SQLite persistence for categories and records
//
// Offers the primitives the core builds on: ledger creation, category
// listing, batch insert, predicate-matched delete and filtered queries.
// Insert and delete each run inside a single transaction.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;

use crate::entities::{Category, CategoryRegistry, Record, StoredRecord};
use crate::error::{LedgerError, LedgerResult};
use crate::filter::Predicate;

/// Rows shown by a recent-records listing when no limit is given
pub const DEFAULT_PEEK_LIMIT: usize = 30;

/// Row ordering for record queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOrder {
    /// Most recent first
    Newest,
    /// Smallest amount first; ties by date, then insertion order
    AmountAscending,
    /// Largest amount first; ties by date, then insertion order
    AmountDescending,
}

impl RecordOrder {
    fn sql(&self) -> &'static str {
        match self {
            RecordOrder::Newest => "records.date DESC, records.id DESC",
            RecordOrder::AmountAscending => "records.amount ASC, records.date ASC, records.id ASC",
            RecordOrder::AmountDescending => "records.amount DESC, records.date ASC, records.id ASC",
        }
    }
}

// ============================================================================
// SCHEMA & LIFECYCLE
// ============================================================================

/// Create tables and seed categories; safe to call on an existing ledger
pub fn setup_database(conn: &Connection) -> LedgerResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category INTEGER NOT NULL REFERENCES categories(id),
            description TEXT NOT NULL,
            amount REAL NOT NULL,
            date TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_records_date ON records(date)",
        [],
    )?;

    // Identifiers follow seeding order
    for category in Category::ALL {
        conn.execute(
            "INSERT OR IGNORE INTO categories (name) VALUES (?1)",
            params![category.as_str()],
        )?;
    }

    Ok(())
}

/// Create a brand new ledger file; refuses to touch an existing one
pub fn init_ledger(path: &Path) -> LedgerResult<Connection> {
    if path.exists() {
        return Err(LedgerError::LedgerExists(path.display().to_string()));
    }

    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    setup_database(&conn)?;

    tracing::info!(path = %path.display(), "initialized ledger");
    Ok(conn)
}

/// Open an existing ledger file; never creates one
pub fn open_ledger(path: &Path) -> LedgerResult<Connection> {
    if !path.is_file() {
        return Err(LedgerError::LedgerMissing(path.display().to_string()));
    }

    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    setup_database(&conn)?;
    Ok(conn)
}

/// Load the category snapshot
pub fn list_categories(conn: &Connection) -> LedgerResult<CategoryRegistry> {
    let mut stmt = conn.prepare("SELECT name, id FROM categories ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CategoryRegistry::from_rows(rows))
}

// ============================================================================
// WRITES
// ============================================================================

/// Insert all records or none
pub fn insert_batch(conn: &mut Connection, records: &[Record]) -> LedgerResult<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO records (category, description, amount, date) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for record in records {
            stmt.execute(params![
                record.category.0,
                record.description,
                record.amount,
                record.date,
            ])?;
        }
    }
    tx.commit()?;

    tracing::info!(inserted = records.len(), "inserted records");
    Ok(records.len())
}

/// Delete every record the predicate matches, atomically
pub fn delete_matching(conn: &mut Connection, predicate: &Predicate) -> LedgerResult<usize> {
    let tx = conn.transaction()?;
    let deleted = tx.execute(
        &format!("DELETE FROM records {}", predicate.where_clause()),
        params_from_iter(predicate.params()),
    )?;
    tx.commit()?;

    tracing::info!(deleted, "deleted records");
    Ok(deleted)
}

// ============================================================================
// READS
// ============================================================================

/// Records matching the predicate, ordered and optionally limited
pub fn query_matching(
    conn: &Connection,
    predicate: &Predicate,
    order: RecordOrder,
    limit: Option<usize>,
) -> LedgerResult<Vec<StoredRecord>> {
    let mut sql = format!(
        "SELECT records.id, categories.name, records.description, records.amount, records.date
         FROM records
         LEFT JOIN categories ON records.category = categories.id
         {}
         ORDER BY {}",
        predicate.where_clause(),
        order.sql()
    );

    let mut bound: Vec<Value> = predicate.params().to_vec();
    if let Some(limit) = limit {
        sql.push_str(" LIMIT ?");
        bound.push(Value::Integer(limit as i64));
    }

    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map(params_from_iter(bound.iter()), |row| {
            Ok(StoredRecord {
                id: row.get(0)?,
                category: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                description: row.get(2)?,
                amount: row.get(3)?,
                date: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Most recent records; `None` returns the whole ledger
pub fn peek(conn: &Connection, limit: Option<usize>) -> LedgerResult<Vec<StoredRecord>> {
    query_matching(conn, &Predicate::default(), RecordOrder::Newest, limit)
}

/// Amounts of every matched record, in no particular order
pub fn matching_amounts(conn: &Connection, predicate: &Predicate) -> LedgerResult<Vec<f64>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT records.amount FROM records {}",
        predicate.where_clause()
    ))?;
    let amounts = stmt
        .query_map(params_from_iter(predicate.params()), |row| row.get(0))?
        .collect::<Result<Vec<f64>, _>>()?;

    Ok(amounts)
}

/// In-memory ledger populated from `(category, description, amount, date)` rows
#[cfg(test)]
pub(crate) fn test_ledger(rows: &[(&str, &str, f64, &str)]) -> (Connection, CategoryRegistry) {
    let mut conn = Connection::open_in_memory().unwrap();
    setup_database(&conn).unwrap();
    let registry = list_categories(&conn).unwrap();

    let records: Vec<Record> = rows
        .iter()
        .map(|(category, description, amount, date)| {
            Record::parse(category, description, &amount.to_string(), date, &registry).unwrap()
        })
        .collect();
    insert_batch(&mut conn, &records).unwrap();

    (conn, registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::CategoryId;
    use crate::filter::{compose, FilterCriteria, SignSelector};
    use chrono::NaiveDate;

    #[test]
    fn test_setup_seeds_fixed_categories() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        // Second run must not duplicate categories
        setup_database(&conn).unwrap();

        let registry = list_categories(&conn).unwrap();
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.resolve("Income").unwrap(), CategoryId(1));
        assert_eq!(registry.resolve("Emergency").unwrap(), CategoryId(5));
    }

    #[test]
    fn test_init_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        init_ledger(&path).unwrap();
        let err = init_ledger(&path).unwrap_err();
        assert!(matches!(err, LedgerError::LedgerExists(_)));

        let conn = open_ledger(&path).unwrap();
        assert_eq!(list_categories(&conn).unwrap().len(), 5);
    }

    #[test]
    fn test_open_refuses_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");

        let err = open_ledger(&path).unwrap_err();
        assert!(matches!(err, LedgerError::LedgerMissing(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_insert_and_peek_newest_first() {
        let (conn, _) = test_ledger(&[
            ("Income", "Salary", 2000.0, "2024-01-31"),
            ("Necessity", "Rent", -900.0, "2024-02-01"),
            ("Pleasure", "Cinema", -12.5, "2024-01-15"),
        ]);

        let records = peek(&conn, None).unwrap();
        let descriptions: Vec<&str> = records.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(descriptions, vec!["Rent", "Salary", "Cinema"]);
        assert_eq!(records[0].category, "Necessity");
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

        assert_eq!(peek(&conn, Some(2)).unwrap().len(), 2);
        assert!(peek(&conn, Some(0)).unwrap().is_empty());
    }

    #[test]
    fn test_insert_batch_is_atomic() {
        let (mut conn, registry) = test_ledger(&[]);
        let good = Record::parse("Income", "Salary", "100", "2024-01-01", &registry).unwrap();
        let mut orphan = good.clone();
        orphan.category = CategoryId(99);

        let result = insert_batch(&mut conn, &[good, orphan]);
        assert!(matches!(result, Err(LedgerError::Storage(_))));
        assert!(peek(&conn, None).unwrap().is_empty());
    }

    #[test]
    fn test_delete_matching_uses_predicate() {
        let (mut conn, registry) = test_ledger(&[
            ("Income", "Salary", 2000.0, "2024-01-31"),
            ("Necessity", "Rent", -900.0, "2024-02-01"),
            ("Pleasure", "Cinema", -12.5, "2024-01-15"),
        ]);

        let predicate = compose(
            &FilterCriteria::all().with_sign(SignSelector::Negative),
            &registry,
        )
        .unwrap();

        let preview = query_matching(&conn, &predicate, RecordOrder::Newest, None).unwrap();
        let deleted = delete_matching(&mut conn, &predicate).unwrap();
        assert_eq!(deleted, preview.len());
        assert_eq!(deleted, 2);

        let remaining = peek(&conn, None).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].description, "Salary");
    }

    #[test]
    fn test_matching_amounts() {
        let (conn, registry) = test_ledger(&[
            ("Income", "Salary", 2000.0, "2024-01-31"),
            ("Necessity", "Rent", -900.0, "2024-02-01"),
        ]);
        let predicate = compose(&FilterCriteria::all().with_category("Income"), &registry).unwrap();

        assert_eq!(matching_amounts(&conn, &predicate).unwrap(), vec![2000.0]);
    }
}
