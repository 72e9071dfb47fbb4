// 🧾 Record Model - canonical ledger entries and their parser
//
// A record is immutable once built. Positive amounts are inflows, negative
// amounts are outflows and zero is allowed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::category::{CategoryId, CategoryRegistry};
use crate::error::{LedgerError, LedgerResult};

/// Maximum stored description length, in characters
pub const DESCRIPTION_LIMIT: usize = 150;

/// Canonical date format used everywhere in the ledger
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Stands in for the backup field separator inside descriptions
const SEPARATOR_REPLACEMENT: char = '/';

/// Validated record ready for insertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub category: CategoryId,
    pub description: String,
    pub amount: f64,
    pub date: NaiveDate,
}

impl Record {
    /// Validate raw text fields into a record
    ///
    /// Checks run in order: description, amount, date, category. The category
    /// name is matched case-insensitively. Descriptions are kept to a single
    /// line free of `|` so every stored record fits on one backup line.
    pub fn parse(
        category: &str,
        description: &str,
        amount: &str,
        date: &str,
        registry: &CategoryRegistry,
    ) -> LedgerResult<Record> {
        let description = normalize_description(description);
        if description.is_empty() {
            return Err(LedgerError::EmptyDescription);
        }
        let amount = parse_amount(amount)?;
        let date = parse_date(date)?;
        let category = registry.resolve_loose(category)?;

        Ok(Record {
            category,
            description,
            amount,
            date,
        })
    }
}

/// Record as read back from storage, with its category name resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: i64,
    pub category: String,
    pub description: String,
    pub amount: f64,
    pub date: NaiveDate,
}

impl StoredRecord {
    /// Date in canonical `YYYY-MM-DD` form
    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

pub fn parse_amount(text: &str) -> LedgerResult<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| LedgerError::InvalidAmount(text.to_string()))
}

pub fn parse_date(text: &str) -> LedgerResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|_| LedgerError::InvalidDate(text.to_string()))
}

fn normalize_description(description: &str) -> String {
    let single_line: String = description
        .chars()
        .map(|c| match c {
            '|' => SEPARATOR_REPLACEMENT,
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();

    single_line
        .trim()
        .chars()
        .take(DESCRIPTION_LIMIT)
        .collect::<String>()
        .trim_end()
        .to_string()
}
