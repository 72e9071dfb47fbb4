// 📝 Request Input - key/value parameters → records and filter criteria
//
// The CLI and the HTTP server both collect user input as string maps and
// hand them here, so both surfaces validate identically. Empty optional
// values count as absent.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::entities::{parse_date, CategoryRegistry, Record};
use crate::error::{LedgerError, LedgerResult};
use crate::filter::{DateRange, FilterCriteria, SignSelector};

pub type Params = HashMap<String, String>;

/// Category value meaning "do not filter on category"
pub const ALL_CATEGORIES: &str = "All";

/// Filters for a custom report plus the month its series should run through
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomQuery {
    pub criteria: FilterCriteria,
    pub forced_end: Option<NaiveDate>,
}

/// Single record insert; requires category, description, amount and date
pub fn read_insert(params: &Params, registry: &CategoryRegistry) -> LedgerResult<Record> {
    Record::parse(
        required(params, "category")?,
        required(params, "description")?,
        required(params, "amount")?,
        required(params, "date")?,
        registry,
    )
}

/// Delete filter; requires category and start, end and description optional
pub fn read_delete(params: &Params) -> LedgerResult<FilterCriteria> {
    let category = required(params, "category")?;
    let start = parse_date(required(params, "start")?)?;
    let end = optional(params, "end").map(parse_date).transpose()?;

    let mut criteria = FilterCriteria::all()
        .with_category(category)
        .with_range(DateRange::new(Some(start), end)?);
    if let Some(description) = optional(params, "description") {
        criteria = criteria.with_description(description);
    }
    Ok(criteria)
}

/// Custom report query; every key optional
///
/// An `end` date also becomes the forced end of the monthly series.
pub fn read_custom(params: &Params) -> LedgerResult<CustomQuery> {
    let start = optional(params, "start").map(parse_date).transpose()?;
    let end = optional(params, "end").map(parse_date).transpose()?;

    let range = match (start, end) {
        (None, None) => None,
        _ => Some(DateRange::new(start, end)?),
    };

    let mut criteria = FilterCriteria::all();
    if let Some(range) = range {
        criteria = criteria.with_range(range);
    }
    if let Some(category) = optional(params, "category").filter(|c| *c != ALL_CATEGORIES) {
        criteria = criteria.with_category(category);
    }
    if let Some(sign) = optional(params, "sign") {
        criteria = criteria.with_sign(sign.parse::<SignSelector>()?);
    }
    if let Some(description) = optional(params, "description") {
        criteria = criteria.with_description(description);
    }

    Ok(CustomQuery {
        criteria,
        forced_end: range.and_then(|r| r.end()),
    })
}

fn required<'a>(params: &'a Params, key: &str) -> LedgerResult<&'a str> {
    params
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| LedgerError::MissingParameter(key.to_string()))
}

fn optional<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}
