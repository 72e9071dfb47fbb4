// 🧮 Aggregation Engine - scalar statistics over filtered records
//
// Count and sum run in SQL. Mean, variance, std-dev and median materialize
// the matched amounts and compute exactly in memory, so the median is a true
// order statistic. Empty matches give 0 for count and None for everything else.

use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};

use crate::entities::{CategoryRegistry, StoredRecord};
use crate::error::LedgerResult;
use crate::filter::{compose, FilterCriteria};
use crate::stats;
use crate::store::{matching_amounts, query_matching, RecordOrder};

/// Direction for extreme-record lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extreme {
    Max,
    Min,
}

pub fn count(
    conn: &Connection,
    registry: &CategoryRegistry,
    criteria: &FilterCriteria,
) -> LedgerResult<usize> {
    let predicate = compose(criteria, registry)?;
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM records {}", predicate.where_clause()),
        params_from_iter(predicate.params()),
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

pub fn sum(
    conn: &Connection,
    registry: &CategoryRegistry,
    criteria: &FilterCriteria,
) -> LedgerResult<Option<f64>> {
    let predicate = compose(criteria, registry)?;
    let total: Option<f64> = conn.query_row(
        &format!("SELECT SUM(records.amount) FROM records {}", predicate.where_clause()),
        params_from_iter(predicate.params()),
        |row| row.get(0),
    )?;
    Ok(total)
}

pub fn mean(
    conn: &Connection,
    registry: &CategoryRegistry,
    criteria: &FilterCriteria,
) -> LedgerResult<Option<f64>> {
    Ok(stats::mean(&amounts(conn, registry, criteria)?))
}

pub fn population_variance(
    conn: &Connection,
    registry: &CategoryRegistry,
    criteria: &FilterCriteria,
) -> LedgerResult<Option<f64>> {
    Ok(stats::population_variance(&amounts(conn, registry, criteria)?))
}

pub fn population_std_dev(
    conn: &Connection,
    registry: &CategoryRegistry,
    criteria: &FilterCriteria,
) -> LedgerResult<Option<f64>> {
    Ok(stats::population_std_dev(&amounts(conn, registry, criteria)?))
}

pub fn median(
    conn: &Connection,
    registry: &CategoryRegistry,
    criteria: &FilterCriteria,
) -> LedgerResult<Option<f64>> {
    Ok(stats::median(&amounts(conn, registry, criteria)?))
}

/// Up to `limit` records with the largest (`Max`) or smallest (`Min`) amounts
///
/// Equal amounts are ordered by date ascending, then by insertion order.
pub fn top_by_amount(
    conn: &Connection,
    registry: &CategoryRegistry,
    criteria: &FilterCriteria,
    extreme: Extreme,
    limit: usize,
) -> LedgerResult<Vec<StoredRecord>> {
    let predicate = compose(criteria, registry)?;
    let order = match extreme {
        Extreme::Max => RecordOrder::AmountDescending,
        Extreme::Min => RecordOrder::AmountAscending,
    };
    query_matching(conn, &predicate, order, Some(limit))
}

/// Record-level statistics computed from a single pass over the matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RecordSummary {
    pub count: usize,
    pub sum: Option<f64>,
    pub mean: Option<f64>,
    pub variance: Option<f64>,
    pub std_dev: Option<f64>,
    pub median: Option<f64>,
}

pub fn summarize(
    conn: &Connection,
    registry: &CategoryRegistry,
    criteria: &FilterCriteria,
) -> LedgerResult<RecordSummary> {
    let values = amounts(conn, registry, criteria)?;
    Ok(RecordSummary {
        count: values.len(),
        sum: (!values.is_empty()).then(|| values.iter().sum::<f64>()),
        mean: stats::mean(&values),
        variance: stats::population_variance(&values),
        std_dev: stats::population_std_dev(&values),
        median: stats::median(&values),
    })
}

fn amounts(
    conn: &Connection,
    registry: &CategoryRegistry,
    criteria: &FilterCriteria,
) -> LedgerResult<Vec<f64>> {
    let predicate = compose(criteria, registry)?;
    matching_amounts(conn, &predicate)
}
