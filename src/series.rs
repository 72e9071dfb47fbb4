// 📈 Time-Series Builder - daily and monthly flows, cumulative curves
//
// Daily flows list only days with activity. Monthly flows are gap-filled:
// every calendar month from the first populated month through the end month
// appears, quiet months with a zero total, so statistics over a reporting
// window count them.

use chrono::{Datelike, NaiveDate};
use rusqlite::{params_from_iter, Connection};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::entities::CategoryRegistry;
use crate::error::{LedgerError, LedgerResult};
use crate::filter::{compose, FilterCriteria};

// ============================================================================
// PERIODS
// ============================================================================

/// Calendar month, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(YearMonth { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The following calendar month
    pub fn succ(&self) -> Self {
        if self.month == 12 {
            YearMonth { year: self.year + 1, month: 1 }
        } else {
            YearMonth { year: self.year, month: self.month + 1 }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = LedgerError;

    /// Parses `YYYY-MM`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::InvalidDate(s.to_string());
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// FLOW ENTRIES
// ============================================================================

/// Total movement within one period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowEntry<P> {
    pub period: P,
    pub total: f64,
}

impl<P> FlowEntry<P> {
    pub fn new(period: P, total: f64) -> Self {
        FlowEntry { period, total }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Monthly,
}

/// A flow series at either granularity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowSeries {
    Daily(Vec<FlowEntry<NaiveDate>>),
    Monthly(Vec<FlowEntry<YearMonth>>),
}

impl FlowSeries {
    pub fn totals(&self) -> Vec<f64> {
        match self {
            FlowSeries::Daily(entries) => entries.iter().map(|e| e.total).collect(),
            FlowSeries::Monthly(entries) => entries.iter().map(|e| e.total).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FlowSeries::Daily(entries) => entries.len(),
            FlowSeries::Monthly(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// BUILDERS
// ============================================================================

/// Sum per exact date, ascending; days without records are absent
pub fn daily_flow(
    conn: &Connection,
    registry: &CategoryRegistry,
    criteria: &FilterCriteria,
) -> LedgerResult<Vec<FlowEntry<NaiveDate>>> {
    let predicate = compose(criteria, registry)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT records.date, SUM(records.amount)
         FROM records {}
         GROUP BY records.date
         ORDER BY records.date",
        predicate.where_clause()
    ))?;

    let flows = stmt
        .query_map(params_from_iter(predicate.params()), |row| {
            Ok(FlowEntry::new(row.get::<_, NaiveDate>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(flows)
}

/// Sum per calendar month, gap-filled through `forced_end` (or the last
/// populated month)
pub fn monthly_flow(
    conn: &Connection,
    registry: &CategoryRegistry,
    criteria: &FilterCriteria,
    forced_end: Option<NaiveDate>,
) -> LedgerResult<Vec<FlowEntry<YearMonth>>> {
    let predicate = compose(criteria, registry)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT substr(records.date, 1, 7) AS month, SUM(records.amount)
         FROM records {}
         GROUP BY month
         ORDER BY month",
        predicate.where_clause()
    ))?;

    let rows = stmt
        .query_map(params_from_iter(predicate.params()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let populated = rows
        .into_iter()
        .map(|(month, total)| Ok(FlowEntry::new(month.parse::<YearMonth>()?, total)))
        .collect::<LedgerResult<Vec<_>>>()?;

    fill_month_gaps(&populated, forced_end.map(YearMonth::of))
}

/// Expand populated months into a contiguous series ending at `end`
///
/// `populated` must be sorted ascending with unique months. An empty input
/// stays empty whatever `end` is. Months after `end` are dropped.
pub fn fill_month_gaps(
    populated: &[FlowEntry<YearMonth>],
    end: Option<YearMonth>,
) -> LedgerResult<Vec<FlowEntry<YearMonth>>> {
    let (first, last) = match (populated.first(), populated.last()) {
        (Some(first), Some(last)) => (first.period, last.period),
        _ => return Ok(Vec::new()),
    };

    let end = end.unwrap_or(last);
    if end < first {
        return Err(LedgerError::InvalidRange(format!(
            "forced end month {} precedes first populated month {}",
            end, first
        )));
    }

    let totals: BTreeMap<YearMonth, f64> =
        populated.iter().map(|e| (e.period, e.total)).collect();

    let mut series = Vec::new();
    let mut month = first;
    loop {
        series.push(FlowEntry::new(month, totals.get(&month).copied().unwrap_or(0.0)));
        if month == end {
            break;
        }
        month = month.succ();
    }

    Ok(series)
}

/// Replace each total with the running sum up to and including it
pub fn running_total<P: Clone>(series: &[FlowEntry<P>]) -> Vec<FlowEntry<P>> {
    let mut acc = 0.0;
    series
        .iter()
        .map(|entry| {
            acc += entry.total;
            FlowEntry::new(entry.period.clone(), acc)
        })
        .collect()
}

/// Cumulative curve; the monthly variant accumulates over the gap-filled series
pub fn cumulative(
    conn: &Connection,
    registry: &CategoryRegistry,
    criteria: &FilterCriteria,
    granularity: Granularity,
    forced_end: Option<NaiveDate>,
) -> LedgerResult<FlowSeries> {
    Ok(match granularity {
        Granularity::Daily => FlowSeries::Daily(running_total(&daily_flow(conn, registry, criteria)?)),
        Granularity::Monthly => FlowSeries::Monthly(running_total(&monthly_flow(
            conn, registry, criteria, forced_end,
        )?)),
    })
}
