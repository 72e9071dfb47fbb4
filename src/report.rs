// 📋 Reports - overview and custom summaries as plain serializable data
//
// Rendering (HTML, charts) happens elsewhere; these structs carry only
// numbers, records and series.

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::aggregate::{self, Extreme, RecordSummary};
use crate::entities::{CategoryRegistry, StoredRecord};
use crate::error::LedgerResult;
use crate::filter::{FilterCriteria, SignSelector};
use crate::input::CustomQuery;
use crate::series::{self, FlowEntry, FlowSeries, Granularity, YearMonth};
use crate::stats::SeriesSummary;

/// How many extreme records a custom report lists on each side
pub const EXTREMES_LIMIT: usize = 5;

/// Record statistics for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub summary: RecordSummary,
    pub largest: Option<StoredRecord>,
    pub smallest: Option<StoredRecord>,
}

/// Whole-ledger overview
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MainReport {
    pub records: usize,
    pub inflow: Option<f64>,
    pub outflow: Option<f64>,
    pub netflow: Option<f64>,
    /// Cumulative net balance per month
    pub historic: FlowSeries,
    /// Net flow per month through the report date
    pub monthly_flow: Vec<FlowEntry<YearMonth>>,
    pub cumulative_inflow: FlowSeries,
    pub cumulative_outflow: FlowSeries,
    pub monthly_inflow: SeriesSummary,
    pub monthly_outflow: SeriesSummary,
    pub monthly_net: SeriesSummary,
    pub categories: Vec<CategoryStats>,
}

/// Summary of an arbitrary filter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomReport {
    pub query: CustomQuery,
    pub summary: RecordSummary,
    pub monthly_flow: Vec<FlowEntry<YearMonth>>,
    pub daily_flow: Vec<FlowEntry<NaiveDate>>,
    pub cumulative: FlowSeries,
    pub smallest: Vec<StoredRecord>,
    pub largest: Vec<StoredRecord>,
    pub monthly: SeriesSummary,
}

/// Build the overview; monthly statistics run through `today`'s month
pub fn main_report(
    conn: &Connection,
    registry: &CategoryRegistry,
    today: NaiveDate,
) -> LedgerResult<MainReport> {
    let all = FilterCriteria::all();
    let positive = FilterCriteria::all().with_sign(SignSelector::Positive);
    let negative = FilterCriteria::all().with_sign(SignSelector::Negative);

    let monthly_flow = series::monthly_flow(conn, registry, &all, Some(today))?;
    let monthly_inflow = series::monthly_flow(conn, registry, &positive, Some(today))?;
    let monthly_outflow = series::monthly_flow(conn, registry, &negative, Some(today))?;

    let categories = registry
        .names()
        .map(|name| category_stats(conn, registry, name))
        .collect::<LedgerResult<Vec<_>>>()?;

    Ok(MainReport {
        records: aggregate::count(conn, registry, &all)?,
        inflow: aggregate::sum(conn, registry, &positive)?,
        outflow: aggregate::sum(conn, registry, &negative)?,
        netflow: aggregate::sum(conn, registry, &all)?,
        historic: series::cumulative(conn, registry, &all, Granularity::Monthly, None)?,
        cumulative_inflow: series::cumulative(conn, registry, &positive, Granularity::Monthly, None)?,
        cumulative_outflow: series::cumulative(conn, registry, &negative, Granularity::Monthly, None)?,
        monthly_inflow: SeriesSummary::of(&monthly_inflow),
        monthly_outflow: SeriesSummary::of(&monthly_outflow),
        monthly_net: SeriesSummary::of(&monthly_flow),
        monthly_flow,
        categories,
    })
}

/// Build a report for a custom query
pub fn custom_report(
    conn: &Connection,
    registry: &CategoryRegistry,
    query: &CustomQuery,
) -> LedgerResult<CustomReport> {
    let criteria = &query.criteria;
    let monthly_flow = series::monthly_flow(conn, registry, criteria, query.forced_end)?;

    Ok(CustomReport {
        summary: aggregate::summarize(conn, registry, criteria)?,
        daily_flow: series::daily_flow(conn, registry, criteria)?,
        cumulative: FlowSeries::Monthly(series::running_total(&monthly_flow)),
        smallest: aggregate::top_by_amount(conn, registry, criteria, Extreme::Min, EXTREMES_LIMIT)?,
        largest: aggregate::top_by_amount(conn, registry, criteria, Extreme::Max, EXTREMES_LIMIT)?,
        monthly: SeriesSummary::of(&monthly_flow),
        monthly_flow,
        query: query.clone(),
    })
}

fn category_stats(
    conn: &Connection,
    registry: &CategoryRegistry,
    name: &str,
) -> LedgerResult<CategoryStats> {
    let criteria = FilterCriteria::all().with_category(name);
    let first = |extreme: Extreme| -> LedgerResult<Option<StoredRecord>> {
        Ok(aggregate::top_by_amount(conn, registry, &criteria, extreme, 1)?
            .into_iter()
            .next())
    };

    Ok(CategoryStats {
        category: name.to_string(),
        summary: aggregate::summarize(conn, registry, &criteria)?,
        largest: first(Extreme::Max)?,
        smallest: first(Extreme::Min)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::filter::DateRange;
    use crate::store::test_ledger;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> (Connection, CategoryRegistry) {
        test_ledger(&[
            ("Income", "Salary", 2000.0, "2024-01-31"),
            ("Necessity", "Rent", -900.0, "2024-02-01"),
            ("Necessity", "Groceries", -150.0, "2024-02-03"),
            ("Pleasure", "Cinema", -20.0, "2024-02-03"),
            ("Income", "Salary", 2000.0, "2024-03-29"),
        ])
    }

    #[test]
    fn test_main_report_overview() {
        let (conn, registry) = sample();
        let report = main_report(&conn, &registry, date("2024-05-10")).unwrap();

        assert_eq!(report.records, 5);
        assert_eq!(report.inflow, Some(4000.0));
        assert_eq!(report.outflow, Some(-1070.0));
        assert_eq!(report.netflow, Some(2930.0));

        // January through May, with April and May quiet
        let totals: Vec<f64> = report.monthly_flow.iter().map(|e| e.total).collect();
        assert_eq!(totals, vec![2000.0, -1070.0, 2000.0, 0.0, 0.0]);
        assert_eq!(report.monthly_net.median, Some(0.0));
        assert_eq!(report.monthly_net.max, Some(2000.0));

        // Outflow series starts at its own first month
        assert_eq!(report.monthly_outflow.mean, Some(-1070.0 / 4.0));

        // Historic curve is not extended past the last populated month
        assert_eq!(report.historic.totals(), vec![2000.0, 930.0, 2930.0]);

        assert_eq!(report.categories.len(), 5);
        let necessity = &report.categories[1];
        assert_eq!(necessity.category, "Necessity");
        assert_eq!(necessity.summary.count, 2);
        assert_eq!(necessity.smallest.as_ref().map(|r| r.amount), Some(-900.0));
        assert_eq!(necessity.largest.as_ref().map(|r| r.amount), Some(-150.0));

        let emergency = &report.categories[4];
        assert_eq!(emergency.summary.count, 0);
        assert!(emergency.largest.is_none());
    }

    #[test]
    fn test_main_report_on_empty_ledger() {
        let (conn, registry) = test_ledger(&[]);
        let report = main_report(&conn, &registry, date("2024-05-10")).unwrap();

        assert_eq!(report.records, 0);
        assert_eq!(report.netflow, None);
        assert!(report.monthly_flow.is_empty());
        assert!(report.historic.is_empty());
        assert_eq!(report.monthly_net, SeriesSummary::default());
    }

    #[test]
    fn test_main_report_rejects_report_date_before_data() {
        let (conn, registry) = sample();
        let err = main_report(&conn, &registry, date("2023-12-31")).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRange(_)));
    }

    #[test]
    fn test_custom_report() {
        let (conn, registry) = sample();
        let query = CustomQuery {
            criteria: FilterCriteria::all()
                .with_sign(SignSelector::Negative)
                .with_range(DateRange::between(date("2024-01-01"), date("2024-04-30")).unwrap()),
            forced_end: Some(date("2024-04-30")),
        };

        let report = custom_report(&conn, &registry, &query).unwrap();

        assert_eq!(report.summary.count, 3);
        assert_eq!(report.summary.sum, Some(-1070.0));
        assert_eq!(report.summary.median, Some(-150.0));

        let periods: Vec<String> = report.monthly_flow.iter().map(|e| e.period.to_string()).collect();
        assert_eq!(periods, vec!["2024-02", "2024-03", "2024-04"]);
        assert_eq!(report.cumulative.totals(), vec![-1070.0, -1070.0, -1070.0]);

        assert_eq!(report.daily_flow.len(), 2);
        assert_eq!(report.smallest[0].description, "Rent");
        assert_eq!(report.largest[0].description, "Cinema");
        assert_eq!(report.monthly.min, Some(-1070.0));
    }
}
