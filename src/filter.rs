// 🔎 Predicate Builder - optional filter criteria → one SQL predicate
//
// Each criterion compiles to its own fragment; present fragments are joined
// with AND. The same Predicate drives reads, aggregates, series and deletes,
// so a preview matches exactly what a delete would remove.

use chrono::NaiveDate;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::entities::{CategoryRegistry, DATE_FORMAT};
use crate::error::{LedgerError, LedgerResult};

// ============================================================================
// CRITERIA
// ============================================================================

/// Sign selection over amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignSelector {
    All,
    Positive,
    Negative,
}

impl SignSelector {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignSelector::All => "all",
            SignSelector::Positive => "positive",
            SignSelector::Negative => "negative",
        }
    }
}

impl FromStr for SignSelector {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(SignSelector::All),
            "positive" => Ok(SignSelector::Positive),
            "negative" => Ok(SignSelector::Negative),
            other => Err(LedgerError::InvalidSelector(other.to_string())),
        }
    }
}

/// Inclusive date bounds; either side may be open
///
/// Can only be constructed with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DateRange {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> LedgerResult<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(LedgerError::InvalidRange(format!(
                    "start {} must be before or equal to end {}",
                    s.format(DATE_FORMAT),
                    e.format(DATE_FORMAT)
                )));
            }
        }
        Ok(DateRange { start, end })
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> LedgerResult<Self> {
        DateRange::new(Some(start), Some(end))
    }

    pub fn since(start: NaiveDate) -> Self {
        DateRange { start: Some(start), end: None }
    }

    pub fn until(end: NaiveDate) -> Self {
        DateRange { start: None, end: Some(end) }
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }
}

/// Independently optional filter dimensions; `None` means "do not filter"
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterCriteria {
    pub date_range: Option<DateRange>,
    pub category: Option<String>,
    pub sign: Option<SignSelector>,
    pub description: Option<String>,
}

impl FilterCriteria {
    /// Criteria matching every record
    pub fn all() -> Self {
        FilterCriteria::default()
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_sign(mut self, sign: SignSelector) -> Self {
        self.sign = Some(sign);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// ============================================================================
// PREDICATE
// ============================================================================

/// Combined filter expression with its positional parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    conditions: Vec<&'static str>,
    params: Vec<Value>,
}

impl Predicate {
    /// `WHERE ...` clause, or an empty string when everything matches
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn matches_all(&self) -> bool {
        self.conditions.is_empty()
    }

    fn push(&mut self, condition: &'static str, params: Vec<Value>) {
        self.conditions.push(condition);
        self.params.extend(params);
    }
}

/// Compose criteria into a predicate, resolving the category name exactly
pub fn compose(criteria: &FilterCriteria, registry: &CategoryRegistry) -> LedgerResult<Predicate> {
    let mut predicate = Predicate::default();

    if let Some(condition) = sign_condition(criteria.sign) {
        predicate.push(condition, Vec::new());
    }
    if let Some(range) = &criteria.date_range {
        for (condition, params) in date_conditions(range) {
            predicate.push(condition, params);
        }
    }
    if let Some(name) = &criteria.category {
        let id = registry.resolve(name)?;
        predicate.push("records.category = ?", vec![Value::Integer(id.0)]);
    }
    if let Some(text) = criteria.description.as_deref().filter(|d| !d.is_empty()) {
        predicate.push(
            "instr(records.description, ?) > 0",
            vec![Value::Text(text.to_string())],
        );
    }

    tracing::debug!(
        clause = %predicate.where_clause(),
        params = predicate.params.len(),
        "composed filter predicate"
    );
    Ok(predicate)
}

fn sign_condition(sign: Option<SignSelector>) -> Option<&'static str> {
    match sign? {
        SignSelector::Positive => Some("records.amount > 0"),
        SignSelector::Negative => Some("records.amount < 0"),
        SignSelector::All => None,
    }
}

fn date_conditions(range: &DateRange) -> Vec<(&'static str, Vec<Value>)> {
    let text = |d: NaiveDate| Value::Text(d.format(DATE_FORMAT).to_string());
    match (range.start(), range.end()) {
        (Some(s), Some(e)) => vec![(
            "records.date >= ? AND records.date <= ?",
            vec![text(s), text(e)],
        )],
        (Some(s), None) => vec![("records.date >= ?", vec![text(s)])],
        (None, Some(e)) => vec![("records.date <= ?", vec![text(e)])],
        (None, None) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Category;

    fn registry() -> CategoryRegistry {
        CategoryRegistry::from_rows(
            Category::ALL
                .iter()
                .enumerate()
                .map(|(i, c)| (c.as_str(), i as i64 + 1)),
        )
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_no_criteria_matches_all() {
        let predicate = compose(&FilterCriteria::all(), &registry()).unwrap();
        assert!(predicate.matches_all());
        assert_eq!(predicate.where_clause(), "");
        assert!(predicate.params().is_empty());
    }

    #[test]
    fn test_sign_selectors() {
        let positive = compose(
            &FilterCriteria::all().with_sign(SignSelector::Positive),
            &registry(),
        )
        .unwrap();
        assert_eq!(positive.where_clause(), "WHERE records.amount > 0");

        let negative = compose(
            &FilterCriteria::all().with_sign(SignSelector::Negative),
            &registry(),
        )
        .unwrap();
        assert_eq!(negative.where_clause(), "WHERE records.amount < 0");

        let all = compose(&FilterCriteria::all().with_sign(SignSelector::All), &registry()).unwrap();
        assert!(all.matches_all());
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("positive".parse::<SignSelector>().unwrap(), SignSelector::Positive);
        assert!(matches!(
            "Positive".parse::<SignSelector>(),
            Err(LedgerError::InvalidSelector(_))
        ));
        assert!(matches!(
            "neutral".parse::<SignSelector>(),
            Err(LedgerError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_date_bounds() {
        let both = DateRange::between(date("2024-01-01"), date("2024-01-31")).unwrap();
        let predicate = compose(&FilterCriteria::all().with_range(both), &registry()).unwrap();
        assert_eq!(
            predicate.where_clause(),
            "WHERE records.date >= ? AND records.date <= ?"
        );
        assert_eq!(
            predicate.params(),
            &[
                Value::Text("2024-01-01".to_string()),
                Value::Text("2024-01-31".to_string())
            ]
        );

        let since = compose(
            &FilterCriteria::all().with_range(DateRange::since(date("2024-02-01"))),
            &registry(),
        )
        .unwrap();
        assert_eq!(since.where_clause(), "WHERE records.date >= ?");

        let until = compose(
            &FilterCriteria::all().with_range(DateRange::until(date("2024-02-01"))),
            &registry(),
        )
        .unwrap();
        assert_eq!(until.where_clause(), "WHERE records.date <= ?");

        let open = DateRange::new(None, None).unwrap();
        let predicate = compose(&FilterCriteria::all().with_range(open), &registry()).unwrap();
        assert!(predicate.matches_all());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = DateRange::between(date("2024-02-01"), date("2024-01-01")).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRange(_)));

        // Same day is a valid single-day window
        assert!(DateRange::between(date("2024-02-01"), date("2024-02-01")).is_ok());
    }

    #[test]
    fn test_category_resolution_is_exact() {
        let predicate = compose(&FilterCriteria::all().with_category("Pleasure"), &registry()).unwrap();
        assert_eq!(predicate.where_clause(), "WHERE records.category = ?");
        assert_eq!(predicate.params(), &[Value::Integer(3)]);

        let err = compose(&FilterCriteria::all().with_category("pleasure"), &registry()).unwrap_err();
        assert!(matches!(err, LedgerError::UnknownCategory(_)));
    }

    #[test]
    fn test_empty_description_ignored() {
        let predicate = compose(&FilterCriteria::all().with_description(""), &registry()).unwrap();
        assert!(predicate.matches_all());
    }

    #[test]
    fn test_combined_parameter_order() {
        let criteria = FilterCriteria::all()
            .with_description("rent")
            .with_category("Necessity")
            .with_sign(SignSelector::Negative)
            .with_range(DateRange::since(date("2024-01-01")));

        let predicate = compose(&criteria, &registry()).unwrap();
        assert_eq!(
            predicate.where_clause(),
            "WHERE records.amount < 0 AND records.date >= ? AND records.category = ? AND instr(records.description, ?) > 0"
        );
        assert_eq!(
            predicate.params(),
            &[
                Value::Text("2024-01-01".to_string()),
                Value::Integer(2),
                Value::Text("rent".to_string()),
            ]
        );
    }
}
