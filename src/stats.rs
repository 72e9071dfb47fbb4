// 📊 Series Statistics - exact descriptive statistics over in-memory values
//
// Every function returns None for an empty input. Variance is the population
// variance (divisor N).

use serde::Serialize;

use crate::series::FlowEntry;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance, never negative
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let squared: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((squared / values.len() as f64).max(0.0))
}

pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    population_variance(values).map(|variance| variance.max(0.0).sqrt())
}

/// Exact median: middle value for odd counts, mean of the two central values
/// for even counts
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

/// Second-order summary of a flow series (one value per period)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub mean: Option<f64>,
    pub variance: Option<f64>,
    pub std_dev: Option<f64>,
    pub median: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
}

impl SeriesSummary {
    pub fn of<P>(series: &[FlowEntry<P>]) -> Self {
        let totals: Vec<f64> = series.iter().map(|entry| entry.total).collect();
        SeriesSummary {
            mean: mean(&totals),
            variance: population_variance(&totals),
            std_dev: population_std_dev(&totals),
            median: median(&totals),
            max: max(&totals),
            min: min(&totals),
        }
    }
}
