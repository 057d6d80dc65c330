//! Reduction functions applied per group per metric.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported reductions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    #[default]
    Sum,
    Mean,
    Median,
    Max,
    Min,
    /// Rows per group, regardless of the metric value.
    Count,
}

impl Reduction {
    pub fn name(&self) -> &'static str {
        match self {
            Reduction::Sum => "sum",
            Reduction::Mean => "mean",
            Reduction::Median => "median",
            Reduction::Max => "max",
            Reduction::Min => "min",
            Reduction::Count => "count",
        }
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Reduction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sum" => Ok(Reduction::Sum),
            "mean" | "avg" | "average" => Ok(Reduction::Mean),
            "median" => Ok(Reduction::Median),
            "max" => Ok(Reduction::Max),
            "min" => Ok(Reduction::Min),
            "count" => Ok(Reduction::Count),
            _ => Err(format!(
                "Unknown reduction: {s}. Use sum, mean, median, max, min, or count."
            )),
        }
    }
}

/// Collects one group's values for one metric.
#[derive(Debug, Clone)]
pub struct Accumulator {
    reduction: Reduction,
    rows: usize,
    values: Vec<f64>,
}

impl Accumulator {
    pub fn new(reduction: Reduction) -> Self {
        Self {
            reduction,
            rows: 0,
            values: Vec::new(),
        }
    }

    /// Record one row; `None` marks a missing or non-numeric cell.
    pub fn add(&mut self, value: Option<f64>) {
        self.rows += 1;
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.values.push(v);
        }
    }

    /// Reduced value, or `None` when the group has no numeric values.
    pub fn finish(mut self) -> Option<f64> {
        if self.reduction != Reduction::Count && self.values.is_empty() {
            return None;
        }

        let n = self.values.len();
        let result = match self.reduction {
            Reduction::Sum => self.values.iter().sum::<f64>(),
            Reduction::Mean => self.values.iter().sum::<f64>() / n as f64,
            Reduction::Max => self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Reduction::Min => self.values.iter().copied().fold(f64::INFINITY, f64::min),
            Reduction::Median => {
                self.values.sort_by(f64::total_cmp);
                let mid = n / 2;
                if n % 2 == 0 {
                    (self.values[mid - 1] + self.values[mid]) / 2.0
                } else {
                    self.values[mid]
                }
            }
            Reduction::Count => self.rows as f64,
        };
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reduce(reduction: Reduction, values: &[Option<f64>]) -> Option<f64> {
        let mut acc = Accumulator::new(reduction);
        for v in values {
            acc.add(*v);
        }
        acc.finish()
    }

    #[test]
    fn test_basic_reductions() {
        let values = [Some(10.0), Some(7.0), None, Some(1.0)];
        assert_eq!(reduce(Reduction::Sum, &values), Some(18.0));
        assert_eq!(reduce(Reduction::Mean, &values), Some(6.0));
        assert_eq!(reduce(Reduction::Max, &values), Some(10.0));
        assert_eq!(reduce(Reduction::Min, &values), Some(1.0));
        assert_eq!(reduce(Reduction::Median, &values), Some(7.0));
    }

    #[test]
    fn test_median_even_group() {
        let values = [Some(4.0), Some(1.0), Some(3.0), Some(2.0)];
        assert_eq!(reduce(Reduction::Median, &values), Some(2.5));
    }

    #[test]
    fn test_count_includes_missing_cells() {
        assert_eq!(reduce(Reduction::Count, &[Some(1.0), None, None]), Some(3.0));
    }

    #[test]
    fn test_all_missing_is_missing_not_zero() {
        for reduction in [
            Reduction::Sum,
            Reduction::Mean,
            Reduction::Median,
            Reduction::Max,
            Reduction::Min,
        ] {
            assert_eq!(reduce(reduction, &[None, None]), None, "{reduction}");
        }
    }

    #[test]
    fn test_parse_reduction_names() {
        assert_eq!("AVG".parse::<Reduction>(), Ok(Reduction::Mean));
        assert_eq!("median".parse::<Reduction>(), Ok(Reduction::Median));
        assert!("mode".parse::<Reduction>().is_err());
    }
}
