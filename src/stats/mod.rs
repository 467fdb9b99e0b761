//! Basic statistics on samples of runs.
//!
//! - effect size (Hedges' g) and its color band classification
//! - Shapiro-Wilk normality test
//! - Welch t-test

use num_traits::{Float, FromPrimitive};

pub mod effect;

pub mod shapiro;

pub mod welch;

/// Is a metric better when larger (accuracy) or smaller (errors)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Goal {
    Maximize,
    Minimize,
}

impl Goal {
    /// returns true if a is strictly better than b
    pub fn is_better<F: Float>(&self, a: F, b: F) -> bool {
        match self {
            Goal::Maximize => a > b,
            Goal::Minimize => a < b,
        }
    }

    /// goal deduced from metric name, errors and losses are minimized
    pub fn from_metric(metric: &str) -> Self {
        let lower = metric.to_lowercase();
        if lower.contains("error") || lower.contains("loss") {
            Goal::Minimize
        } else {
            Goal::Maximize
        }
    }
} // end of impl Goal

/// mean of values, None if empty
pub fn mean<F>(values: &[F]) -> Option<F>
where
    F: Float + FromPrimitive,
{
    if values.is_empty() {
        return None;
    }
    let sum = values.iter().fold(F::zero(), |acc, x| acc + *x);
    Some(sum / F::from_usize(values.len())?)
} // end of mean

/// standard deviation with one degree of freedom removed (ddof = 1). None if less than 2 values
pub fn sample_std<F>(values: &[F]) -> Option<F>
where
    F: Float + FromPrimitive,
{
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let s2 = values.iter().fold(F::zero(), |acc, x| acc + (*x - m) * (*x - m));
    Some((s2 / F::from_usize(values.len() - 1)?).sqrt())
} // end of sample_std

/// standard deviation normalized by the number of values (ddof = 0). None if empty
pub fn population_std<F>(values: &[F]) -> Option<F>
where
    F: Float + FromPrimitive,
{
    let m = mean(values)?;
    let s2 = values.iter().fold(F::zero(), |acc, x| acc + (*x - m) * (*x - m));
    Some((s2 / F::from_usize(values.len())?).sqrt())
}

/// rank of best value according to goal, first occurrence in case of ties. NaN values are never best.
pub fn arg_best<F: Float>(values: &[F], goal: Goal) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            None => best = Some(i),
            Some(b) if goal.is_better(*v, values[b]) => best = Some(i),
            _ => {}
        }
    }
    best
} // end of arg_best

//========================================================================================

// end of mod tests
