//! Welch t-test for 2 samples with unequal variances.

use anyhow::anyhow;

use statrs::distribution::{ContinuousCDF, StudentsT};

use super::{mean, sample_std};

/// Alternative hypothesis on mean(a) - mean(b)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Alternative {
    /// means differ
    TwoSided,
    /// mean of a is less than mean of b
    Less,
    /// mean of a is greater than mean of b
    Greater,
}

/// t statistic, Welch-Satterthwaite degrees of freedom and p-value
#[derive(Copy, Clone, Debug)]
pub struct TTest {
    pub statistic: f64,
    pub df: f64,
    pub p_value: f64,
}

/// Welch t-test of a against b.
pub fn welch_t_test(a: &[f64], b: &[f64], alternative: Alternative) -> anyhow::Result<TTest> {
    if a.len() < 2 || b.len() < 2 {
        return Err(anyhow!("welch_t_test needs 2 samples at least in each set, got {} and {}", a.len(), b.len()));
    }
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let mean_a = mean(a).ok_or_else(|| anyhow!("empty sample"))?;
    let mean_b = mean(b).ok_or_else(|| anyhow!("empty sample"))?;
    let va = sample_std(a).map(|s| s * s).ok_or_else(|| anyhow!("cannot compute variance"))? / na;
    let vb = sample_std(b).map(|s| s * s).ok_or_else(|| anyhow!("cannot compute variance"))? / nb;
    let se2 = va + vb;
    if !se2.is_finite() || se2 <= 0. {
        return Err(anyhow!("welch_t_test : null or undefined standard error"));
    }
    let statistic = (mean_a - mean_b) / se2.sqrt();
    let df = se2 * se2 / (va * va / (na - 1.) + vb * vb / (nb - 1.));
    let law = StudentsT::new(0., 1., df).map_err(|e| anyhow!("student law with df {} : {}", df, e))?;
    let p_value = match alternative {
        Alternative::Less => law.cdf(statistic),
        Alternative::Greater => 1. - law.cdf(statistic),
        Alternative::TwoSided => (2. * (1. - law.cdf(statistic.abs()))).min(1.),
    };
    log::debug!("welch_t_test t = {:.4}, df = {:.3}, p = {:.3e}", statistic, df, p_value);
    Ok(TTest { statistic, df, p_value })
} // end of welch_t_test

//========================================================================================

// end of mod tests
