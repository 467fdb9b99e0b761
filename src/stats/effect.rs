//! Effect size between a baseline sample set and a treatment sample set.

use super::{mean, sample_std};

/// The standardized mean difference of treatment over baseline, with its intermediate quantities.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HedgesG {
    /// pooled standard deviation of the 2 sample sets
    pub pooled_std: f64,
    /// (mean treatment - mean baseline) / pooled_std
    pub cohens_d: f64,
    /// small sample size correction factor
    pub correction: f64,
    /// cohens_d * correction
    pub value: f64,
} // end of HedgesG

#[cfg_attr(doc, katexit::katexit)]
/// Hedges' g of treatment against baseline.
///
/// With $n_1, s_1$ the size and standard deviation (ddof 1) of baseline and $n_2, s_2$ those of treatment
/// $$ s_{pool} = \sqrt{\frac{(n_1 - 1) s_1^2 + (n_2 - 1) s_2^2}{n_1 + n_2 - 2}} $$
/// $$ d = \frac{\bar{x}_2 - \bar{x}_1}{s_{pool}} $$
/// $$ g = d \cdot (1 - \frac{3}{4 (n_1 + n_2) - 9}) $$
///
/// Returns None if a set has less than 2 values, if the pooled deviation is 0 or if a value is not finite.
pub fn hedges_g(baseline: &[f64], treatment: &[f64]) -> Option<HedgesG> {
    let (n1, n2) = (baseline.len(), treatment.len());
    if n1 < 2 || n2 < 2 {
        return None;
    }
    let (mean1, std1) = (mean(baseline)?, sample_std(baseline)?);
    let (mean2, std2) = (mean(treatment)?, sample_std(treatment)?);
    let pooled_var = ((n1 - 1) as f64 * std1 * std1 + (n2 - 1) as f64 * std2 * std2) / (n1 + n2 - 2) as f64;
    let pooled_std = pooled_var.sqrt();
    if !pooled_std.is_finite() || pooled_std <= 0. {
        log::debug!("hedges_g : degenerate pooled std {:.3e}", pooled_std);
        return None;
    }
    let cohens_d = (mean2 - mean1) / pooled_std;
    let correction = 1. - 3. / (4. * (n1 + n2) as f64 - 9.);
    let value = cohens_d * correction;
    if !value.is_finite() {
        return None;
    }
    Some(HedgesG {
        pooled_std,
        cohens_d,
        correction,
        value,
    })
} // end of hedges_g

/// formats with 3 decimals and an explicit sign : +0.123, -1.500
pub fn format_effect_size(value: f64) -> String {
    format!("{:+.3}", value)
}

/// Classification of an effect size in bands [-inf, -0.65), [-0.65, -0.35), [-0.35, -0.10), [-0.10, 0.10),
/// [0.10, 0.35), [0.35, 0.65), [0.65, +inf)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColorBand {
    StrongNegative,
    ModerateNegative,
    WeakNegative,
    Negligible,
    WeakPositive,
    ModeratePositive,
    StrongPositive,
}

impl ColorBand {
    pub fn from_effect_size(value: f64) -> Self {
        if value < -0.65 {
            ColorBand::StrongNegative
        } else if value < -0.35 {
            ColorBand::ModerateNegative
        } else if value < -0.10 {
            ColorBand::WeakNegative
        } else if value < 0.10 {
            ColorBand::Negligible
        } else if value < 0.35 {
            ColorBand::WeakPositive
        } else if value < 0.65 {
            ColorBand::ModeratePositive
        } else {
            ColorBand::StrongPositive
        }
    } // end of from_effect_size

    /// latex cell color command, empty for negligible effects
    pub fn get_latex_color(&self) -> &'static str {
        match self {
            ColorBand::StrongNegative => "\\cellcolor{\\negative!80}",
            ColorBand::ModerateNegative => "\\cellcolor{\\negative!50}",
            ColorBand::WeakNegative => "\\cellcolor{\\negative!20}",
            ColorBand::Negligible => "",
            ColorBand::WeakPositive => "\\cellcolor{\\positive!20}",
            ColorBand::ModeratePositive => "\\cellcolor{\\positive!50}",
            ColorBand::StrongPositive => "\\cellcolor{\\positive!80}",
        }
    }
} // end of impl ColorBand

/// a table cell : color band of the printed (rounded) value followed by the value, empty if no effect size
pub fn format_cell(effect: Option<f64>) -> String {
    match effect {
        None => String::new(),
        Some(value) => {
            let printed = format_effect_size(value);
            // classify what is printed so that color and figure agree
            let rounded: f64 = printed.parse().unwrap_or(value);
            let color = ColorBand::from_effect_size(rounded).get_latex_color();
            if color.is_empty() {
                printed
            } else {
                format!("{} {}", color, printed)
            }
        }
    }
} // end of format_cell

//========================================================================================

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn worked_example() {
        let baseline = [0.70, 0.72, 0.68, 0.71];
        let treatment = [0.80, 0.82, 0.78, 0.81, 0.79];
        // by hand : means 0.7025 and 0.80, sums of squared deviations 8.75e-4 and 1.0e-3
        let pooled_var = (8.75e-4 + 1.0e-3) / 7.;
        let pooled_std = f64::sqrt(pooled_var);
        let d = (0.80 - 0.7025) / pooled_std;
        let g = d * (1. - 3. / 27.);
        let got = hedges_g(&baseline, &treatment).unwrap();
        assert!((got.pooled_std - pooled_std).abs() < 1.0E-6);
        assert!((got.cohens_d - d).abs() < 1.0E-6);
        assert!((got.correction - 24. / 27.).abs() < 1.0E-12);
        assert!((got.value - g).abs() < 1.0E-6);
        assert!(got.value > 5.2 && got.value < 5.4);
    }

    #[test]
    fn degenerate_sets() {
        assert!(hedges_g(&[0.5], &[0.6, 0.7]).is_none());
        assert!(hedges_g(&[0.5, 0.5], &[0.6, 0.6]).is_none());
        assert!(hedges_g(&[0.5, f64::NAN], &[0.6, 0.7]).is_none());
    }

    #[test]
    fn bands_boundaries() {
        assert_eq!(ColorBand::from_effect_size(0.10), ColorBand::WeakPositive);
        assert_eq!(ColorBand::from_effect_size(0.0999), ColorBand::Negligible);
        assert_eq!(ColorBand::from_effect_size(-0.10), ColorBand::Negligible);
        assert_eq!(ColorBand::from_effect_size(-0.1001), ColorBand::WeakNegative);
        assert_eq!(ColorBand::from_effect_size(-0.35), ColorBand::WeakNegative);
        assert_eq!(ColorBand::from_effect_size(-0.65), ColorBand::ModerateNegative);
        assert_eq!(ColorBand::from_effect_size(-0.66), ColorBand::StrongNegative);
        assert_eq!(ColorBand::from_effect_size(0.35), ColorBand::ModeratePositive);
        assert_eq!(ColorBand::from_effect_size(0.65), ColorBand::StrongPositive);
    }

    #[test]
    fn formatting() {
        assert_eq!(format_effect_size(0.1234), "+0.123");
        assert_eq!(format_effect_size(-1.5), "-1.500");
        assert_eq!(format_effect_size(0.), "+0.000");
        assert_eq!(format_cell(None), "");
        assert_eq!(format_cell(Some(0.05)), "+0.050");
        assert_eq!(format_cell(Some(0.8)), "\\cellcolor{\\positive!80} +0.800");
        // 0.0996 is printed +0.100 and colored as such
        assert_eq!(format_cell(Some(0.0996)), "\\cellcolor{\\positive!20} +0.100");
    }
} // end of mod tests
