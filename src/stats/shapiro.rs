//! Shapiro-Wilk normality test.
//!
//! Coefficients and p-value follow Royston's approximation (algorithm AS R94, 1995),
//! valid for sample sizes from 3 to 5000.

use anyhow::anyhow;

use statrs::distribution::{ContinuousCDF, Normal};

const SMALL_SIZE: usize = 3;
const LARGE_SIZE: usize = 5000;

// polynomial coefficients, constant term first
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

/// Result of a Shapiro-Wilk test
#[derive(Copy, Clone, Debug)]
pub struct ShapiroWilk {
    /// W statistic in (0,1], close to 1 for normal samples
    pub w: f64,
    /// probability of a W at most as large under normality
    pub p_value: f64,
}

impl ShapiroWilk {
    /// true if normality is not rejected at level
    pub fn is_normal(&self, level: f64) -> bool {
        self.p_value > level
    }
}

fn poly(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0., |acc, c| acc * x + c)
}

/// half of the antisymmetric Royston weights, largest first
fn royston_weights(n: usize, normal: &Normal) -> Vec<f64> {
    let half = n / 2;
    if n == SMALL_SIZE {
        return vec![f64::sqrt(0.5)];
    }
    let an25 = n as f64 + 0.25;
    let m: Vec<f64> = (1..=half).map(|i| normal.inverse_cdf((i as f64 - 0.375) / an25)).collect();
    let summ2 = 2. * m.iter().map(|x| x * x).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1. / (n as f64).sqrt();
    let mut a = vec![0.; half];
    a[0] = poly(&C1, rsn) - m[0] / ssumm2;
    let (first, fac) = if n > 5 {
        a[1] = poly(&C2, rsn) - m[1] / ssumm2;
        let fac = ((summ2 - 2. * m[0] * m[0] - 2. * m[1] * m[1]) / (1. - 2. * a[0] * a[0] - 2. * a[1] * a[1])).sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2. * m[0] * m[0]) / (1. - 2. * a[0] * a[0])).sqrt();
        (1, fac)
    };
    for i in first..half {
        a[i] = -m[i] / fac;
    }
    a
} // end of royston_weights

/// Shapiro-Wilk test of samples. Requires 3 to 5000 finite values, not all equal.
pub fn shapiro_wilk(samples: &[f64]) -> anyhow::Result<ShapiroWilk> {
    let n = samples.len();
    if !(SMALL_SIZE..=LARGE_SIZE).contains(&n) {
        return Err(anyhow!("shapiro_wilk needs between {} and {} samples, got {}", SMALL_SIZE, LARGE_SIZE, n));
    }
    if samples.iter().any(|x| !x.is_finite()) {
        return Err(anyhow!("shapiro_wilk : non finite sample"));
    }
    let mut sorted = samples.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    if sorted[n - 1] - sorted[0] <= 0. {
        return Err(anyhow!("shapiro_wilk : all {} samples are equal", n));
    }
    let normal = Normal::new(0., 1.).map_err(|e| anyhow!("cannot build standard normal : {}", e))?;
    let a = royston_weights(n, &normal);
    //
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let ssq: f64 = sorted.iter().map(|x| (x - mean) * (x - mean)).sum();
    let numerator: f64 = a.iter().enumerate().map(|(i, ai)| ai * (sorted[n - 1 - i] - sorted[i])).sum();
    let w = (numerator * numerator / ssq).min(1.);
    log::trace!("shapiro_wilk n = {}, w = {:.6}", n, w);
    //
    if n == SMALL_SIZE {
        let p_value = (6. / std::f64::consts::PI * ((w.sqrt()).asin() - std::f64::consts::PI / 3.)).clamp(0., 1.);
        return Ok(ShapiroWilk { w, p_value });
    }
    let w1 = 1. - w;
    if w1 <= 0. {
        return Ok(ShapiroWilk { w, p_value: 1. });
    }
    let an = n as f64;
    let mut y = w1.ln();
    let (m, s) = if n <= 11 {
        let gamma = poly(&G, an);
        if y >= gamma {
            return Ok(ShapiroWilk { w, p_value: 1.0E-99 });
        }
        y = -(gamma - y).ln();
        (poly(&C3, an), poly(&C4, an).exp())
    } else {
        let xx = an.ln();
        (poly(&C5, xx), poly(&C6, xx).exp())
    };
    let p_value = 1. - normal.cdf((y - m) / s);
    Ok(ShapiroWilk { w, p_value })
} // end of shapiro_wilk

//========================================================================================

#[cfg(test)]
mod tests {

    use super::*;

    use rand_distr::{Distribution, Exp, Normal as NormalDistr};
    use rand_xoshiro::rand_core::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn normal_quantiles_accepted() {
        log_init_test();
        let normal = Normal::new(0., 1.).unwrap();
        for n in [5, 10, 20, 50] {
            let samples: Vec<f64> = (1..=n)
                .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (n as f64 + 0.25)))
                .collect();
            let test = shapiro_wilk(&samples).unwrap();
            log::debug!("n = {} w = {:.4} p = {:.4}", n, test.w, test.p_value);
            assert!(test.w > 0.95);
            assert!(test.is_normal(0.1));
        }
    }

    #[test]
    fn skewed_rejected() {
        log_init_test();
        let samples = [1., 1., 1., 1., 1., 1., 1., 1., 1., 50.];
        let test = shapiro_wilk(&samples).unwrap();
        assert!(test.w < 0.5);
        assert!(test.p_value < 0.001);
        //
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4664397);
        let exp = Exp::<f64>::new(1.).unwrap();
        let samples: Vec<f64> = (0..200).map(|_| exp.sample(&mut rng).powi(3)).collect();
        let test = shapiro_wilk(&samples).unwrap();
        assert!(test.p_value < 0.001);
    }

    #[test]
    fn drawn_normal_mostly_accepted() {
        log_init_test();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let law = NormalDistr::new(0.75, 0.02).unwrap();
        let mut accepted = 0;
        for _ in 0..50 {
            let samples: Vec<f64> = (0..20).map(|_| law.sample(&mut rng)).collect();
            if shapiro_wilk(&samples).unwrap().is_normal(0.1) {
                accepted += 1;
            }
        }
        // about 90% expected
        assert!(accepted >= 35);
    }

    #[test]
    fn three_samples() {
        let test = shapiro_wilk(&[1., 2., 3.]).unwrap();
        assert!((test.w - 1.).abs() < 1.0E-12);
        assert!((test.p_value - 1.).abs() < 1.0E-9);
        // W minimal when 2 values are equal
        let test = shapiro_wilk(&[1., 1., 3.]).unwrap();
        assert!((test.w - 0.75).abs() < 1.0E-12);
        assert!(test.p_value < 1.0E-6);
    }

    #[test]
    fn bad_sizes() {
        assert!(shapiro_wilk(&[1., 2.]).is_err());
        assert!(shapiro_wilk(&[2., 2., 2., 2.]).is_err());
        assert!(shapiro_wilk(&[1., f64::NAN, 2.]).is_err());
    }
} // end of mod tests
