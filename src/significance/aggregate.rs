//! Aggregation of repeated runs.
//!
//! A configuration (dropout, dataset, gnn, drop probability) gives one sample per complete run :
//! the test metric at the epoch of best validation metric.
//! For each dropout method the best drop probability is the one with best mean over its first samples,
//! its samples are compared with the baseline samples (NoDrop at P=0.0).

use anyhow::{anyhow, bail};

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::stats::effect::{hedges_g, HedgesG};
use crate::stats::shapiro::shapiro_wilk;
use crate::stats::welch::{welch_t_test, Alternative, TTest};
use crate::stats::{arg_best, mean, population_std, sample_std, Goal};

use super::logs::{parse_metrics, RunMetrics};
use super::methods::DropoutMethod;
use super::params::{AggregationParams, SweepKind, SweepParams};

/// name of the log file in a run directory
pub const LOG_FILE: &str = "logs";

/// default level of the normality check preceding a t-test
pub const NORMALITY_LEVEL: f64 = 0.1;

lazy_static! {
    /// Proportion of the majority class of classification datasets.
    /// A run whose best training accuracy does not reach it has failed to learn.
    pub static ref CUTOFFS: HashMap<&'static str, Option<f64>> = {
        let mut cutoffs = HashMap::new();
        cutoffs.insert("Cora", Some(0.3021));
        cutoffs.insert("CiteSeer", Some(0.2107));
        cutoffs.insert("PubMed", None);
        cutoffs.insert("Chameleon", Some(0.2288));
        cutoffs.insert("Squirrel", Some(0.1203));
        cutoffs.insert("TwitchDE", Some(0.6045));
        cutoffs.insert("Proteins", Some(0.5957));
        cutoffs.insert("Mutag", Some(0.6649));
        cutoffs.insert("Enzymes", Some(0.1667));
        cutoffs.insert("Reddit", Some(0.5));
        cutoffs.insert("IMDb", Some(0.5));
        cutoffs.insert("Collab", Some(0.52));
        cutoffs
    };
}

/// the sample of a run : test value of metric at the first best validation value.
/// None if validation has no value of metric or test has no value at that rank.
pub fn run_sample(run: &RunMetrics, metric: &str, goal: Goal) -> Option<f64> {
    let validation = run.validation.get_values(metric);
    let best = arg_best(&validation, goal)?;
    run.testing.get_values(metric).get(best).copied()
}

// run directories of a configuration, sorted. An absent configuration has no run.
fn list_runs(config_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !config_dir.is_dir() {
        log::debug!("no configuration directory {:?}", config_dir);
        return Ok(Vec::new());
    }
    let mut runs = Vec::<PathBuf>::new();
    for entry in std::fs::read_dir(config_dir).map_err(|e| anyhow!("cannot read {:?} : {}", config_dir, e))? {
        let path = entry?.path();
        if path.is_dir() {
            runs.push(path);
        }
    }
    runs.sort();
    Ok(runs)
} // end of list_runs

// one sample per complete and parsable run
fn collect_run_samples(config_dir: &Path, metric: &str, goal: Goal, min_test_entries: usize, cutoff: Option<f64>) -> anyhow::Result<Vec<f64>> {
    let mut samples = Vec::<f64>::new();
    for run_dir in list_runs(config_dir)? {
        let run = match parse_metrics(&run_dir.join(LOG_FILE)) {
            Ok(run) => run,
            Err(e) => {
                log::warn!("skipping run {:?} : {:#}", run_dir, e);
                continue;
            }
        };
        let nb_test = run.testing.get_nb_values(metric);
        if nb_test < min_test_entries {
            log::debug!("incomplete training run {:?}, {} test entries", run_dir, nb_test);
            continue;
        }
        if let (Some(cutoff), Goal::Maximize) = (cutoff, goal) {
            let train = run.training.get_values(metric);
            if let Some(best) = arg_best(&train, goal) {
                if train[best] < cutoff {
                    log::debug!("failed to learn : {:?}, {} < {}", run_dir, train[best], cutoff);
                }
            }
        }
        match run_sample(&run, metric, goal) {
            Some(sample) => samples.push(sample),
            None => log::warn!("run {:?} has no test value at its best validation epoch", run_dir),
        }
    }
    Ok(samples)
} // end of collect_run_samples

/// samples of a configuration, in run directory order
pub fn collect_samples(params: &AggregationParams, dataset: &str, gnn: &str, dropout: &str, drop_p: f64) -> anyhow::Result<Vec<f64>> {
    let config_dir = params.get_config_dir(dropout, dataset, gnn, drop_p);
    let cutoff = CUTOFFS.get(dataset).copied().flatten();
    let samples = collect_run_samples(
        &config_dir,
        params.get_metric(),
        params.get_goal(),
        params.get_min_test_entries(),
        cutoff,
    )?;
    if samples.len() < params.get_max_samples() {
        log::warn!("{} {} {} P={} : only {} samples", dataset, gnn, dropout, drop_p, samples.len());
    }
    Ok(samples)
} // end of collect_samples

/// mean over the first max_samples samples, None with less than min_samples
pub fn usable_mean(samples: &[f64], params: &AggregationParams) -> Option<f64> {
    if samples.len() < params.get_min_samples() {
        return None;
    }
    let m = mean(&samples[..samples.len().min(params.get_max_samples())])?;
    if m.is_nan() {
        None
    } else {
        Some(m)
    }
}

/// The selected drop probability of a dropout method with all its samples
#[derive(Clone, Debug, PartialEq)]
pub struct BestTreatment {
    pub drop_p: f64,
    /// the usable mean the selection was made on
    pub mean: f64,
    pub samples: Vec<f64>,
}

/// selects among (drop_p, samples) candidates in sweep order. A later candidate must be strictly better to be selected.
pub fn select_best(candidates: Vec<(f64, Vec<f64>)>, params: &AggregationParams) -> Option<BestTreatment> {
    let goal = params.get_goal();
    let mut best: Option<BestTreatment> = None;
    for (drop_p, samples) in candidates {
        let m = match usable_mean(&samples, params) {
            Some(m) => m,
            None => continue,
        };
        let replace = match &best {
            None => true,
            Some(current) => goal.is_better(m, current.mean),
        };
        if replace {
            best = Some(BestTreatment { drop_p, mean: m, samples });
        }
    }
    best
} // end of select_best

/// best drop probability of a dropout method over the sweep of params
pub fn best_treatment(params: &AggregationParams, dataset: &str, gnn: &str, dropout: &str) -> anyhow::Result<Option<BestTreatment>> {
    let mut candidates = Vec::<(f64, Vec<f64>)>::with_capacity(params.get_drop_probabilities().len());
    for drop_p in params.get_drop_probabilities() {
        candidates.push((*drop_p, collect_samples(params, dataset, gnn, dropout, *drop_p)?));
    }
    let best = select_best(candidates, params);
    match &best {
        Some(b) => log::debug!("{} {} {} : best P={} mean {:.4} on {} samples", dataset, gnn, dropout, b.drop_p, b.mean, b.samples.len()),
        None => log::info!("{} {} {} : no configuration with a usable mean", dataset, gnn, dropout),
    }
    Ok(best)
} // end of best_treatment

/// size, mean and standard deviation (ddof 1) of a sample set
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SampleSummary {
    pub nb: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
}

impl SampleSummary {
    pub fn new(samples: &[f64]) -> Self {
        SampleSummary {
            nb: samples.len(),
            mean: mean(samples),
            std: sample_std(samples),
        }
    }
}

/// Effect of a dropout method at its best drop probability against the baseline
#[derive(Clone, Debug)]
pub struct EffectSizeRecord {
    pub dropout: String,
    pub gnn: String,
    pub dataset: String,
    pub baseline: SampleSummary,
    pub best_drop_p: f64,
    pub treatment: SampleSummary,
    /// None if a sample set is too small or degenerate
    pub effect: Option<HedgesG>,
}

impl EffectSizeRecord {
    pub fn get_effect_size(&self) -> Option<f64> {
        self.effect.map(|h| h.value)
    }
}

/// baseline samples of a (dataset, gnn) : NoDrop at drop probability 0
pub fn baseline_samples(params: &AggregationParams, dataset: &str, gnn: &str) -> anyhow::Result<Vec<f64>> {
    collect_samples(params, dataset, gnn, DropoutMethod::NoDrop.as_str(), 0.)
}

/// effect size records for all (dataset, gnn, dropout). Methods without a usable configuration have no record.
pub fn collect_effect_sizes(params: &AggregationParams, datasets: &[&str], gnns: &[&str], dropouts: &[DropoutMethod]) -> anyhow::Result<Vec<EffectSizeRecord>> {
    let mut records = Vec::<EffectSizeRecord>::new();
    for dataset in datasets {
        for gnn in gnns {
            let baseline = baseline_samples(params, dataset, gnn)?;
            let baseline_summary = SampleSummary::new(&baseline);
            for dropout in dropouts.iter().filter(|d| !d.is_baseline()) {
                let best = match best_treatment(params, dataset, gnn, dropout.as_str())? {
                    Some(best) => best,
                    None => continue,
                };
                let effect = hedges_g(&baseline, &best.samples);
                if effect.is_none() {
                    log::info!("{} {} {} : effect size undefined", dataset, gnn, dropout);
                }
                records.push(EffectSizeRecord {
                    dropout: dropout.to_string(),
                    gnn: gnn.to_string(),
                    dataset: dataset.to_string(),
                    baseline: baseline_summary,
                    best_drop_p: best.drop_p,
                    treatment: SampleSummary::new(&best.samples),
                    effect,
                });
            }
        }
    }
    log::info!("collect_effect_sizes : {} records", records.len());
    Ok(records)
} // end of collect_effect_sizes

/// Normality gated comparison : both sets must pass Shapiro-Wilk at level (p-value > level),
/// then a one sided Welch t-test of "mean of baseline is less than mean of treatment".
pub fn compare_samples(baseline: &[f64], treatment: &[f64], level: f64) -> anyhow::Result<TTest> {
    for (name, samples) in [("baseline", baseline), ("treatment", treatment)] {
        let test = shapiro_wilk(samples)?;
        if !test.is_normal(level) {
            bail!(
                "{} samples are not normal : Shapiro-Wilk w = {:.4}, p = {:.3e} <= {}",
                name,
                test.w,
                test.p_value,
                level
            );
        }
    }
    welch_t_test(baseline, treatment, Alternative::Less)
} // end of compare_samples

/// Outcome of compare_samples for a (dataset, gnn, dropout)
#[derive(Clone, Debug)]
pub struct ComparisonRecord {
    pub dropout: String,
    pub gnn: String,
    pub dataset: String,
    pub best_drop_p: f64,
    /// the test, or why it could not be made
    pub outcome: Result<TTest, String>,
}

/// compare_samples between baseline and best treatment for all (dataset, gnn, dropout)
pub fn collect_comparisons(
    params: &AggregationParams,
    datasets: &[&str],
    gnns: &[&str],
    dropouts: &[DropoutMethod],
    level: f64,
) -> anyhow::Result<Vec<ComparisonRecord>> {
    let mut records = Vec::<ComparisonRecord>::new();
    for dataset in datasets {
        for gnn in gnns {
            let baseline = baseline_samples(params, dataset, gnn)?;
            for dropout in dropouts.iter().filter(|d| !d.is_baseline()) {
                let best = match best_treatment(params, dataset, gnn, dropout.as_str())? {
                    Some(best) => best,
                    None => continue,
                };
                let outcome = compare_samples(&baseline, &best.samples, level).map_err(|e| {
                    log::warn!("{} {} {} : {}", dataset, gnn, dropout, e);
                    e.to_string()
                });
                records.push(ComparisonRecord {
                    dropout: dropout.to_string(),
                    gnn: gnn.to_string(),
                    dataset: dataset.to_string(),
                    best_drop_p: best.drop_p,
                    outcome,
                });
            }
        }
    }
    Ok(records)
} // end of collect_comparisons

/// one point of a sweep curve
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SweepPoint {
    /// distance or alpha
    pub value: f64,
    pub nb_runs: usize,
    pub mean: Option<f64>,
    /// normalized by the number of runs
    pub std: Option<f64>,
}

/// test metric of a (dropout, drop probability) along the swept distances or alphas
#[derive(Clone, Debug)]
pub struct SweepCurve {
    pub dropout: String,
    pub drop_p: f64,
    pub points: Vec<SweepPoint>,
}

/// summary of a synthetic dataset sweep, the baseline curve first
pub fn sweep_summary(params: &SweepParams) -> anyhow::Result<Vec<SweepCurve>> {
    let mut curves = Vec::<SweepCurve>::new();
    for (dropout, drop_p) in params.get_configs() {
        let mut points = Vec::<SweepPoint>::with_capacity(params.get_values().len());
        for value in params.get_values() {
            let dir = params.get_point_dir(&dropout, drop_p, *value);
            let samples = collect_run_samples(&dir, params.get_metric(), params.get_goal(), params.get_min_test_entries(), None)?;
            if samples.is_empty() {
                log::warn!("sweep : no complete run in {:?}", dir);
            }
            points.push(SweepPoint {
                value: *value,
                nb_runs: samples.len(),
                mean: mean(&samples),
                std: population_std(&samples),
            });
        }
        curves.push(SweepCurve { dropout, drop_p, points });
    }
    Ok(curves)
} // end of sweep_summary

/// one csv record per point : dropout, p, distance or alpha, runs, mean, std. Undefined statistics are empty fields.
pub fn write_sweep_csv<W: Write>(curves: &[SweepCurve], kind: SweepKind, out: W) -> anyhow::Result<()> {
    let value_name = match kind {
        SweepKind::ShortestDistance => "distance",
        SweepKind::CommuteTime => "alpha",
    };
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["dropout", "p", value_name, "runs", "mean", "std"])?;
    let fmt_opt = |v: Option<f64>| v.map(|x| format!("{:.6}", x)).unwrap_or_default();
    for curve in curves {
        for point in &curve.points {
            let value = match kind {
                SweepKind::ShortestDistance => format!("{}", point.value.round() as i64),
                SweepKind::CommuteTime => format!("{:?}", point.value),
            };
            writer.write_record([
                curve.dropout.clone(),
                format!("{:?}", curve.drop_p),
                value,
                point.nb_runs.to_string(),
                fmt_opt(point.mean),
                fmt_opt(point.std),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
} // end of write_sweep_csv

//========================================================================================

#[cfg(test)]
mod tests {

    use super::*;

    use statrs::distribution::{ContinuousCDF, Normal};

    use crate::graph::Split;
    use crate::significance::logs::MetricsLogWriter;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn test_root(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("graphdrop-aggregate-{}-{}", name, std::process::id()))
    }

    // a run whose best validation epoch is the second one, with test value sample there
    fn write_run(dir: &Path, metric: &str, nb_epochs: usize, sample: f64, best_val: f64) {
        std::fs::create_dir_all(dir).unwrap();
        let mut writer = MetricsLogWriter::create(&dir.join(LOG_FILE)).unwrap();
        for epoch in 1..=nb_epochs {
            let (val, test) = if epoch == 2 { (best_val, sample) } else { (0.05, 0.01) };
            writer.write_epoch(epoch).unwrap();
            writer.write_metrics(Split::Train, &[(metric, 0.9)]).unwrap();
            writer.write_metrics(Split::Val, &[(metric, val)]).unwrap();
            writer.write_metrics(Split::Test, &[(metric, test)]).unwrap();
        }
        writer.flush().unwrap();
    }

    fn small_params(root: &Path) -> AggregationParams {
        AggregationParams::new(root, "Accuracy")
            .with_min_test_entries(4)
            .with_sample_range(2, 3)
            .unwrap()
            .with_drop_probabilities(vec![0.1, 0.2, 0.3])
    }

    #[test]
    fn samples_of_complete_runs() {
        log_init_test();
        let root = test_root("samples");
        let params = small_params(&root);
        let dir = params.get_config_dir("NoDrop", "Cora", "GCN", 0.);
        write_run(&dir.join("run-b"), "Accuracy", 5, 0.72, 0.8);
        write_run(&dir.join("run-a"), "Accuracy", 4, 0.70, 0.8);
        // incomplete
        write_run(&dir.join("run-c"), "Accuracy", 3, 0.99, 0.8);
        // malformed
        std::fs::create_dir_all(dir.join("run-d")).unwrap();
        std::fs::write(dir.join("run-d").join(LOG_FILE), "Training: Accuracy = 0.1\n").unwrap();
        // no log
        std::fs::create_dir_all(dir.join("run-e")).unwrap();
        let samples = collect_samples(&params, "Cora", "GCN", "NoDrop", 0.).unwrap();
        assert_eq!(samples, vec![0.70, 0.72]);
        // absent configuration
        assert!(collect_samples(&params, "Cora", "GAT", "NoDrop", 0.).unwrap().is_empty());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn sample_at_first_best_validation() {
        log_init_test();
        let text = "Epoch 1\nValidation: MAE = 0.5\nTesting: MAE = 0.6\nEpoch 2\nValidation: MAE = 0.3\nTesting: MAE = 0.35\n\
                    Epoch 3\nValidation: MAE = 0.3\nTesting: MAE = 0.2\nEpoch 4\nValidation: MAE = 0.9\nTesting: MAE = 0.1\n";
        let run = crate::significance::logs::parse_metrics_str(text).unwrap();
        assert_eq!(run_sample(&run, "MAE", Goal::Minimize), Some(0.35));
        assert_eq!(run_sample(&run, "MAE", Goal::Maximize), Some(0.1));
        assert_eq!(run_sample(&run, "Accuracy", Goal::Maximize), None);
    }

    #[test]
    fn best_selection_rules() {
        log_init_test();
        let params = AggregationParams::new(Path::new("."), "Accuracy");
        let mut late_high = vec![0.6; 20];
        late_high.extend(vec![1.0; 5]);
        let candidates = vec![
            // not enough samples
            (0.1, vec![0.99; 5]),
            (0.2, vec![0.75; 12]),
            // tie keeps the first
            (0.3, vec![0.75; 15]),
            // only the first 20 count
            (0.4, late_high),
        ];
        let best = select_best(candidates, &params).unwrap();
        assert_eq!(best.drop_p, 0.2);
        assert_eq!(best.samples.len(), 12);
        assert_eq!(best.mean, 0.75);
        //
        let params = AggregationParams::new(Path::new("."), "Mean Absolute Error");
        let candidates = vec![(0.1, vec![0.5; 10]), (0.2, vec![0.4; 10]), (0.3, vec![0.45; 10])];
        assert_eq!(select_best(candidates, &params).unwrap().drop_p, 0.2);
        assert!(select_best(vec![(0.1, vec![0.5; 3])], &params).is_none());
    }

    #[test]
    fn effect_sizes_from_tree() {
        log_init_test();
        let root = test_root("effects");
        let params = small_params(&root);
        let baseline_dir = params.get_config_dir("NoDrop", "Cora", "GCN", 0.);
        for (rank, sample) in [0.70, 0.72, 0.68, 0.71].iter().enumerate() {
            write_run(&baseline_dir.join(format!("run-{}", rank)), "Accuracy", 4, *sample, 0.8);
        }
        // P=0.1 is worse than P=0.2, P=0.3 has a single run and no usable mean
        let p1 = params.get_config_dir("DropEdge", "Cora", "GCN", 0.1);
        for (rank, sample) in [0.60, 0.62, 0.61].iter().enumerate() {
            write_run(&p1.join(format!("run-{}", rank)), "Accuracy", 4, *sample, 0.8);
        }
        let p2 = params.get_config_dir("DropEdge", "Cora", "GCN", 0.2);
        for (rank, sample) in [0.80, 0.82, 0.78, 0.81, 0.79].iter().enumerate() {
            write_run(&p2.join(format!("run-{}", rank)), "Accuracy", 4, *sample, 0.8);
        }
        write_run(&params.get_config_dir("DropEdge", "Cora", "GCN", 0.3).join("run-0"), "Accuracy", 4, 0.99, 0.8);
        //
        let records = collect_effect_sizes(&params, &["Cora"], &["GCN"], &[DropoutMethod::DropEdge, DropoutMethod::DropNode]).unwrap();
        // DropNode has no run at all
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.best_drop_p, 0.2);
        assert_eq!(record.baseline.nb, 4);
        // all samples of the best configuration, not only the first 3
        assert_eq!(record.treatment.nb, 5);
        let expected = hedges_g(&[0.70, 0.72, 0.68, 0.71], &[0.80, 0.82, 0.78, 0.81, 0.79]).unwrap();
        assert!((record.get_effect_size().unwrap() - expected.value).abs() < 1.0E-12);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn comparison_requires_normality() {
        log_init_test();
        let normal = Normal::new(0., 1.).unwrap();
        let quantiles: Vec<f64> = (1..=20).map(|i| normal.inverse_cdf((i as f64 - 0.375) / 20.25)).collect();
        let baseline: Vec<f64> = quantiles.iter().map(|q| 0.70 + 0.01 * q).collect();
        let treatment: Vec<f64> = quantiles.iter().map(|q| 0.75 + 0.01 * q).collect();
        let test = compare_samples(&baseline, &treatment, NORMALITY_LEVEL).unwrap();
        assert!(test.statistic < 0.);
        assert!(test.p_value < 1.0E-6);
        // reversed roles, the one sided alternative is not supported
        let reversed = compare_samples(&treatment, &baseline, NORMALITY_LEVEL).unwrap();
        assert!(reversed.p_value > 0.99);
        // skewed treatment
        let mut skewed = vec![0.75; 19];
        skewed.push(5.);
        skewed[0] = 0.74;
        assert!(compare_samples(&baseline, &skewed, NORMALITY_LEVEL).is_err());
    }

    #[test]
    fn sweep_csv() {
        log_init_test();
        let root = test_root("sweep");
        let params = SweepParams::new(&root, SweepKind::CommuteTime, "GCN")
            .with_min_test_entries(3)
            .with_configs(vec![("DropEdge".to_string(), 0.5)])
            .with_values(vec![0.0, 0.5]);
        // errors are minimized : best validation is the lowest
        write_run(&params.get_point_dir("NoDrop", 0., 0.0).join("r0"), "Mean Absolute Error", 3, 0.2, 0.01);
        write_run(&params.get_point_dir("NoDrop", 0., 0.0).join("r1"), "Mean Absolute Error", 3, 0.4, 0.01);
        write_run(&params.get_point_dir("DropEdge", 0.5, 0.5).join("r0"), "Mean Absolute Error", 3, 0.3, 0.01);
        let curves = sweep_summary(&params).unwrap();
        assert_eq!(curves.len(), 2);
        assert_eq!(curves[0].dropout, "NoDrop");
        let first = curves[0].points[0];
        assert_eq!(first.nb_runs, 2);
        assert!((first.mean.unwrap() - 0.3).abs() < 1.0E-12);
        assert!((first.std.unwrap() - 0.1).abs() < 1.0E-12);
        assert_eq!(curves[0].points[1].nb_runs, 0);
        assert!(curves[0].points[1].mean.is_none());
        //
        let mut out = Vec::<u8>::new();
        write_sweep_csv(&curves, SweepKind::CommuteTime, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "dropout,p,alpha,runs,mean,std");
        assert_eq!(lines[1], "NoDrop,0.0,0.0,2,0.300000,0.100000");
        assert_eq!(lines[2], "NoDrop,0.0,0.5,0,,");
        assert_eq!(lines[4], "DropEdge,0.5,0.5,1,0.300000,0.000000");
        let _ = std::fs::remove_dir_all(&root);
    }
} // end of mod tests
