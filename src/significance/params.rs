//! Parameters of the aggregation of experiment results.

use std::path::{Path, PathBuf};

use anyhow::anyhow;

use crate::stats::Goal;

/// drop probabilities 0.1, 0.2, ..., 0.9
pub fn default_drop_probabilities() -> Vec<f64> {
    (1..10).map(|i| i as f64 / 10.).collect()
}

/// directory component of a drop probability : P=0.0, P=0.5
pub fn format_probability(p: f64) -> String {
    format!("P={:?}", p)
}

/// How samples are collected from a results tree and how the best treatment is chosen.
#[derive(Clone, Debug)]
pub struct AggregationParams {
    /// root of the results tree
    results_dir: PathBuf,
    /// metric name as written in logs, e.g. "Accuracy"
    metric: String,
    /// is the metric to maximize or to minimize
    goal: Goal,
    /// number of layers. Directory level L=<layers>, absent for trees without it
    layers: Option<usize>,
    /// runs with less test entries of the metric are incomplete and skipped
    min_test_entries: usize,
    /// a configuration needs at least this number of samples to have a usable mean
    min_samples: usize,
    /// the mean of a configuration is computed on at most this number of samples (the first ones)
    max_samples: usize,
    /// swept drop probabilities, in order
    drop_probabilities: Vec<f64>,
} // end of AggregationParams

impl AggregationParams {
    /// parameters used for the effect size tables : 4 layers, 300 test entries, mean on 10 to 20 samples,
    /// P in 0.1..0.9. The goal is deduced from the metric name.
    pub fn new(results_dir: &Path, metric: &str) -> Self {
        AggregationParams {
            results_dir: results_dir.to_path_buf(),
            metric: metric.to_string(),
            goal: Goal::from_metric(metric),
            layers: Some(4),
            min_test_entries: 300,
            min_samples: 10,
            max_samples: 20,
            drop_probabilities: default_drop_probabilities(),
        }
    }

    pub fn with_goal(mut self, goal: Goal) -> Self {
        self.goal = goal;
        self
    }

    pub fn with_layers(mut self, layers: Option<usize>) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_min_test_entries(mut self, min_test_entries: usize) -> Self {
        self.min_test_entries = min_test_entries;
        self
    }

    /// usable mean on min..=max first samples
    /// number of runs a configuration needs (min) and uses (max)
    pub fn with_sample_range(mut self, min_samples: usize, max_samples: usize) -> anyhow::Result<Self> {
        if min_samples > max_samples {
            log::error!("with_sample_range : min {} > max {}", min_samples, max_samples);
            return Err(anyhow!("bad sample range [{}, {}]", min_samples, max_samples));
        }
        self.min_samples = min_samples;
        self.max_samples = max_samples;
        Ok(self)
    }

    pub fn with_drop_probabilities(mut self, drop_probabilities: Vec<f64>) -> Self {
        self.drop_probabilities = drop_probabilities;
        self
    }

    pub fn get_results_dir(&self) -> &Path {
        &self.results_dir
    }

    pub fn get_metric(&self) -> &str {
        &self.metric
    }

    pub fn get_goal(&self) -> Goal {
        self.goal
    }

    pub fn get_layers(&self) -> Option<usize> {
        self.layers
    }

    pub fn get_min_test_entries(&self) -> usize {
        self.min_test_entries
    }

    pub fn get_min_samples(&self) -> usize {
        self.min_samples
    }

    pub fn get_max_samples(&self) -> usize {
        self.max_samples
    }

    pub fn get_drop_probabilities(&self) -> &[f64] {
        &self.drop_probabilities
    }

    /// directory holding the runs of a configuration
    pub fn get_config_dir(&self, dropout: &str, dataset: &str, gnn: &str, drop_p: f64) -> PathBuf {
        let mut dir = self.results_dir.join(dropout).join(dataset).join(gnn);
        if let Some(layers) = self.layers {
            dir = dir.join(format!("L={}", layers));
        }
        dir.join(format_probability(drop_p))
    }
} // end of impl AggregationParams

/// Which synthetic dataset family a sweep summarizes
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SweepKind {
    /// SyntheticZINC_SD, distances 4 to 8
    ShortestDistance,
    /// SyntheticZINC_CT, alpha 0.0 to 1.0 by 0.1
    CommuteTime,
}

impl SweepKind {
    pub fn get_dataset_name(&self) -> &'static str {
        match self {
            SweepKind::ShortestDistance => "SyntheticZINC_SD",
            SweepKind::CommuteTime => "SyntheticZINC_CT",
        }
    }

    /// directory component of a sweep value
    pub fn format_value(&self, value: f64) -> String {
        match self {
            SweepKind::ShortestDistance => format!("distance={}", value.round() as i64),
            SweepKind::CommuteTime => format!("alpha={:?}", value),
        }
    }

    pub fn default_values(&self) -> Vec<f64> {
        match self {
            SweepKind::ShortestDistance => (4..=8).map(|d| d as f64).collect(),
            SweepKind::CommuteTime => (0..=10).map(|i| i as f64 / 10.).collect(),
        }
    }
} // end of impl SweepKind

/// Summary of a synthetic dataset sweep : for each (dropout, P) a curve over distances or alphas
#[derive(Clone, Debug)]
pub struct SweepParams {
    results_dir: PathBuf,
    kind: SweepKind,
    gnn: String,
    /// metric name, default "Mean Absolute Error"
    metric: String,
    goal: Goal,
    min_test_entries: usize,
    /// pairs of dropout method and drop probability, the baseline NoDrop at 0.0 is always added first
    configs: Vec<(String, f64)>,
    /// swept distances or alphas
    values: Vec<f64>,
} // end of SweepParams

impl SweepParams {
    pub fn new(results_dir: &Path, kind: SweepKind, gnn: &str) -> Self {
        let metric = "Mean Absolute Error";
        SweepParams {
            results_dir: results_dir.to_path_buf(),
            kind,
            gnn: gnn.to_string(),
            metric: metric.to_string(),
            goal: Goal::from_metric(metric),
            min_test_entries: 500,
            configs: vec![("DropEdge".to_string(), 0.2), ("DropEdge".to_string(), 0.5)],
            values: kind.default_values(),
        }
    }

    pub fn with_metric(mut self, metric: &str) -> Self {
        self.metric = metric.to_string();
        self.goal = Goal::from_metric(metric);
        self
    }

    pub fn with_configs(mut self, configs: Vec<(String, f64)>) -> Self {
        self.configs = configs;
        self
    }

    pub fn with_values(mut self, values: Vec<f64>) -> Self {
        self.values = values;
        self
    }

    pub fn with_min_test_entries(mut self, min_test_entries: usize) -> Self {
        self.min_test_entries = min_test_entries;
        self
    }

    pub fn get_kind(&self) -> SweepKind {
        self.kind
    }

    pub fn get_gnn(&self) -> &str {
        &self.gnn
    }

    pub fn get_metric(&self) -> &str {
        &self.metric
    }

    pub fn get_goal(&self) -> Goal {
        self.goal
    }

    pub fn get_min_test_entries(&self) -> usize {
        self.min_test_entries
    }

    /// baseline first, then configured treatments
    pub fn get_configs(&self) -> Vec<(String, f64)> {
        let mut configs = vec![("NoDrop".to_string(), 0.)];
        configs.extend(self.configs.iter().filter(|(d, _)| d != "NoDrop").cloned());
        configs
    }

    pub fn get_values(&self) -> &[f64] {
        &self.values
    }

    /// directory holding the runs of one point of a curve
    pub fn get_point_dir(&self, dropout: &str, drop_p: f64, value: f64) -> PathBuf {
        self.results_dir
            .join(dropout)
            .join(self.kind.get_dataset_name())
            .join(&self.gnn)
            .join(format_probability(drop_p))
            .join(self.kind.format_value(value))
    }
} // end of impl SweepParams

//========================================================================================

// end of mod tests
