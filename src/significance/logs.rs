//! Text logs of training runs.
//!
//! A log is a sequence of lines :
//! ```text
//! Epoch 1
//!     Training:   Accuracy = 0.5, Loss = 1.2
//!     Validation: Accuracy = 0.45, Loss = 1.3
//!     Testing:    Accuracy = 0.44, Loss = 1.31
//! ```
//! An epoch marker sets the current epoch for the metric lines that follow it.
//! Lines that are neither markers nor metric lines (checkpoint messages, blank lines) are ignored.
//!
//! Next to the log a run directory holds a `config` file with two blocks of `key = value` lines
//! separated by an empty line.

use anyhow::{anyhow, Context};
use indexmap::IndexMap;

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::graph::Split;

const EPOCH_MARKER: &str = "Epoch";

/// width of the split prefix of metric lines, tabulation included
const PREFIX_WIDTH: usize = 13;

/// split label used in logs
pub fn get_split_label(split: Split) -> &'static str {
    match split {
        Split::Train => "Training",
        Split::Val => "Validation",
        Split::Test => "Testing",
    }
}

/// The metric series of one split. Each metric keeps its (epoch, value) points in log order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SplitSeries {
    metrics: IndexMap<String, Vec<(usize, f64)>>,
    /// epoch at each metric append
    epochs: Vec<usize>,
}

impl SplitSeries {
    fn push(&mut self, epoch: usize, metric: &str, value: f64) {
        self.metrics.entry(metric.to_string()).or_default().push((epoch, value));
        self.epochs.push(epoch);
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// metric names in order of first appearance
    pub fn get_metric_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(|k| k.as_str())
    }

    /// (epoch, value) points of a metric
    pub fn get_points(&self, metric: &str) -> Option<&[(usize, f64)]> {
        self.metrics.get(metric).map(|v| v.as_slice())
    }

    /// values of a metric, empty if metric never appeared
    pub fn get_values(&self, metric: &str) -> Vec<f64> {
        self.metrics
            .get(metric)
            .map(|points| points.iter().map(|(_, v)| *v).collect())
            .unwrap_or_default()
    }

    /// number of values of a metric
    pub fn get_nb_values(&self, metric: &str) -> usize {
        self.metrics.get(metric).map_or(0, |v| v.len())
    }

    /// the implicit Epoch series, one entry per appended value
    pub fn get_epochs(&self) -> &[usize] {
        &self.epochs
    }
} // end of impl SplitSeries

/// Training, validation and testing series of a run
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunMetrics {
    pub training: SplitSeries,
    pub validation: SplitSeries,
    pub testing: SplitSeries,
}

impl RunMetrics {
    pub fn get_split(&self, split: Split) -> &SplitSeries {
        match split {
            Split::Train => &self.training,
            Split::Val => &self.validation,
            Split::Test => &self.testing,
        }
    }

    fn get_split_mut(&mut self, split: Split) -> &mut SplitSeries {
        match split {
            Split::Train => &mut self.training,
            Split::Val => &mut self.validation,
            Split::Test => &mut self.testing,
        }
    }
} // end of impl RunMetrics

// returns the split and the remaining text if line is a metric line
fn split_metric_line(line: &str) -> Option<(Split, &str)> {
    Split::ALL.iter().find_map(|split| {
        line.strip_prefix(get_split_label(*split))
            .and_then(|rest| rest.strip_prefix(':'))
            .map(|rest| (*split, rest.trim()))
    })
}

fn parse_epoch_marker(line: &str, lineno: usize) -> anyhow::Result<Option<usize>> {
    if !line.split_whitespace().any(|tok| tok == EPOCH_MARKER) {
        return Ok(None);
    }
    let last = line.split_whitespace().last().unwrap_or("");
    let epoch = last
        .parse::<usize>()
        .map_err(|e| anyhow!("line {} : bad epoch number {:?} : {}", lineno, last, e))?;
    Ok(Some(epoch))
}

/// parses the text of a log
pub fn parse_metrics_str(text: &str) -> anyhow::Result<RunMetrics> {
    let mut run = RunMetrics::default();
    let mut epoch: Option<usize> = None;
    for (rank, raw) in text.lines().enumerate() {
        let lineno = rank + 1;
        let line = raw.trim();
        if let Some(split_and_rest) = split_metric_line(line) {
            let (split, rest) = split_and_rest;
            let current = epoch.ok_or_else(|| anyhow!("line {} : metric line before any epoch marker", lineno))?;
            for field in rest.split(',') {
                let (name, value) = field
                    .split_once('=')
                    .ok_or_else(|| anyhow!("line {} : missing '=' in {:?}", lineno, field))?;
                let value = value
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| anyhow!("line {} : bad value in {:?} : {}", lineno, field, e))?;
                run.get_split_mut(split).push(current, name.trim(), value);
            }
        } else if let Some(new_epoch) = parse_epoch_marker(line, lineno)? {
            epoch = Some(new_epoch);
        } else {
            log::trace!("parse_metrics_str ignoring line {}", lineno);
        }
    }
    Ok(run)
} // end of parse_metrics_str

/// parses a log file, failure concerns this file only
pub fn parse_metrics(path: &Path) -> anyhow::Result<RunMetrics> {
    let text = std::fs::read_to_string(path).with_context(|| format!("cannot read log {:?}", path))?;
    parse_metrics_str(&text).with_context(|| format!("malformed log {:?}", path))
}

/// reads the two blocks of a run config file : the main configuration and the dataset dependent others
pub fn parse_configs(path: &Path) -> anyhow::Result<(IndexMap<String, String>, IndexMap<String, String>)> {
    let file = File::open(path).with_context(|| format!("cannot open config {:?}", path))?;
    let mut lines = BufReader::new(file).lines();
    let mut blocks: [IndexMap<String, String>; 2] = [IndexMap::new(), IndexMap::new()];
    for block in blocks.iter_mut() {
        for line in lines.by_ref() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                break;
            }
            let (key, value) = line
                .split_once(" = ")
                .ok_or_else(|| anyhow!("config {:?} : bad line {:?}", path, line))?;
            block.insert(key.to_string(), value.to_string());
        }
    }
    let [config, others] = blocks;
    Ok((config, others))
} // end of parse_configs

/// Writes logs in the grammar parse_metrics reads.
pub struct MetricsLogWriter<W: Write> {
    out: W,
}

impl MetricsLogWriter<BufWriter<File>> {
    /// creates (truncates) the log file
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| {
                log::error!("MetricsLogWriter cannot open {:?}", path);
                anyhow!("cannot open log {:?} : {}", path, e)
            })?;
        Ok(MetricsLogWriter::new(BufWriter::new(file)))
    }
}

impl<W: Write> MetricsLogWriter<W> {
    pub fn new(out: W) -> Self {
        MetricsLogWriter { out }
    }

    pub fn write_epoch(&mut self, epoch: usize) -> anyhow::Result<()> {
        writeln!(self.out, "{} {}", EPOCH_MARKER, epoch)?;
        Ok(())
    }

    /// one metric line for split
    pub fn write_metrics(&mut self, split: Split, metrics: &[(&str, f64)]) -> anyhow::Result<()> {
        // a metric line without fields would not parse back
        if metrics.is_empty() {
            return Err(anyhow!("no metric to write for split {}", split));
        }
        let prefix = format!("\t{}:", get_split_label(split));
        let fields: Vec<String> = metrics.iter().map(|(name, value)| format!("{} = {}", name, value)).collect();
        writeln!(self.out, "{:<width$}{}", prefix, fields.join(", "), width = PREFIX_WIDTH)?;
        Ok(())
    }

    /// free text line, ignored by the parser as long as it does not look like a marker or a metric line
    pub fn write_note(&mut self, note: &str) -> anyhow::Result<()> {
        writeln!(self.out, "{}", note)?;
        Ok(())
    }

    pub fn flush(&mut self) -> anyhow::Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
} // end of impl MetricsLogWriter

//========================================================================================

// end of mod tests
