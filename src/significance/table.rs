//! LaTeX rows of effect size tables.
//!
//! One block of rows per dropout method, one row per gnn, one column per dataset.
//! The cell colors `\negative` and `\positive` are to be defined in the document preamble.

use std::collections::HashMap;
use std::fmt::Write;

use anyhow::anyhow;

use crate::stats::effect::format_cell;

use super::aggregate::{ComparisonRecord, EffectSizeRecord};
use super::methods::DropoutMethod;

/// node classification datasets, in column order
pub const NODE_DATASETS: [&str; 6] = ["Cora", "CiteSeer", "PubMed", "Chameleon", "Squirrel", "TwitchDE"];

/// graph classification datasets, in column order
pub const GRAPH_DATASETS: [&str; 6] = ["Proteins", "Mutag", "Enzymes", "Reddit", "IMDb", "Collab"];

/// models, in row order
pub const GNNS: [&str; 2] = ["GCN", "GAT"];

/// column sets of the tables
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DatasetPreset {
    Node,
    Graph,
}

impl DatasetPreset {
    pub fn get_datasets(&self) -> &'static [&'static str] {
        match self {
            DatasetPreset::Node => &NODE_DATASETS,
            DatasetPreset::Graph => &GRAPH_DATASETS,
        }
    }
}

impl std::str::FromStr for DatasetPreset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "node" => Ok(DatasetPreset::Node),
            "graph" => Ok(DatasetPreset::Graph),
            _ => Err(anyhow!("dataset preset must be node or graph, got {}", s)),
        }
    }
}

/// Table rows : for each dropout a \multirow over gnns, a colored cell per dataset, blank cells for missing effects.
pub fn render_latex_rows(records: &[EffectSizeRecord], dropouts: &[DropoutMethod], gnns: &[&str], datasets: &[&str]) -> String {
    let mut cells = HashMap::<(&str, &str, &str), Option<f64>>::new();
    for record in records {
        cells.insert((record.dropout.as_str(), record.gnn.as_str(), record.dataset.as_str()), record.get_effect_size());
    }
    let separator = format!("\\hhline{{|~|{}|}}", "-".repeat(datasets.len() + 1));
    let mut out = String::new();
    for dropout in dropouts {
        let name = dropout.as_str();
        // writing in a String cannot fail
        let _ = write!(out, "\\multirow{{{}}}{{*}}{{{}}}", gnns.len(), name);
        for (rank, gnn) in gnns.iter().enumerate() {
            let row: Vec<String> = datasets
                .iter()
                .map(|dataset| format_cell(cells.get(&(name, *gnn, *dataset)).copied().flatten()))
                .collect();
            let _ = write!(out, " & {} & {} \\\\ ", gnn, row.join(" & "));
            if rank + 1 < gnns.len() {
                let _ = writeln!(out, "{}", separator);
            } else {
                let _ = writeln!(out, "\\hline");
            }
        }
    }
    out
} // end of render_latex_rows

/// plain text report of comparisons, one line each
pub fn render_comparisons(records: &[ComparisonRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let _ = match &record.outcome {
            Ok(test) => writeln!(
                out,
                "{} {} {} P={:?} : t = {:.4}, df = {:.2}, p = {:.3e}",
                record.dataset, record.gnn, record.dropout, record.best_drop_p, test.statistic, test.df, test.p_value
            ),
            Err(reason) => writeln!(out, "{} {} {} P={:?} : {}", record.dataset, record.gnn, record.dropout, record.best_drop_p, reason),
        };
    }
    out
} // end of render_comparisons

//========================================================================================

#[cfg(test)]
mod tests {

    use super::*;

    use crate::significance::aggregate::SampleSummary;
    use crate::stats::effect::hedges_g;
    use crate::stats::welch::TTest;

    fn record(dropout: &str, gnn: &str, dataset: &str, baseline: &[f64], treatment: &[f64]) -> EffectSizeRecord {
        EffectSizeRecord {
            dropout: dropout.to_string(),
            gnn: gnn.to_string(),
            dataset: dataset.to_string(),
            baseline: SampleSummary::new(baseline),
            best_drop_p: 0.2,
            treatment: SampleSummary::new(treatment),
            effect: hedges_g(baseline, treatment),
        }
    }

    #[test]
    fn rows_layout() {
        let records = vec![
            record("DropEdge", "GCN", "Cora", &[0.70, 0.72, 0.68, 0.71], &[0.80, 0.82, 0.78, 0.81, 0.79]),
            // negligible effect
            record("DropEdge", "GAT", "PubMed", &[0.70, 0.72, 0.68], &[0.70, 0.72, 0.68]),
            // degenerate, blank
            record("DropEdge", "GAT", "Cora", &[0.70, 0.70], &[0.70, 0.70]),
        ];
        let datasets = ["Cora", "PubMed"];
        let text = render_latex_rows(&records, &[DropoutMethod::DropEdge, DropoutMethod::DropNode], &GNNS, &datasets);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        let g = records[0].get_effect_size().unwrap();
        assert_eq!(
            lines[0],
            format!("\\multirow{{2}}{{*}}{{DropEdge}} & GCN & \\cellcolor{{\\positive!80}} {:+.3} &  \\\\ \\hhline{{|~|---|}}", g)
        );
        assert_eq!(lines[1], " & GAT &  & +0.000 \\\\ \\hline");
        assert_eq!(lines[2], "\\multirow{2}{*}{DropNode} & GCN &  &  \\\\ \\hhline{|~|---|}");
        assert_eq!(lines[3], " & GAT &  &  \\\\ \\hline");
    }

    #[test]
    fn presets() {
        assert_eq!("node".parse::<DatasetPreset>().unwrap().get_datasets()[0], "Cora");
        assert_eq!("Graph".parse::<DatasetPreset>().unwrap().get_datasets()[5], "Collab");
        assert!("edge".parse::<DatasetPreset>().is_err());
    }

    #[test]
    fn comparison_lines() {
        let records = vec![
            ComparisonRecord {
                dropout: "DropEdge".to_string(),
                gnn: "GCN".to_string(),
                dataset: "Cora".to_string(),
                best_drop_p: 0.5,
                outcome: Ok(TTest { statistic: -2.5, df: 30., p_value: 0.009 }),
            },
            ComparisonRecord {
                dropout: "DropNode".to_string(),
                gnn: "GCN".to_string(),
                dataset: "Cora".to_string(),
                best_drop_p: 0.1,
                outcome: Err("not normal".to_string()),
            },
        ];
        let text = render_comparisons(&records);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Cora GCN DropEdge P=0.5 : t = -2.5000, df = 30.00, p = 9.000e-3");
        assert_eq!(lines[1], "Cora GCN DropNode P=0.1 : not normal");
    }
} // end of mod tests
