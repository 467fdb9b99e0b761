//! Post-hoc analysis of repeated dropout experiments.
//!
//! Training runs write per epoch metrics in text logs under a results tree
//! `<results>/<dropout>/<dataset>/<gnn>/L=<layers>/P=<p>/<run>/logs`.
//! This module parses those logs, selects one sample per run (test metric at the best validation epoch),
//! compares each dropout method at its best drop probability against the baseline without dropout
//! and renders effect sizes as LaTeX rows.

/// dropout methods naming results directories
pub mod methods;

/// aggregation parameters
pub mod params;

/// log grammar, parser and writer
pub mod logs;

/// sample collection and comparisons
pub mod aggregate;

/// LaTeX rendering
pub mod table;
