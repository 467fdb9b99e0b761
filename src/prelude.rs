//! To ease access to most frequently items
//!


pub use crate::graph::{MolGraph, Split};
pub use crate::graph::distance::*;

pub use crate::io::csv::{GraphSource, CsvGraphSource, InMemorySource};

pub use crate::synthetic::sampler::*;
pub use crate::synthetic::cache::*;
pub use crate::synthetic::transform::*;
pub use crate::synthetic::dataset::*;

pub use crate::stats::*;
pub use crate::stats::effect::*;
pub use crate::stats::shapiro::*;
pub use crate::stats::welch::*;

pub use crate::significance::logs::*;
pub use crate::significance::params::*;
pub use crate::significance::methods::DropoutMethod;
pub use crate::significance::aggregate::*;
pub use crate::significance::table::*;
