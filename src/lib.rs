//! lib target
//!
//! Synthetic graph regression datasets whose difficulty is driven by a graph distance
//! (shortest path hops or commute time) and post-hoc statistics (Hedges' g, Shapiro-Wilk, Welch)
//! over logs of repeated dropout experiments.


use env_logger::{Builder};

#[macro_use]
extern crate  lazy_static;

/// install a logger facility. To be called once by executables, tests use env_logger::builder().is_test(true)
pub fn init_log() -> u64 {
    Builder::from_default_env().init();
    println!("\n ************** initializing logger *****************\n");
    return 1;
}

pub mod graph;

pub mod io;

pub mod synthetic;

pub mod stats;

pub mod significance;

pub mod prelude;
