//! Workflow profiler core library.
//!
//! Turns the raw monitor logs of a multi-stage workflow run into per-metric
//! CSV tables (one column per stage) and gnuplot descriptors.
//!
//! - [`grammar`]: per-metric log grammars
//! - [`collect`]: stage discovery and raw log extraction
//! - [`series`]: interval estimation, timestamp repair, resampling
//! - [`output`]: tables, CSV, and plot descriptors
//! - [`pipeline`]: the end-to-end run
//! - [`profile`]: launching a profiled workflow

pub mod cli;
pub mod collect;
pub mod exit_codes;
pub mod grammar;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod profile;
pub mod series;

pub use exit_codes::ExitCode;
pub use grammar::Metric;
pub use pipeline::{Pipeline, RunContext, RunReport};
