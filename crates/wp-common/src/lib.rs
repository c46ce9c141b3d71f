//! Workflow profiler common types and errors.
//!
//! This crate provides foundational types shared across the workspace:
//! - Timestamped and windowed sample types
//! - The unified error type and its numeric codes

pub mod error;
pub mod sample;

pub use error::{Error, Result};
pub use sample::{Sample, WindowedSample, TIME_LABEL_FORMAT};
