//! Core math modules.

pub mod rounding;
pub mod summary;
