//! Collection of raw monitor logs from a run directory.
//!
//! - `discover`: bind workflow stages to their directories
//! - `extract`: find, optionally decode, and read one metric's log

pub mod discover;
pub mod extract;

pub use discover::{discover_stages, process_name, StageDir};
pub use extract::{find_log_file, LogDecoder, RawSeriesExtractor, SarDecoder};
