//! Output emission: tables, CSV files, and plot descriptors.

pub mod csv;
pub mod plot;
pub mod table;

pub use self::csv::{write_atomic, write_csv, RUN_STAMP_FORMAT};
pub use plot::{GnuplotRunner, PlotError, PlotMode, PlotRequest, PlotRunner};
pub use table::{Column, Table};
