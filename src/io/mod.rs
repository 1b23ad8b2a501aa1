//! Tabular input and CSV export.

pub mod export;
pub mod table;

pub use table::Table;
