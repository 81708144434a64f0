//! Turns one financial document into a read-only numeric lookup.
pub mod resolver;
pub mod table;

pub use resolver::{DocumentContext, Resolution};
pub use table::{normalize_label, parse_cell, CellValue};
