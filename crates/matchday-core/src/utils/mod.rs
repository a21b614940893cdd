//! Date and label formatting helpers.

pub mod format;

pub use format::{count_label, format_match_date, format_wire_date, parse_wire_date};
