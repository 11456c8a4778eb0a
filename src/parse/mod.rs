// src/parse/mod.rs

pub mod date;
pub mod number;
pub mod text;

pub use date::{format_reference_month, parse_date_cell, parse_date_str};
pub use number::{parse_number, parse_percent};
pub use text::{fold, normalize_hyphen_spaces};
