//! Saltmine Pattern Matching Engine
//!
//! Pattern types: prefix, suffix, contains, matched against hex addresses,
//! optionally combined with a required suffix (`0x69...d777`).

mod difficulty;
mod matcher;

pub use difficulty::{calculate_difficulty, estimate_time_50pct, format_difficulty, format_duration};
pub use matcher::{Pattern, PatternError, PatternMatcher, PatternType, ADDRESS_HEX_LEN};
