//! Saltmine Core Engine
//!
//! Multi-threaded CPU search for CREATE2 salts whose deployment address
//! matches a vanity pattern.

mod search;
mod stats;

pub use search::{Create2Search, SearchConfig, SearchError, SearchResult};
pub use stats::SearchStats;

// Re-exports for convenience
pub use saltmine_pattern::{calculate_difficulty, Pattern, PatternMatcher, PatternType};
