//! Difficulty calculation for vanity patterns

use crate::{Pattern, PatternType, ADDRESS_HEX_LEN};

/// Calculate the difficulty (expected number of attempts) for a hex pattern.
///
/// Case-sensitive letters are matched against the EIP-55 rendering, where each
/// letter's case is an extra coin flip.
pub fn calculate_difficulty(pattern: &Pattern) -> f64 {
    let digits = pattern.digits();
    let pattern_len = digits.len();

    let mut difficulty = 16f64.powi(pattern_len as i32);

    if pattern.pattern_type == PatternType::Contains {
        let positions = (ADDRESS_HEX_LEN as f64 - pattern_len as f64 + 1.0).max(1.0);
        difficulty /= positions;
    }

    if let Some(suffix) = pattern.suffix_digits() {
        difficulty *= 16f64.powi(suffix.len() as i32);
    }

    if !pattern.case_insensitive {
        let num_letters = digits
            .chars()
            .chain(pattern.suffix_digits().unwrap_or("").chars())
            .filter(|c| c.is_ascii_alphabetic())
            .count();
        difficulty *= 2f64.powi(num_letters as i32);
    }

    difficulty.max(1.0)
}

/// Format difficulty as human-readable string
pub fn format_difficulty(difficulty: f64) -> String {
    if difficulty >= 1e15 {
        format!("{:.2}P", difficulty / 1e15)
    } else if difficulty >= 1e12 {
        format!("{:.2}T", difficulty / 1e12)
    } else if difficulty >= 1e9 {
        format!("{:.2}G", difficulty / 1e9)
    } else if difficulty >= 1e6 {
        format!("{:.2}M", difficulty / 1e6)
    } else if difficulty >= 1e3 {
        format!("{:.2}K", difficulty / 1e3)
    } else {
        format!("{:.0}", difficulty)
    }
}

/// Estimate time to 50% probability of finding a match
pub fn estimate_time_50pct(difficulty: f64, keys_per_second: f64) -> f64 {
    // 50% probability needs about difficulty * ln(2) attempts
    if keys_per_second <= 0.0 {
        return f64::INFINITY;
    }
    (difficulty * std::f64::consts::LN_2) / keys_per_second
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() {
        "never".to_string()
    } else if seconds <= 0.0 {
        "now".to_string()
    } else if seconds < 1.0 {
        format!("{:.0}ms", seconds * 1000.0)
    } else if seconds < 60.0 {
        format!("{:.1}s", seconds)
    } else if seconds < 3600.0 {
        format!("{:.1}m", seconds / 60.0)
    } else if seconds < 86400.0 {
        format!("{:.1}h", seconds / 3600.0)
    } else if seconds < 86400.0 * 365.0 {
        format!("{:.1}d", seconds / 86400.0)
    } else {
        format!("{:.1}y", seconds / (86400.0 * 365.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_calculation() {
        assert_eq!(calculate_difficulty(&Pattern::suffix("777")), 4096.0);
        assert_eq!(calculate_difficulty(&Pattern::prefix("dead").case_insensitive()), 65536.0);
    }

    #[test]
    fn test_case_sensitive_letters_increase_difficulty() {
        let insensitive = calculate_difficulty(&Pattern::prefix("dead").case_insensitive());
        let sensitive = calculate_difficulty(&Pattern::prefix("dead"));

        assert_eq!(sensitive, insensitive * 16.0);
    }

    #[test]
    fn test_prefix_digits_ignore_0x() {
        assert_eq!(calculate_difficulty(&Pattern::prefix("0x69")), 256.0);
    }

    #[test]
    fn test_required_suffix_multiplies() {
        let both = calculate_difficulty(&Pattern::prefix("0x69").with_suffix("d777").case_insensitive());
        assert_eq!(both, 256.0 * 65536.0);

        let sensitive = calculate_difficulty(&Pattern::prefix("69").with_suffix("d777"));
        assert_eq!(sensitive, both * 2.0);
    }

    #[test]
    fn test_format_difficulty() {
        assert_eq!(format_difficulty(1000.0), "1.00K");
        assert_eq!(format_difficulty(1500000.0), "1.50M");
        assert_eq!(format_difficulty(1e12), "1.00T");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.5), "500ms");
        assert_eq!(format_duration(30.0), "30.0s");
        assert_eq!(format_duration(120.0), "2.0m");
        assert_eq!(format_duration(7200.0), "2.0h");
        assert_eq!(format_duration(f64::INFINITY), "never");
    }
}
