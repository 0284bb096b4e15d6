//! Pattern matching implementation

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of hex digits in a 20-byte address, without `0x`
pub const ADDRESS_HEX_LEN: usize = 40;

const HEX_CHARS: &str = "0123456789abcdefABCDEF";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("Pattern is empty")]
    EmptyPattern,
    #[error("Pattern contains invalid character '{0}' (valid: {1})")]
    InvalidCharacter(char, String),
    #[error("Pattern too long (max {0} characters)")]
    PatternTooLong(usize),
    #[error("Unknown pattern type '{0}' (expected prefix, suffix or contains)")]
    UnknownType(String),
}

/// Type of pattern matching
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    /// Match at start of address (after 0x)
    Prefix,
    /// Match at end of address
    #[default]
    Suffix,
    /// Match anywhere in address
    Contains,
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternType::Prefix => write!(f, "prefix"),
            PatternType::Suffix => write!(f, "suffix"),
            PatternType::Contains => write!(f, "contains"),
        }
    }
}

impl FromStr for PatternType {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prefix" => Ok(PatternType::Prefix),
            "suffix" => Ok(PatternType::Suffix),
            "contains" => Ok(PatternType::Contains),
            other => Err(PatternError::UnknownType(other.to_string())),
        }
    }
}

/// A pattern to search for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    /// The pattern string to match
    pub value: String,
    /// Type of matching
    pub pattern_type: PatternType,
    /// Case insensitive matching
    pub case_insensitive: bool,
    /// Digits the address must also end with, on top of `value`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_suffix: Option<String>,
}

impl Pattern {
    /// Create a new prefix pattern
    pub fn prefix(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            pattern_type: PatternType::Prefix,
            case_insensitive: false,
            required_suffix: None,
        }
    }

    /// Create a new suffix pattern
    pub fn suffix(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            pattern_type: PatternType::Suffix,
            case_insensitive: false,
            required_suffix: None,
        }
    }

    /// Create a new contains pattern
    pub fn contains(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            pattern_type: PatternType::Contains,
            case_insensitive: false,
            required_suffix: None,
        }
    }

    /// Make pattern case insensitive
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Also require the address to end with `suffix`, e.g. `0x69...d777`
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.required_suffix = Some(suffix.into());
        self
    }

    /// Pattern value with a leading `0x` removed (prefix patterns are often
    /// written `0x69`)
    pub fn digits(&self) -> &str {
        self.value.strip_prefix("0x").unwrap_or(&self.value)
    }

    /// Required suffix digits, if any
    pub fn suffix_digits(&self) -> Option<&str> {
        self.required_suffix.as_deref()
    }

    /// Every hex digit the pattern pins down
    fn all_digits(&self) -> impl Iterator<Item = char> + '_ {
        self.digits().chars().chain(self.suffix_digits().unwrap_or("").chars())
    }

    /// Whether matching needs the EIP-55 rendering of the address
    pub fn needs_checksum_case(&self) -> bool {
        !self.case_insensitive && self.all_digits().any(|c| c.is_ascii_alphabetic())
    }

    /// Validate pattern against the hex alphabet and address length
    pub fn validate(&self) -> Result<(), PatternError> {
        let digits = self.digits();
        if digits.is_empty() {
            return Err(PatternError::EmptyPattern);
        }

        if digits.len() > ADDRESS_HEX_LEN {
            return Err(PatternError::PatternTooLong(ADDRESS_HEX_LEN));
        }

        if let Some(suffix) = self.suffix_digits() {
            if suffix.is_empty() {
                return Err(PatternError::EmptyPattern);
            }
            // A prefix and a suffix must not overlap
            let pinned = match self.pattern_type {
                PatternType::Prefix => digits.len() + suffix.len(),
                PatternType::Suffix | PatternType::Contains => suffix.len(),
            };
            if pinned > ADDRESS_HEX_LEN {
                return Err(PatternError::PatternTooLong(ADDRESS_HEX_LEN));
            }
        }

        for c in self.all_digits() {
            if !HEX_CHARS.contains(c) {
                return Err(PatternError::InvalidCharacter(c, HEX_CHARS.to_string()));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pattern_type {
            PatternType::Prefix => write!(f, "0x{}...", self.digits())?,
            PatternType::Suffix => write!(f, "0x...{}", self.digits())?,
            PatternType::Contains => write!(f, "0x...{}...", self.digits())?,
        }
        if let Some(suffix) = self.suffix_digits() {
            match self.pattern_type {
                PatternType::Prefix => write!(f, "{}", suffix)?,
                PatternType::Suffix | PatternType::Contains => write!(f, " and 0x...{}", suffix)?,
            }
        }
        if self.case_insensitive {
            write!(f, " (case-insensitive)")?;
        }
        Ok(())
    }
}

/// Pattern matcher for checking addresses
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    patterns: Vec<Pattern>,
    /// Normalised pattern digits, lowercased where matching is case-insensitive
    needles: Vec<String>,
    /// Normalised required suffixes, same casing rule
    tails: Vec<Option<String>>,
}

impl PatternMatcher {
    /// Create a new matcher with given patterns
    pub fn new(patterns: Vec<Pattern>) -> Self {
        let normalise = |p: &Pattern, digits: &str| {
            if p.case_insensitive {
                digits.to_ascii_lowercase()
            } else {
                digits.to_string()
            }
        };
        let needles = patterns.iter().map(|p| normalise(p, p.digits())).collect();
        let tails = patterns
            .iter()
            .map(|p| p.suffix_digits().map(|s| normalise(p, s)))
            .collect();
        Self {
            patterns,
            needles,
            tails,
        }
    }

    /// Create a matcher with a single pattern
    pub fn single(pattern: Pattern) -> Self {
        Self::new(vec![pattern])
    }

    /// Whether any pattern needs the EIP-55 rendering of the address
    pub fn needs_checksum_case(&self) -> bool {
        self.patterns.iter().any(Pattern::needs_checksum_case)
    }

    /// Check if address matches any pattern.
    /// Returns the index of the matching pattern, or None.
    ///
    /// `address` may carry a `0x` prefix. Case-insensitive patterns compare
    /// against the lowercased address; case-sensitive ones compare verbatim,
    /// so callers pass the EIP-55 form when [`Self::needs_checksum_case`] holds.
    pub fn matches(&self, address: &str) -> Option<usize> {
        let addr = address.strip_prefix("0x").unwrap_or(address);
        for (i, pattern) in self.patterns.iter().enumerate() {
            let head = Self::check(addr, pattern.pattern_type, pattern.case_insensitive, &self.needles[i]);
            let tail = match &self.tails[i] {
                Some(tail) => Self::check(addr, PatternType::Suffix, pattern.case_insensitive, tail),
                None => true,
            };
            if head && tail {
                return Some(i);
            }
        }
        None
    }

    fn check(addr: &str, pattern_type: PatternType, case_insensitive: bool, needle: &str) -> bool {
        if case_insensitive {
            let addr = addr.as_bytes();
            let needle = needle.as_bytes();
            if needle.len() > addr.len() {
                return false;
            }
            match pattern_type {
                PatternType::Prefix => addr[..needle.len()].eq_ignore_ascii_case(needle),
                PatternType::Suffix => addr[addr.len() - needle.len()..].eq_ignore_ascii_case(needle),
                PatternType::Contains => addr
                    .windows(needle.len())
                    .any(|w| w.eq_ignore_ascii_case(needle)),
            }
        } else {
            match pattern_type {
                PatternType::Prefix => addr.starts_with(needle),
                PatternType::Suffix => addr.ends_with(needle),
                PatternType::Contains => addr.contains(needle),
            }
        }
    }

    /// Get all patterns
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }
}
