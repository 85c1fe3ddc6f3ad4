//! Filename Pattern Module
//!
//! Wraps a compiled regular expression matched against file names.

use std::ffi::OsStr;

use regex::Regex;

use crate::error::CleanerError;

// == Pattern Matcher ==
/// A compiled filename pattern.
///
/// Matching is unanchored: `\.log` matches `app.log.1`. Use `^...$` for a
/// full-name match.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Regex,
}

impl PatternMatcher {
    /// Compiles `pattern`, naming it in the error on failure.
    pub fn new(pattern: &str) -> Result<Self, CleanerError> {
        Regex::new(pattern)
            .map(|regex| Self { regex })
            .map_err(|source| CleanerError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Returns true when the file name matches.
    pub fn is_match(&self, file_name: &OsStr) -> bool {
        self.regex.is_match(&file_name.to_string_lossy())
    }

    /// The pattern source text.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}
