//! # Diagnostics
//!
//! Ordered, append-only list of human-readable findings. Each entry is a
//! single self-describing line that names the document (and, where it
//! applies, the service, client, or endpoint index) it refers to.

use std::fmt;

use serde::Serialize;

/// Accumulated validation findings for one document or check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    lines: Vec<String>,
}

impl Diagnostics {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finding.
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Append every finding from `other`, preserving its order.
    pub fn merge(&mut self, other: Diagnostics) {
        self.lines.extend(other.lines);
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the number of findings.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns a slice of all findings.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Count findings whose text contains `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines.iter().filter(|l| l.contains(needle)).count()
    }
}

impl Extend<String> for Diagnostics {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.lines.extend(iter);
    }
}

impl FromIterator<String> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

impl IntoIterator for Diagnostics {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.into_iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{line}")?;
        }
        Ok(())
    }
}
