//! Line-number skip filter.
//!
//! Skip input is a list of single 1-based line numbers and inclusive ranges.
//! Ranges are expanded once at construction, after which membership is a
//! single hash lookup.

use crate::reader::{ReaderError, Result};
use rustc_hash::FxHashSet;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// One element of a skip list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipSpec {
    /// A single line number.
    Line(u64),
    /// An inclusive `[start, end]` range.
    Range(u64, u64),
}

impl SkipSpec {
    fn validate(self) -> Result<RangeInclusive<u64>> {
        let (start, end) = match self {
            SkipSpec::Line(n) => (n, n),
            SkipSpec::Range(start, end) => (start, end),
        };
        if start == 0 {
            return Err(ReaderError::LineNumberOutOfRange(start));
        }
        if start > end {
            return Err(ReaderError::ReversedRange { start, end });
        }
        Ok(start..=end)
    }
}

impl From<u64> for SkipSpec {
    fn from(n: u64) -> Self {
        SkipSpec::Line(n)
    }
}

impl From<(u64, u64)> for SkipSpec {
    fn from((start, end): (u64, u64)) -> Self {
        SkipSpec::Range(start, end)
    }
}

impl From<RangeInclusive<u64>> for SkipSpec {
    fn from(range: RangeInclusive<u64>) -> Self {
        SkipSpec::Range(*range.start(), *range.end())
    }
}

impl FromStr for SkipSpec {
    type Err = ReaderError;

    /// Parse `"7"` or `"3-9"`. Not validated until the set is built.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parse = |part: &str| {
            part.trim()
                .parse::<u64>()
                .map_err(|_| ReaderError::InvalidSkipSpec(s.to_string()))
        };
        match s.split_once('-') {
            Some((start, end)) => Ok(SkipSpec::Range(parse(start)?, parse(end)?)),
            None => Ok(SkipSpec::Line(parse(s)?)),
        }
    }
}

/// Parse a comma-separated skip list such as `"1,3,5-9"`.
pub fn parse_skip_list(s: &str) -> Result<Vec<SkipSpec>> {
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect()
}

/// Resolved set of line numbers to exclude.
#[derive(Debug, Clone, Default)]
pub struct SkipSet {
    lines: FxHashSet<u64>,
}

impl SkipSet {
    /// An empty set (skips nothing).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the set, rejecting zero line numbers and reversed ranges.
    pub fn from_specs(specs: &[SkipSpec]) -> Result<Self> {
        let mut lines = FxHashSet::default();
        for spec in specs {
            lines.extend(spec.validate()?);
        }
        Ok(Self { lines })
    }

    #[inline]
    pub fn contains(&self, line: u64) -> bool {
        self.lines.contains(&line)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
