//! Numbering and filtering of split lines.
//!
//! Every raw line consumes a number before any filter runs, so numbers always
//! reflect position in the unfiltered input.

use crate::skip::SkipSet;
use crate::streaming::separator::Separator;
use std::collections::VecDeque;

/// A line together with its 1-based position in the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumberedLine {
    pub text: String,
    pub number: u64,
}

impl NumberedLine {
    pub fn new(text: impl Into<String>, number: u64) -> Self {
        Self {
            text: text.into(),
            number,
        }
    }
}

/// Line counter plus the filters applied to each numbered line.
#[derive(Debug, Clone, Default)]
pub struct LineNumberer {
    counter: u64,
    skip: SkipSet,
    skip_blank: bool,
}

impl LineNumberer {
    pub fn new(skip: SkipSet, skip_blank: bool) -> Self {
        Self {
            counter: 0,
            skip,
            skip_blank,
        }
    }

    /// Number of raw lines seen so far, filtered or not.
    #[inline]
    pub fn lines_read(&self) -> u64 {
        self.counter
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }

    /// Split `blob` on `separator`, number each line and enqueue the ones
    /// that pass the filters. Returns how many were enqueued.
    pub fn number_into(
        &mut self,
        blob: &str,
        separator: Separator,
        queue: &mut VecDeque<NumberedLine>,
    ) -> usize {
        let before = queue.len();
        for text in blob.split(separator.as_str()) {
            self.counter += 1;
            if self.skip.contains(self.counter) {
                continue;
            }
            if self.skip_blank && text.trim().is_empty() {
                continue;
            }
            queue.push_back(NumberedLine::new(text, self.counter));
        }
        queue.len() - before
    }
}
