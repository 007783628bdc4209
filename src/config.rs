//! Construction options for a line reader.
//!
//! Options are plain data with builder-style setters. Nothing is validated
//! or opened until a reader is built from them.

use crate::skip::SkipSpec;
use crate::streaming::buffers::DEFAULT_CHUNK_SIZE;
use crate::streaming::separator::Separator;
use std::path::{Path, PathBuf};

/// Default text encoding label.
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Options for [`LineReader::new`](crate::LineReader::new).
///
/// # Example
///
/// ```
/// use chunk_lines::{ReaderOptions, Separator, SkipSpec};
///
/// let options = ReaderOptions::new("input.txt")
///     .with_buffer_size(4096)
///     .with_line_separator(Separator::Lf)
///     .with_skip_blank(true)
///     .with_skip_numbers(vec![SkipSpec::Line(1), SkipSpec::Range(10, 20)]);
///
/// assert_eq!(options.buffer_size, 4096);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderOptions {
    /// Input file location.
    pub file_path: PathBuf,
    /// Raw bytes pulled from the source per chunk.
    pub buffer_size: usize,
    /// Encoding label (WHATWG names such as `utf-8`, `utf-16le`, `latin1`).
    pub encoding: String,
    /// Strip control and zero-width characters other than line breaks and tab.
    pub remove_invisible_unicode: bool,
    /// Fixed separator; detected from the input when `None`.
    pub line_separator: Option<Separator>,
    /// Drop lines that are empty after trimming.
    pub skip_blank: bool,
    /// Line numbers and inclusive ranges to drop.
    pub skip_numbers: Vec<SkipSpec>,
}

impl ReaderOptions {
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            buffer_size: DEFAULT_CHUNK_SIZE,
            encoding: DEFAULT_ENCODING.to_string(),
            remove_invisible_unicode: false,
            line_separator: None,
            skip_blank: false,
            skip_numbers: Vec::new(),
        }
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = label.into();
        self
    }

    pub fn with_remove_invisible_unicode(mut self, remove: bool) -> Self {
        self.remove_invisible_unicode = remove;
        self
    }

    pub fn with_line_separator(mut self, separator: Separator) -> Self {
        self.line_separator = Some(separator);
        self
    }

    pub fn with_skip_blank(mut self, skip: bool) -> Self {
        self.skip_blank = skip;
        self
    }

    pub fn with_skip_numbers(mut self, specs: Vec<SkipSpec>) -> Self {
        self.skip_numbers = specs;
        self
    }
}
