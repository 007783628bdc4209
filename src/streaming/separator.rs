//! Line separator tokens and auto-detection.
//!
//! Detection pulls chunks until one of the three separator tokens shows up.
//! Chunks consumed while detecting are handed back to the caller so they can
//! be replayed to the splitter; the source itself is never rewound.
//!
//! A `"\r\n"` pair may be torn across a chunk edge, so a trailing `'\r'` is
//! held back until the first byte of the next chunk is known. Within a single
//! chunk the precedence is `"\r\n"`, then `"\n"`, then `"\r"`.

use crate::reader::{ReaderError, Result};
use crate::source::ChunkSource;
use log::debug;
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// One of the three supported line-ending conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Separator {
    /// `"\r\n"` (Windows). Also the fallback when nothing is detected.
    #[default]
    CrLf,
    /// `"\n"` (Unix).
    Lf,
    /// `"\r"` (classic Mac OS).
    Cr,
}

impl Separator {
    /// The separator token as text.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Separator::CrLf => "\r\n",
            Separator::Lf => "\n",
            Separator::Cr => "\r",
        }
    }

    /// The separator token as bytes.
    #[inline]
    pub const fn as_bytes(self) -> &'static [u8] {
        self.as_str().as_bytes()
    }

    /// Token length in bytes (1 or 2).
    #[inline]
    pub const fn len(self) -> usize {
        self.as_str().len()
    }

    /// Always false; present for API symmetry with `len`.
    #[inline]
    pub const fn is_empty(self) -> bool {
        false
    }

    /// Short display name (`CRLF`, `LF`, `CR`).
    pub const fn name(self) -> &'static str {
        match self {
            Separator::CrLf => "CRLF",
            Separator::Lf => "LF",
            Separator::Cr => "CR",
        }
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Separator {
    type Err = ReaderError;

    /// Accepts the raw token, its escaped form (`\r\n`) or a name (`crlf`, `lf`, `cr`).
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "\r\n" | "\\r\\n" => return Ok(Separator::CrLf),
            "\n" | "\\n" => return Ok(Separator::Lf),
            "\r" | "\\r" => return Ok(Separator::Cr),
            _ => {}
        }
        match s.to_ascii_lowercase().as_str() {
            "crlf" | "windows" | "dos" => Ok(Separator::CrLf),
            "lf" | "unix" => Ok(Separator::Lf),
            "cr" | "mac" => Ok(Separator::Cr),
            _ => Err(ReaderError::InvalidSeparator(s.to_string())),
        }
    }
}

/// Incremental separator scanner.
///
/// Feed chunks in stream order; the scanner keeps one byte of lookbehind so a
/// pair split across chunks is still recognised as `"\r\n"`.
#[derive(Debug, Default)]
pub struct SeparatorScanner {
    trailing_cr: bool,
}

impl SeparatorScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the next chunk. Returns the separator decided by this chunk, if any.
    pub fn feed(&mut self, chunk: &str) -> Option<Separator> {
        let bytes = chunk.as_bytes();
        if bytes.is_empty() {
            return None;
        }

        let mut lf = false;
        let mut cr = false;
        let mut prev_cr = self.trailing_cr;

        for &b in bytes {
            match b {
                b'\n' if prev_cr => return Some(Separator::CrLf),
                b'\n' => lf = true,
                _ if prev_cr => cr = true,
                _ => {}
            }
            prev_cr = b == b'\r';
        }
        self.trailing_cr = prev_cr;

        if lf {
            Some(Separator::Lf)
        } else if cr {
            Some(Separator::Cr)
        } else {
            None
        }
    }

    /// Decide once the stream has ended without a match from `feed`.
    pub fn finish(&self) -> Separator {
        if self.trailing_cr {
            Separator::Cr
        } else {
            Separator::CrLf
        }
    }
}

/// Detect the separator of `source`.
///
/// Chunks already waiting in `replay` are scanned first. Every chunk pulled
/// from the source is appended to `replay` before it is scanned, so nothing
/// is lost when the source fails partway through detection.
pub fn detect_separator<S: ChunkSource + ?Sized>(
    source: &mut S,
    replay: &mut VecDeque<String>,
) -> Result<Separator> {
    let mut scanner = SeparatorScanner::new();

    for chunk in replay.iter() {
        if let Some(separator) = scanner.feed(chunk) {
            return Ok(separator);
        }
    }

    while !source.is_exhausted() {
        let Some(chunk) = source.next_chunk()? else {
            break;
        };
        let found = scanner.feed(&chunk);
        replay.push_back(chunk);
        if let Some(separator) = found {
            debug!(
                "detected {} separator after {} chunk(s)",
                separator,
                replay.len()
            );
            return Ok(separator);
        }
    }

    let separator = scanner.finish();
    debug!(
        "no separator before end of input, using {} after {} chunk(s)",
        separator,
        replay.len()
    );
    Ok(separator)
}
