//! Buffered line output.
//!
//! Line numbers are formatted with itoa to avoid allocation per line.

use crate::reader::{ReaderError, Result};
use crate::streaming::buffers::DEFAULT_OUTPUT_BUFFER;
use crate::streaming::numbering::NumberedLine;
use std::io::{BufWriter, Write};

/// Writes lines, optionally prefixed by their number and a tab.
pub struct LineWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    line_ending: &'static [u8],
}

impl<W: Write> LineWriter<W> {
    /// Create a writer with the default buffer and `\n` line endings.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_OUTPUT_BUFFER, output)
    }

    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            line_ending: b"\n",
        }
    }

    /// Terminate lines with `ending` instead of `\n`.
    pub fn with_line_ending(mut self, ending: &'static str) -> Self {
        self.line_ending = ending.as_bytes();
        self
    }

    /// Write a line followed by the line ending.
    #[inline]
    pub fn write_line(&mut self, text: &str) -> Result<()> {
        self.writer.write_all(text.as_bytes()).map_err(ReaderError::Io)?;
        self.writer
            .write_all(self.line_ending)
            .map_err(ReaderError::Io)?;
        Ok(())
    }

    /// Write `number<TAB>text` followed by the line ending.
    #[inline]
    pub fn write_numbered(&mut self, line: &NumberedLine) -> Result<()> {
        self.writer
            .write_all(self.itoa_buf.format(line.number).as_bytes())
            .map_err(ReaderError::Io)?;
        self.writer.write_all(b"\t").map_err(ReaderError::Io)?;
        self.write_line(&line.text)
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(ReaderError::Io)?;
        Ok(())
    }
}
