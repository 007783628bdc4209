//! The line pipeline behind [`LineReader`](crate::LineReader).
//!
//! - Separator detection over the first chunks of the input
//! - Chunk-to-line splitting with a carried fragment
//! - Numbering and skip filtering
//! - Buffered output formatting
//!
//! Each stage is usable on its own; the reader wires them together under
//! one lock.

pub mod buffers;
pub mod numbering;
pub mod output;
pub mod separator;
pub mod splitter;

pub use numbering::{LineNumberer, NumberedLine};
pub use output::LineWriter;
pub use separator::{detect_separator, Separator, SeparatorScanner};
pub use splitter::LineSplitter;
