//! Chunked line reader.
//!
//! Reassembles logical lines from fixed-size chunks of decoded text,
//! numbers them by their position in the input and applies skip filters.
//!
//! # Features
//!
//! - **Chunk-boundary safe**: lines and `"\r\n"` pairs split across chunks
//!   are rejoined
//! - **Separator detection**: `"\r\n"`, `"\n"` or `"\r"`, found from the
//!   first chunks that contain one
//! - **Stable numbering**: skipped and blank lines still consume their number
//! - **Thread-safe**: one reader can be shared; calls are serialized
//!
//! # Example
//!
//! ```rust,no_run
//! use chunk_lines::{LineReader, ReaderOptions, SkipSpec};
//!
//! let options = ReaderOptions::new("input.txt")
//!     .with_buffer_size(16 * 1024)
//!     .with_skip_numbers(vec![SkipSpec::Line(1)]);
//! let reader = LineReader::new(options).unwrap();
//!
//! loop {
//!     let batch = reader.read_lines_with_numbers(Some(100)).unwrap();
//!     for line in &batch {
//!         println!("{}\t{}", line.number, line.text);
//!     }
//!     if batch.is_empty() && reader.is_closed() {
//!         break;
//!     }
//! }
//! ```

pub mod config;
pub mod reader;
pub mod skip;
pub mod source;
pub mod streaming;

// Re-export commonly used types
pub use config::ReaderOptions;
pub use reader::{LineReader, Lines, ReaderError, Result};
pub use skip::{parse_skip_list, SkipSet, SkipSpec};
pub use source::{ChunkSource, FileChunkSource, MemoryChunkSource};
pub use streaming::{NumberedLine, Separator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::ReaderOptions;
    pub use crate::reader::{LineReader, ReaderError};
    pub use crate::skip::SkipSpec;
    pub use crate::source::{ChunkSource, FileChunkSource, MemoryChunkSource};
    pub use crate::streaming::{NumberedLine, Separator};
}
