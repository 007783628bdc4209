//! Chunk sources: where the line reader gets its decoded text from.
//!
//! A source yields successive chunks of at most `buffer_size` raw bytes,
//! decoded to text. It tracks the total size and the bytes consumed so far,
//! and knows it is exhausted as soon as the last chunk has been handed out.

use crate::config::ReaderOptions;
use crate::reader::{ReaderError, Result};
use encoding_rs::{Decoder, Encoding, UTF_8};
use log::debug;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Interface between the line reader and whatever produces text chunks.
///
/// Contract:
/// - `next_chunk` returns `Ok(None)` only once `is_exhausted` is true.
/// - A source closes itself when it becomes exhausted.
/// - `open` on an open or exhausted source, and `close` on a closed one, do nothing.
/// - `reset` rewinds to the start and clears the consumed-bytes counter.
pub trait ChunkSource {
    /// Acquire the underlying handle.
    fn open(&mut self) -> Result<()>;

    /// Release the underlying handle.
    fn close(&mut self);

    /// Rewind to the beginning of the input.
    fn reset(&mut self) -> Result<()>;

    /// Pull the next decoded chunk.
    fn next_chunk(&mut self) -> Result<Option<String>>;

    /// Total input length in bytes. Known once the source has been opened.
    fn size(&self) -> u64;

    /// Raw bytes consumed so far.
    fn bytes_read(&self) -> u64;

    fn is_open(&self) -> bool;

    /// True after the handle was released, explicitly or by exhaustion.
    fn is_closed(&self) -> bool;

    fn is_exhausted(&self) -> bool;

    /// Location of the input, if it has one.
    fn path(&self) -> Option<&Path> {
        None
    }
}

/// Whether a character is stripped by `remove_invisible_unicode`.
///
/// Control characters other than line breaks and tab, plus the zero-width
/// format characters and the byte-order mark.
#[inline]
pub fn is_invisible(c: char) -> bool {
    match c {
        '\n' | '\r' | '\t' => false,
        '\u{00AD}'
        | '\u{061C}'
        | '\u{180E}'
        | '\u{200B}'..='\u{200F}'
        | '\u{202A}'..='\u{202E}'
        | '\u{2060}'..='\u{2064}'
        | '\u{2066}'..='\u{206F}'
        | '\u{FEFF}'
        | '\u{FFF9}'..='\u{FFFB}' => true,
        _ => c.is_control(),
    }
}

/// Streaming decoder shared by the sources.
///
/// Keeps decoder state between chunks, so a multi-byte character split
/// across two chunks decodes as one character.
struct TextDecoder {
    encoding: &'static Encoding,
    decoder: Decoder,
    remove_invisible: bool,
}

impl TextDecoder {
    fn new(encoding: &'static Encoding, remove_invisible: bool) -> Self {
        Self {
            encoding,
            decoder: encoding.new_decoder_with_bom_removal(),
            remove_invisible,
        }
    }

    fn for_label(label: &str, remove_invisible: bool) -> Result<Self> {
        let encoding = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| ReaderError::UnknownEncoding(label.to_string()))?;
        Ok(Self::new(encoding, remove_invisible))
    }

    fn decode(&mut self, bytes: &[u8], last: bool) -> String {
        let capacity = self
            .decoder
            .max_utf8_buffer_length(bytes.len())
            .unwrap_or(bytes.len() * 3 + 4);
        let mut text = String::with_capacity(capacity);
        self.decoder.decode_to_string(bytes, &mut text, last);
        if self.remove_invisible {
            text.retain(|c| !is_invisible(c));
        }
        text
    }

    fn reset(&mut self) {
        self.decoder = self.encoding.new_decoder_with_bom_removal();
    }
}

impl std::fmt::Debug for TextDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDecoder")
            .field("encoding", &self.encoding.name())
            .field("remove_invisible", &self.remove_invisible)
            .finish()
    }
}

#[derive(Debug)]
enum Handle<T> {
    Unopened,
    Open(T),
    Closed,
}

impl<T> Handle<T> {
    fn is_open(&self) -> bool {
        matches!(self, Handle::Open(_))
    }

    fn is_closed(&self) -> bool {
        matches!(self, Handle::Closed)
    }
}

/// Chunk source over a file on disk.
#[derive(Debug)]
pub struct FileChunkSource {
    path: PathBuf,
    buffer_size: usize,
    handle: Handle<File>,
    size: u64,
    bytes_read: u64,
    exhausted: bool,
    decoder: TextDecoder,
    raw: Vec<u8>,
}

impl FileChunkSource {
    /// Create a UTF-8 source. Nothing is opened yet.
    pub fn new<P: AsRef<Path>>(path: P, buffer_size: usize) -> Self {
        Self::with_decoder(path, buffer_size, TextDecoder::new(UTF_8, false))
    }

    /// Create a source using the path, chunk size and decoding settings of `options`.
    pub fn from_options(options: &ReaderOptions) -> Result<Self> {
        let decoder = TextDecoder::for_label(&options.encoding, options.remove_invisible_unicode)?;
        Ok(Self::with_decoder(
            &options.file_path,
            options.buffer_size,
            decoder,
        ))
    }

    fn with_decoder<P: AsRef<Path>>(path: P, buffer_size: usize, decoder: TextDecoder) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            buffer_size: buffer_size.max(1),
            handle: Handle::Unopened,
            size: 0,
            bytes_read: 0,
            exhausted: false,
            decoder,
            raw: Vec::new(),
        }
    }

    fn finish(&mut self) {
        self.exhausted = true;
        self.close();
    }
}

impl ChunkSource for FileChunkSource {
    fn open(&mut self) -> Result<()> {
        if self.handle.is_open() || self.exhausted {
            return Ok(());
        }

        let open_err = |source| ReaderError::Open {
            path: self.path.clone(),
            source,
        };
        let mut file = File::open(&self.path).map_err(open_err)?;
        self.size = file.metadata().map_err(open_err)?.len();
        if self.bytes_read > 0 {
            file.seek(SeekFrom::Start(self.bytes_read))?;
        }
        debug!(
            "opened {} ({} bytes, resuming at {})",
            self.path.display(),
            self.size,
            self.bytes_read
        );

        self.handle = Handle::Open(file);
        if self.bytes_read >= self.size {
            self.finish();
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.handle.is_open() {
            self.handle = Handle::Closed;
            debug!(
                "closed {} after {} of {} bytes",
                self.path.display(),
                self.bytes_read,
                self.size
            );
        }
    }

    fn reset(&mut self) -> Result<()> {
        if let Handle::Open(file) = &mut self.handle {
            file.seek(SeekFrom::Start(0))?;
        } else {
            self.handle = Handle::Unopened;
        }
        self.bytes_read = 0;
        self.exhausted = false;
        self.decoder.reset();
        Ok(())
    }

    fn next_chunk(&mut self) -> Result<Option<String>> {
        if self.exhausted {
            return Ok(None);
        }
        let Handle::Open(file) = &mut self.handle else {
            return Err(ReaderError::NotOpen);
        };

        self.raw.clear();
        let n = file
            .by_ref()
            .take(self.buffer_size as u64)
            .read_to_end(&mut self.raw)?;
        self.bytes_read += n as u64;

        // A short file (truncated since open) ends the stream early.
        let last = n == 0 || self.bytes_read >= self.size;
        let text = self.decoder.decode(&self.raw, last);
        if last {
            self.finish();
        }
        if n == 0 && text.is_empty() {
            return Ok(None);
        }
        Ok(Some(text))
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Chunk source over an in-memory byte buffer.
#[derive(Debug)]
pub struct MemoryChunkSource {
    data: Vec<u8>,
    buffer_size: usize,
    handle: Handle<()>,
    position: usize,
    exhausted: bool,
    decoder: TextDecoder,
}

impl MemoryChunkSource {
    /// Create a UTF-8 source over `data`, pulled `buffer_size` bytes at a time.
    pub fn new(data: impl Into<Vec<u8>>, buffer_size: usize) -> Self {
        Self::with_decoder(data, buffer_size, TextDecoder::new(UTF_8, false))
    }

    /// Create a source using the chunk size and decoding settings of `options`.
    /// The file path in `options` is ignored.
    pub fn from_options(data: impl Into<Vec<u8>>, options: &ReaderOptions) -> Result<Self> {
        let decoder = TextDecoder::for_label(&options.encoding, options.remove_invisible_unicode)?;
        Ok(Self::with_decoder(data, options.buffer_size, decoder))
    }

    fn with_decoder(data: impl Into<Vec<u8>>, buffer_size: usize, decoder: TextDecoder) -> Self {
        Self {
            data: data.into(),
            buffer_size: buffer_size.max(1),
            handle: Handle::Unopened,
            position: 0,
            exhausted: false,
            decoder,
        }
    }

    fn finish(&mut self) {
        self.exhausted = true;
        self.close();
    }
}

impl ChunkSource for MemoryChunkSource {
    fn open(&mut self) -> Result<()> {
        if self.handle.is_open() || self.exhausted {
            return Ok(());
        }
        self.handle = Handle::Open(());
        if self.position >= self.data.len() {
            self.finish();
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.handle.is_open() {
            self.handle = Handle::Closed;
        }
    }

    fn reset(&mut self) -> Result<()> {
        if self.handle.is_closed() {
            self.handle = Handle::Unopened;
        }
        self.position = 0;
        self.exhausted = false;
        self.decoder.reset();
        Ok(())
    }

    fn next_chunk(&mut self) -> Result<Option<String>> {
        if self.exhausted {
            return Ok(None);
        }
        if !self.handle.is_open() {
            return Err(ReaderError::NotOpen);
        }

        let end = (self.position + self.buffer_size).min(self.data.len());
        let last = end == self.data.len();
        let text = self.decoder.decode(&self.data[self.position..end], last);
        self.position = end;
        if last {
            self.finish();
        }
        Ok(Some(text))
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn bytes_read(&self) -> u64 {
        self.position as u64
    }

    fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}
