//! Chunked line reader.
//!
//! Pulls decoded chunks from a [`ChunkSource`], reassembles lines across
//! chunk edges, numbers them by raw position and applies skip filters.
//! Lines are served from an internal queue in ascending number order.
//!
//! All state sits behind one mutex. Each public call holds it for its whole
//! duration (fetch, split, number, filter, drain), so calls from several
//! threads see a single line stream and never interleave. The lock does not
//! poison and is released on every exit path, including errors.

use crate::config::ReaderOptions;
use crate::skip::SkipSet;
use crate::source::{ChunkSource, FileChunkSource};
use crate::streaming::numbering::{LineNumberer, NumberedLine};
use crate::streaming::separator::{detect_separator, Separator};
use crate::streaming::splitter::LineSplitter;
use log::{debug, trace};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while configuring or reading.
#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("Source is not open")]
    NotOpen,

    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    #[error("Invalid line separator: {0:?}")]
    InvalidSeparator(String),

    #[error("Invalid skip range {start}-{end}: start is greater than end")]
    ReversedRange { start: u64, end: u64 },

    #[error("Invalid line number {0}: line numbers start at 1")]
    LineNumberOutOfRange(u64),

    #[error("Invalid skip specification: '{0}'")]
    InvalidSkipSpec(String),

    #[error("Invalid buffer size: must be at least 1 byte")]
    InvalidBufferSize,
}

pub type Result<T> = std::result::Result<T, ReaderError>;

/// Everything guarded by the reader's lock.
#[derive(Debug)]
struct ReaderState<S> {
    source: S,
    declared: Option<Separator>,
    separator: Option<Separator>,
    splitter: LineSplitter,
    numberer: LineNumberer,
    queue: VecDeque<NumberedLine>,
}

impl<S: ChunkSource> ReaderState<S> {
    fn ensure_open(&mut self) -> Result<()> {
        if !self.source.is_open() && !self.source.is_exhausted() {
            self.source.open()?;
        }
        Ok(())
    }

    /// More input may still produce lines.
    #[inline]
    fn has_input(&self) -> bool {
        !self.source.is_exhausted() || self.splitter.has_pending()
    }

    /// Nothing queued and nothing left to read.
    #[inline]
    fn is_drained(&self) -> bool {
        self.queue.is_empty() && !self.has_input()
    }

    fn is_closed(&self) -> bool {
        self.source.is_closed() && self.queue.is_empty() && !self.splitter.has_pending()
    }

    fn separator(&mut self) -> Result<Separator> {
        if let Some(separator) = self.separator {
            return Ok(separator);
        }
        let separator = detect_separator(&mut self.source, self.splitter.replay_mut())?;
        self.separator = Some(separator);
        Ok(separator)
    }

    /// Pull one blob, number it and queue what passes the filters.
    fn fetch(&mut self) -> Result<()> {
        let separator = self.separator()?;
        if let Some(blob) = self.splitter.next_blob(&mut self.source, separator)? {
            let queued = self.numberer.number_into(&blob, separator, &mut self.queue);
            trace!(
                "fetched {} bytes: {} line(s) queued, {} read, {}/{} bytes consumed",
                blob.len(),
                queued,
                self.numberer.lines_read(),
                self.source.bytes_read(),
                self.source.size()
            );
        }
        Ok(())
    }

    fn read_batch(&mut self, limit: Option<usize>) -> Result<Vec<NumberedLine>> {
        self.ensure_open()?;
        if self.source.size() == 0 {
            return Ok(Vec::new());
        }

        let short = limit.map_or(true, |n| self.queue.len() < n);
        if short && self.has_input() {
            self.fetch()?;
        }

        let take = limit.map_or(self.queue.len(), |n| n.min(self.queue.len()));
        Ok(self.queue.drain(..take).collect())
    }

    fn read_one(&mut self) -> Result<Option<NumberedLine>> {
        loop {
            if let Some(line) = self.read_batch(Some(1))?.pop() {
                return Ok(Some(line));
            }
            if self.source.size() == 0 || self.is_drained() {
                return Ok(None);
            }
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.queue.clear();
        self.splitter.clear();
        self.separator = self.declared;
        self.numberer.reset();
        self.source.reset()
    }
}

/// Line reader over a chunk source.
///
/// `LineReader` is `Sync` when its source is `Send`, so one reader can be
/// shared between threads (for example behind an `Arc`); calls are
/// serialized.
///
/// # Example
///
/// ```rust,no_run
/// use chunk_lines::{LineReader, ReaderOptions};
///
/// let reader = LineReader::new(ReaderOptions::new("input.txt").with_skip_blank(true))?;
/// while let Some(line) = reader.read_line_with_number()? {
///     println!("{}: {}", line.number, line.text);
/// }
/// # Ok::<(), chunk_lines::ReaderError>(())
/// ```
#[derive(Debug)]
pub struct LineReader<S = FileChunkSource> {
    path: Option<PathBuf>,
    state: Mutex<ReaderState<S>>,
}

impl LineReader<FileChunkSource> {
    /// Create a file reader. The file is opened lazily, on the first read or
    /// an explicit [`open`](Self::open).
    pub fn new(options: ReaderOptions) -> Result<Self> {
        if options.buffer_size == 0 {
            return Err(ReaderError::InvalidBufferSize);
        }
        let source = FileChunkSource::from_options(&options)?;
        Self::with_source(source, &options)
    }

    /// Create a file reader with default options.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(ReaderOptions::new(path))
    }
}

impl<S: ChunkSource> LineReader<S> {
    /// Create a reader over any source. Only the line-level fields of
    /// `options` are used (separator, blank skipping, skip numbers).
    pub fn with_source(source: S, options: &ReaderOptions) -> Result<Self> {
        let skip = SkipSet::from_specs(&options.skip_numbers)?;
        debug!(
            "line reader: separator {}, skip_blank {}, {} skipped line number(s)",
            options
                .line_separator
                .map_or("auto-detect", Separator::name),
            options.skip_blank,
            skip.len()
        );
        Ok(Self {
            path: source.path().map(Path::to_path_buf),
            state: Mutex::new(ReaderState {
                source,
                declared: options.line_separator,
                separator: options.line_separator,
                splitter: LineSplitter::new(),
                numberer: LineNumberer::new(skip, options.skip_blank),
                queue: VecDeque::new(),
            }),
        })
    }

    /// Read up to `limit` lines (all available when `None`) with their numbers.
    ///
    /// Pulls at most one more blob of lines from the source, and only when
    /// the queue holds fewer than `limit` lines. An empty result does not
    /// mean the input is finished: every line of a blob may have been
    /// filtered out. Use [`is_closed`](Self::is_closed) or the single-line
    /// variants to detect the end.
    pub fn read_lines_with_numbers(&self, limit: Option<usize>) -> Result<Vec<NumberedLine>> {
        self.state.lock().read_batch(limit)
    }

    /// Like [`read_lines_with_numbers`](Self::read_lines_with_numbers), text only.
    pub fn read_lines(&self, limit: Option<usize>) -> Result<Vec<String>> {
        Ok(self
            .read_lines_with_numbers(limit)?
            .into_iter()
            .map(|line| line.text)
            .collect())
    }

    /// Next line that passes the filters, or `None` at end of input.
    pub fn read_line_with_number(&self) -> Result<Option<NumberedLine>> {
        self.state.lock().read_one()
    }

    /// Like [`read_line_with_number`](Self::read_line_with_number), text only.
    pub fn read_line(&self) -> Result<Option<String>> {
        Ok(self.read_line_with_number()?.map(|line| line.text))
    }

    /// Iterate over the remaining lines.
    pub fn lines(&self) -> Lines<'_, S> {
        Lines { reader: self }
    }

    /// Forget all progress and rewind the source; the next read starts over.
    pub fn reset(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.reset()?;
        debug!("reader reset");
        Ok(())
    }

    /// Open the source. No-op when already open.
    pub fn open(&self) -> Result<()> {
        self.state.lock().source.open()
    }

    /// Close the source. Queued lines remain readable. No-op when already closed.
    pub fn close(&self) {
        self.state.lock().source.close();
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Total input size in bytes (known once opened).
    pub fn size(&self) -> u64 {
        self.state.lock().source.size()
    }

    /// Declared or detected separator; `None` before detection.
    pub fn separator(&self) -> Option<Separator> {
        self.state.lock().separator
    }

    /// Raw lines consumed so far, including filtered ones.
    pub fn lines_read(&self) -> u64 {
        self.state.lock().numberer.lines_read()
    }

    pub fn bytes_read(&self) -> u64 {
        self.state.lock().source.bytes_read()
    }

    pub fn is_opened(&self) -> bool {
        self.state.lock().source.is_open()
    }

    /// True once the source is closed and no queued or partial lines remain.
    pub fn is_closed(&self) -> bool {
        self.state.lock().is_closed()
    }

    /// Consume the reader and return its source.
    pub fn into_source(self) -> S {
        self.state.into_inner().source
    }
}

/// Iterator over the remaining lines of a [`LineReader`].
pub struct Lines<'a, S> {
    reader: &'a LineReader<S>,
}

impl<S: ChunkSource> Iterator for Lines<'_, S> {
    type Item = Result<NumberedLine>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_line_with_number() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skip::SkipSpec;
    use crate::source::MemoryChunkSource;
    use std::sync::Arc;

    const SAMPLE: &str = "1111\n2222\n3333\n4444\n5555\n\n7777";

    fn memory_reader(
        content: &str,
        chunk_size: usize,
        options: &ReaderOptions,
    ) -> LineReader<MemoryChunkSource> {
        LineReader::with_source(MemoryChunkSource::new(content, chunk_size), options).unwrap()
    }

    fn options() -> ReaderOptions {
        ReaderOptions::new("memory")
    }

    /// Fails once on the given pull, then behaves like the wrapped source.
    struct FlakySource {
        inner: MemoryChunkSource,
        pulls: usize,
        fail_on: usize,
    }

    impl ChunkSource for FlakySource {
        fn open(&mut self) -> Result<()> {
            self.inner.open()
        }
        fn close(&mut self) {
            self.inner.close()
        }
        fn reset(&mut self) -> Result<()> {
            self.inner.reset()
        }
        fn next_chunk(&mut self) -> Result<Option<String>> {
            self.pulls += 1;
            if self.pulls == self.fail_on {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "flaky").into());
            }
            self.inner.next_chunk()
        }
        fn size(&self) -> u64 {
            self.inner.size()
        }
        fn bytes_read(&self) -> u64 {
            self.inner.bytes_read()
        }
        fn is_open(&self) -> bool {
            self.inner.is_open()
        }
        fn is_closed(&self) -> bool {
            self.inner.is_closed()
        }
        fn is_exhausted(&self) -> bool {
            self.inner.is_exhausted()
        }
    }

    #[test]
    fn test_batches_follow_chunks() {
        let reader = memory_reader(SAMPLE, 10, &options());
        assert_eq!(reader.read_lines(None).unwrap(), vec!["1111", "2222"]);
        assert_eq!(reader.read_lines(None).unwrap(), vec!["3333", "4444"]);
        assert_eq!(reader.read_lines(None).unwrap(), vec!["5555", "", "7777"]);
        assert!(reader.read_lines(None).unwrap().is_empty());
        assert!(reader.is_closed());
        assert_eq!(reader.lines_read(), 7);
        assert_eq!(reader.bytes_read(), 30);
    }

    #[test]
    fn test_skip_numbers_scenario() {
        let opts = options().with_skip_numbers(vec![
            SkipSpec::Line(1),
            SkipSpec::Line(3),
            SkipSpec::Line(5),
        ]);
        let reader = memory_reader(SAMPLE, 10, &opts);
        let mut all = Vec::new();
        while !reader.is_closed() {
            all.extend(reader.read_lines_with_numbers(None).unwrap());
        }
        let texts: Vec<_> = all.iter().map(|l| l.text.as_str()).collect();
        let numbers: Vec<_> = all.iter().map(|l| l.number).collect();
        assert_eq!(texts, vec!["2222", "4444", "", "7777"]);
        assert_eq!(numbers, vec![2, 4, 6, 7]);
    }

    #[test]
    fn test_limit_leaves_rest_queued() {
        let reader = memory_reader(SAMPLE, 64, &options());
        assert_eq!(reader.read_lines(Some(2)).unwrap(), vec!["1111", "2222"]);
        // Queue already holds enough, no fetch needed
        assert_eq!(reader.read_lines(Some(2)).unwrap(), vec!["3333", "4444"]);
        assert_eq!(reader.read_lines(Some(10)).unwrap(), vec!["5555", "", "7777"]);
        assert_eq!(reader.read_lines(Some(0)).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_read_line_skips_fully_filtered_blobs() {
        // Every line of the first two blobs is skipped
        let opts = options().with_skip_numbers(vec![SkipSpec::Range(1, 4)]);
        let reader = memory_reader(SAMPLE, 10, &opts);
        assert_eq!(
            reader.read_line_with_number().unwrap(),
            Some(NumberedLine::new("5555", 5))
        );
        assert_eq!(reader.read_line().unwrap().as_deref(), Some(""));
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("7777"));
        assert_eq!(reader.read_line().unwrap(), None);
        assert_eq!(reader.read_line().unwrap(), None);
    }

    #[test]
    fn test_exhaustive_skip() {
        let opts = options().with_skip_numbers(vec![SkipSpec::Range(1, 7)]);
        let reader = memory_reader(SAMPLE, 10, &opts);
        assert_eq!(reader.read_line().unwrap(), None);
        assert!(reader.is_closed());
        assert_eq!(reader.lines_read(), 7);
    }

    #[test]
    fn test_skip_blank() {
        let opts = options().with_skip_blank(true);
        let reader = memory_reader("a\n \n\nb\n", 3, &opts);
        let numbers: Vec<u64> = reader.lines().map(|l| l.unwrap().number).collect();
        assert_eq!(numbers, vec![1, 4]);
    }

    #[test]
    fn test_empty_input() {
        let reader = memory_reader("", 10, &options());
        assert!(reader.read_lines(None).unwrap().is_empty());
        assert_eq!(reader.read_line().unwrap(), None);
        assert!(reader.is_closed());
        assert_eq!(reader.lines_read(), 0);
    }

    #[test]
    fn test_detects_separator_lazily() {
        let reader = memory_reader("a\r\nb\r\nc", 2, &options());
        assert_eq!(reader.separator(), None);
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("a"));
        assert_eq!(reader.separator(), Some(Separator::CrLf));
        let rest: Vec<String> = reader.lines().map(|l| l.unwrap().text).collect();
        assert_eq!(rest, vec!["b", "c"]);
    }

    #[test]
    fn test_declared_separator() {
        let opts = options().with_line_separator(Separator::Cr);
        let reader = memory_reader("a\rb\nc\rd", 3, &opts);
        assert_eq!(reader.separator(), Some(Separator::Cr));
        let all: Vec<String> = reader.lines().map(|l| l.unwrap().text).collect();
        assert_eq!(all, vec!["a", "b\nc", "d"]);
    }

    #[test]
    fn test_reset_replays_input() {
        let reader = memory_reader(SAMPLE, 4, &options());
        let first: Vec<NumberedLine> = reader.lines().collect::<Result<_>>().unwrap();
        reader.reset().unwrap();
        assert_eq!(reader.lines_read(), 0);
        assert_eq!(reader.separator(), None);
        assert!(!reader.is_closed());
        let second: Vec<NumberedLine> = reader.lines().collect::<Result<_>>().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 7);
    }

    #[test]
    fn test_reset_mid_stream() {
        let reader = memory_reader(SAMPLE, 10, &options());
        reader.read_lines(None).unwrap();
        reader.reset().unwrap();
        assert_eq!(reader.bytes_read(), 0);
        assert_eq!(reader.read_lines(None).unwrap(), vec!["1111", "2222"]);
    }

    #[test]
    fn test_open_close_are_idempotent() {
        let reader = memory_reader(SAMPLE, 10, &options());
        assert!(!reader.is_opened());
        reader.open().unwrap();
        reader.open().unwrap();
        assert!(reader.is_opened());
        reader.close();
        reader.close();
        assert!(!reader.is_opened());
    }

    #[test]
    fn test_close_keeps_queued_lines() {
        let reader = memory_reader(SAMPLE, 64, &options());
        assert_eq!(reader.read_lines(Some(1)).unwrap(), vec!["1111"]);
        reader.close();
        assert!(!reader.is_closed());
        assert_eq!(reader.read_lines(None).unwrap().len(), 6);
        assert!(reader.is_closed());
    }

    #[test]
    fn test_failed_fetch_keeps_state() {
        let source = FlakySource {
            inner: MemoryChunkSource::new("ab\ncd\nef", 2),
            pulls: 0,
            fail_on: 3,
        };
        let reader = LineReader::with_source(source, &options()).unwrap();
        // Detection pulls "ab", "\nc"; the next pull fails
        assert_eq!(reader.read_lines(None).unwrap(), vec!["ab"]);
        assert!(reader.read_lines(None).is_err());
        assert_eq!(reader.lines_read(), 1);
        // Gate released and the carried fragment intact
        let rest: Vec<NumberedLine> = reader.lines().collect::<Result<_>>().unwrap();
        assert_eq!(
            rest,
            vec![NumberedLine::new("cd", 2), NumberedLine::new("ef", 3)]
        );
    }

    #[test]
    fn test_failed_detection_is_retried() {
        let source = FlakySource {
            inner: MemoryChunkSource::new("abcd\nef", 2),
            pulls: 0,
            fail_on: 2,
        };
        let reader = LineReader::with_source(source, &options()).unwrap();
        assert!(reader.read_line().is_err());
        assert_eq!(reader.separator(), None);
        let all: Vec<String> = reader.lines().map(|l| l.unwrap().text).collect();
        assert_eq!(all, vec!["abcd", "ef"]);
    }

    #[test]
    fn test_invalid_skip_rejected() {
        let opts = options().with_skip_numbers(vec![SkipSpec::Range(9, 3)]);
        let err = LineReader::with_source(MemoryChunkSource::new("x", 1), &opts).unwrap_err();
        assert!(matches!(err, ReaderError::ReversedRange { start: 9, end: 3 }));
    }

    #[test]
    fn test_zero_buffer_size_rejected() {
        let err = LineReader::new(ReaderOptions::new("x.txt").with_buffer_size(0)).unwrap_err();
        assert!(matches!(err, ReaderError::InvalidBufferSize));
    }

    #[test]
    fn test_concurrent_readers_share_one_stream() {
        let content: String = (1..=500).map(|i| format!("line{}\n", i)).collect();
        let opts = options().with_skip_blank(true);
        let reader = Arc::new(memory_reader(&content, 7, &opts));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let reader = Arc::clone(&reader);
                std::thread::spawn(move || {
                    let mut seen = Vec::new();
                    while let Some(line) = reader.read_line_with_number().unwrap() {
                        assert_eq!(line.text, format!("line{}", line.number));
                        seen.push(line.number);
                    }
                    seen
                })
            })
            .collect();

        let mut numbers: Vec<u64> = Vec::new();
        for handle in handles {
            let seen = handle.join().unwrap();
            assert!(seen.windows(2).all(|w| w[0] < w[1]));
            numbers.extend(seen);
        }
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=500).collect::<Vec<u64>>());
    }
}
