//! Chunk-to-line splitter with carry-over.
//!
//! Chunks are accumulated until the separator has been seen at least once.
//! Everything up to the last separator is handed out as a blob of complete
//! lines; the tail after it is kept as the pending fragment and prefixed to
//! the next chunk. Once the source is exhausted the whole buffer is final.
//!
//! The cumulative buffer is searched, not just the newest chunk, because a
//! two-byte separator can be torn across a chunk edge. Since the carried
//! fragment never contains a complete separator, only the newly appended
//! bytes (plus one byte of overlap) need searching.

use crate::reader::Result;
use crate::source::ChunkSource;
use crate::streaming::separator::Separator;
use memchr::memmem;
use std::collections::VecDeque;

/// Pending fragment and replay buffer for one reading session.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Option<String>,
    replay: VecDeque<String>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when consumed text is waiting: a fragment or chunks to replay.
    #[inline]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some() || !self.replay.is_empty()
    }

    /// The carried partial line, if any.
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Chunks consumed ahead of splitting (during separator detection).
    /// They are replayed, in order, before the source is pulled again.
    pub fn replay_mut(&mut self) -> &mut VecDeque<String> {
        &mut self.replay
    }

    pub fn clear(&mut self) {
        self.pending = None;
        self.replay.clear();
    }

    fn pull<S: ChunkSource + ?Sized>(&mut self, source: &mut S) -> Result<Option<String>> {
        if let Some(chunk) = self.replay.pop_front() {
            return Ok(Some(chunk));
        }
        if source.is_exhausted() {
            return Ok(None);
        }
        source.next_chunk()
    }

    #[inline]
    fn drained<S: ChunkSource + ?Sized>(&self, source: &S) -> bool {
        self.replay.is_empty() && source.is_exhausted()
    }

    /// Produce the next blob of complete lines, without the final separator.
    ///
    /// Returns `None` when there is no fragment and nothing left to pull.
    /// If the source fails, the text accumulated so far becomes the pending
    /// fragment again, so no consumed input is lost.
    pub fn next_blob<S: ChunkSource + ?Sized>(
        &mut self,
        source: &mut S,
        separator: Separator,
    ) -> Result<Option<String>> {
        let had_pending = self.pending.is_some();
        let mut buffer = self.pending.take().unwrap_or_default();
        let mut pulled = false;
        let needle = separator.as_bytes();

        loop {
            let search_from = buffer.len().saturating_sub(needle.len() - 1);
            let chunk = match self.pull(source) {
                Ok(Some(chunk)) => chunk,
                Ok(None) => {
                    return Ok((had_pending || pulled).then_some(buffer));
                }
                Err(e) => {
                    if had_pending || pulled {
                        self.pending = Some(buffer);
                    }
                    return Err(e);
                }
            };
            pulled = true;
            buffer.push_str(&chunk);

            if self.drained(source) {
                return Ok(Some(buffer));
            }

            if let Some(pos) = memmem::rfind(&buffer.as_bytes()[search_from..], needle) {
                let at = search_from + pos;
                self.pending = Some(buffer.split_off(at + needle.len()));
                buffer.truncate(at);
                return Ok(Some(buffer));
            }
        }
    }
}
