//! Buffer size constants for chunked reading and output.
//!
//! These control memory usage vs I/O throughput. Smaller chunks keep the
//! carried fragment and the output queue small at the cost of more reads.

/// Default chunk size pulled from the source (64 KB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Low-memory chunk size (4 KB).
pub const LOW_MEMORY_CHUNK_SIZE: usize = 4 * 1024;

/// Default output buffer size (256 KB).
pub const DEFAULT_OUTPUT_BUFFER: usize = 256 * 1024;

/// Low-memory output buffer size (16 KB).
pub const LOW_MEMORY_OUTPUT_BUFFER: usize = 16 * 1024;

/// Returns the chunk size to use based on the low_memory flag.
#[inline]
pub const fn chunk_size(low_memory: bool) -> usize {
    if low_memory {
        LOW_MEMORY_CHUNK_SIZE
    } else {
        DEFAULT_CHUNK_SIZE
    }
}

/// Returns the output buffer size to use based on the low_memory flag.
#[inline]
pub const fn output_buffer_size(low_memory: bool) -> usize {
    if low_memory {
        LOW_MEMORY_OUTPUT_BUFFER
    } else {
        DEFAULT_OUTPUT_BUFFER
    }
}
