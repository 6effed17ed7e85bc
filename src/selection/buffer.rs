//! Transfer Buffer
//!
//! Growable byte container shared by the reader and server state machines.
//! Accumulates incremental chunks on the read side and, once frozen, becomes
//! the immutable content served to requestors.

use bytes::{Bytes, BytesMut};

/// Byte accumulator with explicit occupied length.
///
/// Grows by reallocation and never shrinks implicitly; `reset` releases the
/// held allocation outright. Allocation failure aborts the process (Rust OOM
/// semantics), which is the intended behavior for this single-shot tool.
#[derive(Debug, Default)]
pub struct TransferBuffer {
    data: BytesMut,
}

impl TransferBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            data: BytesMut::new(),
        }
    }

    /// Occupied length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when no bytes are held.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Drop held bytes and release the allocation.
    pub fn reset(&mut self) {
        self.data = BytesMut::new();
    }

    /// Append bytes, growing capacity as needed.
    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Replace the entire content (reset, then append).
    pub fn replace(&mut self, bytes: &[u8]) {
        self.reset();
        self.append(bytes);
    }

    /// View the accumulated bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Hand the accumulated bytes to the caller as immutable content.
    pub fn into_bytes(self) -> Bytes {
        self.data.freeze()
    }
}
