//! Response body bytes the input could not take yet.

use std::collections::VecDeque;

use bytes::{Buf, Bytes};

use crate::io::{Writer, Written};
use crate::protocol::BodyError;

/// Outcome of [`PendingWrites::drain_into`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Drain {
    /// Every queued byte was delivered
    Empty,
    /// The writer took nothing, bytes remain queued
    Stalled,
    /// The writer answered [`Written::Done`]
    Aborted,
}

/// FIFO of body chunks. Chunks go out in arrival order and a chunk leaves the
/// queue only once fully consumed, partial writes advance the front chunk.
#[derive(Debug, Default)]
pub(crate) struct PendingWrites {
    chunks: VecDeque<Bytes>,
    buffered: usize,
}

impl PendingWrites {
    pub fn push(&mut self, chunk: Bytes) {
        if chunk.is_empty() {
            return;
        }
        self.buffered += chunk.len();
        self.chunks.push_back(chunk);
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.buffered = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Number of queued bytes.
    pub fn buffered(&self) -> usize {
        self.buffered
    }

    pub fn drain_into<W: Writer + ?Sized>(&mut self, writer: &mut W) -> Result<Drain, BodyError> {
        while let Some(chunk) = self.chunks.front_mut() {
            match writer.write(chunk)? {
                Written::Done => return Ok(Drain::Aborted),
                Written::Consumed(0) => return Ok(Drain::Stalled),
                Written::Consumed(n) => {
                    let n = n.min(chunk.len());
                    chunk.advance(n);
                    self.buffered -= n;
                    if chunk.is_empty() {
                        self.chunks.pop_front();
                    }
                }
            }
        }
        Ok(Drain::Empty)
    }
}
