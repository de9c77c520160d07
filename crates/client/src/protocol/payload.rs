/// Represents the size information of an outbound HTTP payload.
///
/// This enum decides how the request body is framed on the wire:
/// - Known length: the engine sends a `Content-Length` of exactly that many bytes
/// - Chunked: size is unknown, the body is sent with `Transfer-Encoding: chunked`
/// - Empty: no body is sent at all
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Payload with known length in bytes
    Length(u64),
    /// Payload using chunked transfer encoding
    Chunked,
    /// Empty payload (no body)
    Empty,
}

impl PayloadSize {
    /// Returns true if the payload uses chunked transfer encoding
    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, PayloadSize::Chunked)
    }

    /// Returns true if the payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty)
    }

    /// Returns the fixed length, if there is one
    #[inline]
    pub fn length(&self) -> Option<u64> {
        match self {
            PayloadSize::Length(length) => Some(*length),
            PayloadSize::Chunked | PayloadSize::Empty => None,
        }
    }
}

impl From<Option<u64>> for PayloadSize {
    /// Maps a reader's size hint, `None` meaning "unknown, stream it chunked".
    fn from(size: Option<u64>) -> Self {
        match size {
            Some(length) => PayloadSize::Length(length),
            None => PayloadSize::Chunked,
        }
    }
}
