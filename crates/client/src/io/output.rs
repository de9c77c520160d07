//! Outbound request bodies.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use bytes::{Buf, Bytes};

use crate::protocol::{BodyError, PayloadSize};

/// Result of one [`Reader::read`] call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Produced {
    /// `n` bytes were written into the buffer
    Data(usize),
    /// No more data, the body is complete
    Done,
}

/// A source of request body bytes, pulled by the engine's read callback.
#[cfg_attr(test, mockall::automock)]
pub trait Reader {
    /// Total size of the body, if known up front.
    ///
    /// A known size is sent as `Content-Length`, an unknown one makes the body chunked.
    fn size(&self) -> Option<u64> {
        None
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<Produced, BodyError>;
}

/// The request body of one exchange, empty when the request carries no body.
#[derive(Default)]
pub struct Output<'a> {
    reader: Option<Box<dyn Reader + 'a>>,
}

impl<'a> Output<'a> {
    pub fn empty() -> Self {
        Self { reader: None }
    }

    pub fn new<R: Reader + 'a>(reader: R) -> Self {
        Self { reader: Some(Box::new(reader)) }
    }

    /// Streams a body of unknown size produced by `f`.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnMut(&mut [u8]) -> Result<Produced, BodyError> + 'a,
    {
        Self::new(FnReader(f))
    }

    pub fn is_empty(&self) -> bool {
        self.reader.is_none()
    }

    pub fn payload_size(&self) -> PayloadSize {
        match &self.reader {
            None => PayloadSize::Empty,
            Some(reader) => reader.size().into(),
        }
    }

    pub(crate) fn reader_mut(&mut self) -> Option<&mut (dyn Reader + 'a)> {
        self.reader.as_deref_mut()
    }

    /// Drops the reader, every later read reports end of data.
    pub(crate) fn clear(&mut self) {
        self.reader = None;
    }
}

impl Output<'static> {
    /// A fixed size body. Empty bytes give an empty output.
    pub fn from_bytes<B: Into<Bytes>>(bytes: B) -> Self {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Self::empty();
        }
        Self::new(BytesReader(bytes))
    }

    /// A fixed size body read from a file, the size taken from its metadata.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self::new(FileReader { file, remaining: size, size }))
    }
}

impl fmt::Debug for Output<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output").field("payload_size", &self.payload_size()).finish()
    }
}

impl From<Bytes> for Output<'static> {
    fn from(bytes: Bytes) -> Self {
        Output::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for Output<'static> {
    fn from(bytes: Vec<u8>) -> Self {
        Output::from_bytes(bytes)
    }
}

impl From<String> for Output<'static> {
    fn from(string: String) -> Self {
        Output::from_bytes(string)
    }
}

impl From<&'static str> for Output<'static> {
    fn from(string: &'static str) -> Self {
        Output::from_bytes(string)
    }
}

struct BytesReader(Bytes);

impl Reader for BytesReader {
    fn size(&self) -> Option<u64> {
        Some(self.0.len() as u64)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<Produced, BodyError> {
        if !self.0.has_remaining() {
            return Ok(Produced::Done);
        }
        let count = buf.len().min(self.0.len());
        self.0.copy_to_slice(&mut buf[..count]);
        Ok(Produced::Data(count))
    }
}

struct FileReader {
    file: File,
    remaining: u64,
    size: u64,
}

impl Reader for FileReader {
    fn size(&self) -> Option<u64> {
        Some(self.size)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<Produced, BodyError> {
        if self.remaining == 0 {
            return Ok(Produced::Done);
        }
        // never send more than announced, even if the file grew meanwhile
        let limit = usize::try_from(self.remaining).unwrap_or(usize::MAX).min(buf.len());
        let count = self.file.read(&mut buf[..limit])?;
        if count == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "file shrunk while uploading").into());
        }
        self.remaining -= count as u64;
        Ok(Produced::Data(count))
    }
}

struct FnReader<F>(F);

impl<F> Reader for FnReader<F>
where
    F: FnMut(&mut [u8]) -> Result<Produced, BodyError>,
{
    fn read(&mut self, buf: &mut [u8]) -> Result<Produced, BodyError> {
        (self.0)(buf)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_bytes_give_empty_output() {
        let output = Output::from_bytes(Bytes::new());
        assert!(output.is_empty());
        assert_eq!(output.payload_size(), PayloadSize::Empty);
    }

    #[test]
    fn bytes_are_read_in_slices() {
        let mut output = Output::from("hello world");
        assert_eq!(output.payload_size(), PayloadSize::Length(11));

        let reader = output.reader_mut().unwrap();
        let mut buf = [0u8; 4];

        assert_eq!(reader.read(&mut buf).unwrap(), Produced::Data(4));
        assert_eq!(&buf, b"hell");
        assert_eq!(reader.read(&mut buf).unwrap(), Produced::Data(4));
        assert_eq!(&buf, b"o wo");
        assert_eq!(reader.read(&mut buf).unwrap(), Produced::Data(3));
        assert_eq!(&buf[..3], b"rld");
        assert_eq!(reader.read(&mut buf).unwrap(), Produced::Done);
    }

    #[test]
    fn fn_output_has_unknown_size() {
        let mut chunks = vec![b"b".to_vec(), b"a".to_vec()];
        let output = Output::from_fn(move |buf| match chunks.pop() {
            Some(chunk) => {
                buf[..chunk.len()].copy_from_slice(&chunk);
                Ok(Produced::Data(chunk.len()))
            }
            None => Ok(Produced::Done),
        });

        assert!(output.payload_size().is_chunked());
    }

    #[test]
    fn file_output_uses_file_length() {
        let path = std::env::temp_dir().join(format!("micro-http-client-output-{}.txt", std::process::id()));
        File::create(&path).unwrap().write_all(b"0123456789").unwrap();

        let mut output = Output::from_file(&path).unwrap();
        assert_eq!(output.payload_size(), PayloadSize::Length(10));

        let mut buf = [0u8; 64];
        let reader = output.reader_mut().unwrap();
        assert_eq!(reader.read(&mut buf).unwrap(), Produced::Data(10));
        assert_eq!(reader.read(&mut buf).unwrap(), Produced::Done);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        let error = Output::from_file("/definitely/not/here.bin").unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
    }
}
