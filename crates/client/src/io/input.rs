//! Inbound response bodies.

use std::fmt;

use bytes::BytesMut;

use crate::protocol::{BodyError, Response};

/// Result of one [`Writer::write`] call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Written {
    /// `n` bytes were taken, `0` meaning "can't take more right now"
    Consumed(usize),
    /// The consumer is done or gave up, the rest of the body is not wanted
    Done,
}

/// A sink for response body bytes, fed by the engine's write callback.
///
/// A zero length write marks the end of the body.
#[cfg_attr(test, mockall::automock)]
pub trait Writer {
    fn write(&mut self, data: &[u8]) -> Result<Written, BodyError>;
}

impl Writer for BytesMut {
    fn write(&mut self, data: &[u8]) -> Result<Written, BodyError> {
        self.extend_from_slice(data);
        Ok(Written::Consumed(data.len()))
    }
}

impl Writer for Vec<u8> {
    fn write(&mut self, data: &[u8]) -> Result<Written, BodyError> {
        self.extend_from_slice(data);
        Ok(Written::Consumed(data.len()))
    }
}

impl<W: Writer + ?Sized> Writer for &mut W {
    fn write(&mut self, data: &[u8]) -> Result<Written, BodyError> {
        (**self).write(data)
    }
}

/// The response body consumer of one exchange.
///
/// An empty input declines the body, which makes the engine abort the
/// transfer as soon as body bytes arrive.
#[derive(Default)]
pub struct Input<'a> {
    writer: Option<Box<dyn Writer + 'a>>,
}

impl<'a> Input<'a> {
    pub fn empty() -> Self {
        Self { writer: None }
    }

    pub fn new<W: Writer + 'a>(writer: W) -> Self {
        Self { writer: Some(Box::new(writer)) }
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnMut(&[u8]) -> Result<Written, BodyError> + 'a,
    {
        Self::new(FnWriter(f))
    }

    pub fn is_empty(&self) -> bool {
        self.writer.is_none()
    }

    pub(crate) fn writer_mut(&mut self) -> Option<&mut (dyn Writer + 'a)> {
        self.writer.as_deref_mut()
    }

    pub(crate) fn clear(&mut self) {
        self.writer = None;
    }
}

impl fmt::Debug for Input<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input").field("empty", &self.is_empty()).finish()
    }
}

struct FnWriter<F>(F);

impl<F> Writer for FnWriter<F>
where
    F: FnMut(&[u8]) -> Result<Written, BodyError>,
{
    fn write(&mut self, data: &[u8]) -> Result<Written, BodyError> {
        (self.0)(data)
    }
}

pub(crate) type CreateInput<'a> = Box<dyn FnOnce(&Response) -> Input<'a> + 'a>;

/// Where the response body goes: a ready [`Input`], or a factory deciding once
/// the status and headers are known.
pub enum InputSource<'a> {
    Input(Input<'a>),
    Factory(CreateInput<'a>),
}

impl<'a> InputSource<'a> {
    /// The factory is called at most once, when the first body bytes arrive.
    pub fn factory<F>(f: F) -> Self
    where
        F: FnOnce(&Response) -> Input<'a> + 'a,
    {
        Self::Factory(Box::new(f))
    }
}

impl<'a> From<Input<'a>> for InputSource<'a> {
    fn from(input: Input<'a>) -> Self {
        Self::Input(input)
    }
}

impl fmt::Debug for InputSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Input(input) => f.debug_tuple("Input").field(input).finish(),
            InputSource::Factory(_) => f.write_str("Factory"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borrowed_buffer_collects_body() {
        let mut body = BytesMut::new();
        {
            let mut input = Input::new(&mut body);
            let writer = input.writer_mut().unwrap();
            assert_eq!(writer.write(b"abc").unwrap(), Written::Consumed(3));
            assert_eq!(writer.write(b"").unwrap(), Written::Consumed(0));
        }
        assert_eq!(&body[..], b"abc");
    }

    #[test]
    fn empty_input_has_no_writer() {
        let mut input = Input::empty();
        assert!(input.is_empty());
        assert!(input.writer_mut().is_none());

        let mut input = Input::from_fn(|_| Ok(Written::Done));
        input.clear();
        assert!(input.is_empty());
    }
}
