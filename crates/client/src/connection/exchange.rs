//! One request/response exchange over an engine handle.
//!
//! [`Exchange::new`] configures the handle for the request; [`Exchange::execute`]
//! runs the blocking perform during which the engine calls back into
//! [`ExchangeState`] to pull the request body, report header lines, and push
//! response body chunks. The request header list installed on the handle is
//! released exactly once, whichever way the exchange ends.

use std::any::Any;
use std::collections::BTreeMap;
use std::error::Error;
use std::mem;
use std::panic::{self, AssertUnwindSafe};

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use tracing::{trace, warn};

use super::pending::{Drain, PendingWrites};
use crate::engine::{EngineHandle, HandleOption, Transfer};
use crate::io::{CreateInput, Input, InputSource, Output, Produced, Written};
use crate::protocol::{BodyError, NetworkError, PayloadSize, Request, Response, header_line, parse_header_line};

pub(crate) struct Exchange<'h, 'io, H: EngineHandle + ?Sized> {
    handle: &'h mut H,
    state: ExchangeState<'io>,
    headers_installed: bool,
}

impl<'h, 'io, H: EngineHandle + ?Sized> Exchange<'h, 'io, H> {
    pub fn new(
        handle: &'h mut H,
        url: &str,
        request: &Request,
        output: Output<'io>,
        input: InputSource<'io>,
    ) -> Result<Self, NetworkError> {
        let mut exchange = Exchange { handle, state: ExchangeState::new(output, input), headers_installed: false };
        exchange.configure(url, request)?;
        Ok(exchange)
    }

    fn configure(&mut self, url: &str, request: &Request) -> Result<(), NetworkError> {
        self.handle.set_option(HandleOption::Url(url.to_string()))?;

        let mut lines = Vec::new();
        let payload_size = self.state.output.payload_size();
        match payload_size {
            PayloadSize::Empty => self.handle.set_option(HandleOption::Post(false))?,
            PayloadSize::Length(size) => {
                self.handle.set_option(HandleOption::Post(true))?;
                self.handle.set_option(HandleOption::PostFieldSize(size))?;
            }
            PayloadSize::Chunked => {
                self.handle.set_option(HandleOption::Post(true))?;
                lines.push(header_line("Transfer-Encoding", "chunked"));
            }
        }

        match request.content_type() {
            Some(content_type) => lines.push(header_line("Content-Type", content_type.as_ref())),
            // a bare name drops the form content type libcurl adds to uploads
            None if !payload_size.is_empty() && !request.headers().contains_key(CONTENT_TYPE) => {
                lines.push("Content-Type:".to_string());
            }
            None => {}
        }
        lines.extend(request.header_lines());
        trace!(?lines, "request header lines");

        self.handle.set_headers(&lines)?;
        self.headers_installed = true;

        self.handle.set_option(HandleOption::CustomRequest(request.method().as_str().to_string()))?;
        Ok(())
    }

    /// Performs the exchange, blocking until the engine is done.
    pub fn execute(mut self) -> Result<Response, NetworkError> {
        let result = self.handle.perform(&mut self.state);
        self.release_headers();
        result?;

        self.state.finish()?;
        match self.state.response.take() {
            Some(response) => Ok(response),
            None => {
                let status_code = self.handle.response_code()?;
                Ok(Response::new(status_code, mem::take(&mut self.state.headers)))
            }
        }
    }

    fn release_headers(&mut self) {
        if mem::take(&mut self.headers_installed) {
            self.handle.clear_headers();
        }
    }
}

impl<H: EngineHandle + ?Sized> Drop for Exchange<'_, '_, H> {
    fn drop(&mut self) {
        self.release_headers();
    }
}

/// The mutable side of an exchange the engine callbacks work on.
struct ExchangeState<'io> {
    output: Output<'io>,
    input: Input<'io>,
    create_input: Option<CreateInput<'io>>,
    headers: BTreeMap<String, String>,
    response: Option<Response>,
    pending: PendingWrites,
    aborted: bool,
}

impl<'io> ExchangeState<'io> {
    fn new(output: Output<'io>, input: InputSource<'io>) -> Self {
        let (input, create_input) = match input {
            InputSource::Input(input) => (input, None),
            InputSource::Factory(factory) => (Input::empty(), Some(factory)),
        };
        Self { output, input, create_input, headers: BTreeMap::new(), response: None, pending: PendingWrites::default(), aborted: false }
    }

    fn read_data(&mut self, buf: &mut [u8]) -> Result<usize, BodyError> {
        let Some(reader) = self.output.reader_mut() else {
            return Ok(0);
        };
        match reader.read(buf) {
            Ok(Produced::Data(count)) => Ok(count.min(buf.len())),
            Ok(Produced::Done) => {
                self.output.clear();
                Ok(0)
            }
            Err(e) => {
                self.output.clear();
                Err(e)
            }
        }
    }

    fn write_header(&mut self, line: &[u8]) -> usize {
        trace!(line = %String::from_utf8_lossy(line).trim_end(), "response header");
        if let Some((key, value)) = parse_header_line(line) {
            self.headers.insert(key, value);
        }
        line.len()
    }

    fn write_data(&mut self, data: &[u8], status_code: u16) -> Result<usize, BodyError> {
        if let Some(create_input) = self.create_input.take() {
            let response = self.response.get_or_insert_with(|| Response::new(status_code, mem::take(&mut self.headers)));
            self.input = create_input(response);
        }

        let Some(writer) = self.input.writer_mut() else {
            return Ok(0);
        };

        match self.pending.drain_into(writer) {
            Ok(Drain::Empty) => {}
            Ok(Drain::Stalled) => {
                if !data.is_empty() {
                    self.pending.push(Bytes::copy_from_slice(data));
                    trace!(buffered = self.pending.buffered(), "input stalled, body bytes queued");
                }
                return Ok(data.len());
            }
            Ok(Drain::Aborted) => {
                self.abort();
                return Ok(0);
            }
            Err(e) => {
                self.abort();
                return Err(e);
            }
        }

        let Some(writer) = self.input.writer_mut() else {
            return Ok(0);
        };

        if data.is_empty() {
            return match writer.write(data) {
                Ok(_) => {
                    self.close();
                    Ok(0)
                }
                Err(e) => {
                    self.abort();
                    Err(e)
                }
            };
        }

        let mut rest = data;
        while !rest.is_empty() {
            match writer.write(rest) {
                Ok(Written::Consumed(0)) => break,
                Ok(Written::Consumed(count)) => rest = &rest[count.min(rest.len())..],
                Ok(Written::Done) => {
                    self.abort();
                    return Ok(0);
                }
                Err(e) => {
                    self.abort();
                    return Err(e);
                }
            }
        }

        if !rest.is_empty() {
            self.pending.push(Bytes::copy_from_slice(rest));
            trace!(buffered = self.pending.buffered(), "input stalled, body bytes queued");
        }
        Ok(data.len())
    }

    /// Delivers what is still queued to an input attached after a successful
    /// perform, then signals the end of the body with a zero length write.
    ///
    /// Draining is retried as long as the input makes progress. An input that
    /// stops taking bytes while some are still queued turns the exchange into
    /// a write error.
    fn finish(&mut self) -> Result<(), NetworkError> {
        let status_code = self.response.as_ref().map_or(0, Response::status_code);
        while !self.input.is_empty() {
            let queued = self.pending.buffered();
            contained("write", || self.write_data(&[], status_code));

            if self.aborted {
                return Err(NetworkError::undelivered_body(queued));
            }
            if !self.input.is_empty() && self.pending.buffered() == queued {
                warn!(discarded = queued, "input stalled after the transfer ended, dropping queued body bytes");
                self.abort();
                return Err(NetworkError::undelivered_body(queued));
            }
        }
        Ok(())
    }

    /// Detaches the input once it has seen the end of the body.
    fn close(&mut self) {
        self.input.clear();
        self.pending.clear();
    }

    fn abort(&mut self) {
        self.close();
        self.aborted = true;
    }
}

impl Transfer for ExchangeState<'_> {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        contained("read", || self.read_data(buf))
    }

    fn header(&mut self, line: &[u8]) -> usize {
        contained("header", || Ok(self.write_header(line)))
    }

    fn write(&mut self, data: &[u8], status_code: u16) -> usize {
        contained("write", || self.write_data(data, status_code))
    }
}

/// Runs a callback body so that neither an error nor a panic crosses back into
/// the engine; both become a zero count, which aborts the transfer.
fn contained<F>(callback: &'static str, f: F) -> usize
where
    F: FnOnce() -> Result<usize, BodyError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(count)) => count,
        Ok(Err(e)) => {
            warn!(callback, cause = %cause_chain(e.as_ref()), "callback failed, aborting transfer");
            0
        }
        Err(payload) => {
            warn!(callback, panic = panic_message(payload.as_ref()), "callback panicked, aborting transfer");
            0
        }
    }
}

fn cause_chain(e: &(dyn Error + 'static)) -> String {
    let mut chain = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}
