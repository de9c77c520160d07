use tracing::debug;

use super::exchange::Exchange;
use crate::engine::EngineHandle;
use crate::io::{InputSource, Output};
use crate::protocol::{NetworkError, Request, Response};

/// A configured engine handle bound to a base url.
///
/// The handle is reused for every exchange and released when the connection
/// is dropped. Exchanges are strictly sequential, each one borrows the
/// connection mutably for its whole duration.
#[derive(Debug)]
pub struct Connection<H> {
    handle: H,
    base_url: String,
}

impl<H: EngineHandle> Connection<H> {
    pub(crate) fn new(handle: H, base_url: String) -> Self {
        Self { handle, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends `request` with `output` as its body and feeds the response body
    /// into the input.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError`] carrying the engine's result code when the
    /// exchange fails. Nothing is retried.
    pub fn send<'io, I>(&mut self, request: &Request, output: Output<'io>, input: I) -> Result<Response, NetworkError>
    where
        I: Into<InputSource<'io>>,
    {
        let url = self.request_url(request.path());
        self.send_to(&url, request, output, input.into())
    }

    /// Binds `request` to this connection, so it can be executed repeatedly.
    pub fn prepare(&mut self, request: Request) -> PreparedRequest<'_, H> {
        let url = self.request_url(request.path());
        PreparedRequest { connection: self, request, url }
    }

    fn send_to<'io>(&mut self, url: &str, request: &Request, output: Output<'io>, input: InputSource<'io>) -> Result<Response, NetworkError> {
        debug!(method = %request.method(), url, "sending http request");
        let result = Exchange::new(&mut self.handle, url, request, output, input)?.execute();
        if let Err(e) = &result {
            debug!(url, code = e.code(), cause = %e, "http request failed");
        }
        result
    }

    fn request_url(&self, path: &str) -> String {
        if path.is_empty() || path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    #[cfg(test)]
    pub(crate) fn handle_mut(&mut self) -> &mut H {
        &mut self.handle
    }
}

/// A request bound to its connection and target url.
#[derive(Debug)]
pub struct PreparedRequest<'c, H> {
    connection: &'c mut Connection<H>,
    request: Request,
    url: String,
}

impl<H: EngineHandle> PreparedRequest<'_, H> {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Runs the bound request once. May be called any number of times.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError`] when the exchange fails.
    pub fn execute<'io, I>(&mut self, output: Output<'io>, input: I) -> Result<Response, NetworkError>
    where
        I: Into<InputSource<'io>>,
    {
        self.connection.send_to(&self.url, &self.request, output, input.into())
    }
}
