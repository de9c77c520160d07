//! HTTP request description handed to a [`Connection`](crate::connection::Connection).
//!
//! A [`Request`] only describes the exchange: method, path relative to the
//! connection's base url, content type and extra headers. The body travels
//! separately as an [`Output`](crate::io::Output) so the same request can be
//! prepared once and executed with different bodies.

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use mime::Mime;

#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    content_type: Option<Mime>,
    headers: HeaderMap,
}

impl Request {
    /// Creates a request without content type and headers.
    pub fn new<P: Into<String>>(method: Method, path: P) -> Self {
        Self { method, path: path.into(), content_type: None, headers: HeaderMap::new() }
    }

    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path, relative to the connection's base url.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content_type(&self) -> Option<&Mime> {
        self.content_type.as_ref()
    }

    /// Returns a reference to the request's headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Renders the request headers as engine header lines.
    ///
    /// One line per header name, carrying its last value. A header with an
    /// empty value becomes `name;`, which tells the engine to send the header
    /// without a value instead of synthesizing a default one.
    pub(crate) fn header_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.headers.keys().filter_map(|name| {
            let value = self.headers.get_all(name).iter().next_back()?;
            Some(header_line(name.as_str(), &String::from_utf8_lossy(value.as_bytes())))
        })
    }
}

pub(crate) fn header_line(name: &str, value: &str) -> String {
    if value.is_empty() { format!("{name};") } else { format!("{name}: {value}") }
}

/// Builder for [`Request`], deferring conversion errors until [`build`](RequestBuilder::build)
/// the same way `http::request::Builder` does.
#[derive(Debug)]
pub struct RequestBuilder {
    inner: Result<Request, http::Error>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self { inner: Ok(Request::new(Method::GET, "")) }
    }

    pub fn method<T>(self, method: T) -> Self
    where
        Method: TryFrom<T>,
        <Method as TryFrom<T>>::Error: Into<http::Error>,
    {
        self.and_then(move |mut request| {
            request.method = Method::try_from(method).map_err(Into::into)?;
            Ok(request)
        })
    }

    pub fn path<P: Into<String>>(self, path: P) -> Self {
        self.and_then(move |mut request| {
            request.path = path.into();
            Ok(request)
        })
    }

    pub fn content_type(self, content_type: Mime) -> Self {
        self.and_then(move |mut request| {
            request.content_type = Some(content_type);
            Ok(request)
        })
    }

    /// Sets a header, replacing any previous value for the same name.
    pub fn header<K, V>(self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.and_then(move |mut request| {
            let name = HeaderName::try_from(key).map_err(Into::into)?;
            let value = HeaderValue::try_from(value).map_err(Into::into)?;
            request.headers.insert(name, value);
            Ok(request)
        })
    }

    pub fn build(self) -> Result<Request, http::Error> {
        self.inner
    }

    fn and_then<F>(self, f: F) -> Self
    where
        F: FnOnce(Request) -> Result<Request, http::Error>,
    {
        Self { inner: self.inner.and_then(f) }
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
