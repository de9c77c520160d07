//! libcurl backed transfer engine.
//!
//! libcurl must be globally initialized exactly once before the first easy
//! handle exists. [`CurlEngine`] forces a process-wide lazy value doing that
//! and never re-initializes; global cleanup is left to process exit.

use std::cell::{Cell, RefCell};
use std::panic;

use ::curl::easy::{Auth, Easy, List};
use once_cell::sync::Lazy;
use tracing::{info, warn};

use super::{Engine, EngineHandle, HandleOption, Transfer};
use crate::protocol::EngineError;

/// `CURLE_FAILED_INIT`
const FAILED_INIT: i32 = 2;

static GLOBAL_INIT: Lazy<()> = Lazy::new(|| {
    ::curl::init();
    info!(version = ::curl::Version::get().version(), "libcurl initialized");
});

#[derive(Debug, Clone, Copy)]
pub struct CurlEngine {
    _initialized: (),
}

impl CurlEngine {
    pub fn new() -> Self {
        Lazy::force(&GLOBAL_INIT);
        Self { _initialized: () }
    }
}

impl Default for CurlEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for CurlEngine {
    type Handle = CurlHandle;

    fn create_handle(&self) -> Result<CurlHandle, EngineError> {
        Lazy::force(&GLOBAL_INIT);
        // the curl crate asserts on a null easy handle instead of reporting it
        let easy = panic::catch_unwind(Easy::new).map_err(|_payload| EngineError::new(FAILED_INIT, "curl easy init error"))?;
        Ok(CurlHandle { easy })
    }
}

/// An easy handle, cleaned up by libcurl when dropped.
#[derive(Debug)]
pub struct CurlHandle {
    easy: Easy,
}

impl EngineHandle for CurlHandle {
    fn set_option(&mut self, option: HandleOption) -> Result<(), EngineError> {
        apply_option(&mut self.easy, option).map_err(EngineError::from)
    }

    fn set_headers(&mut self, lines: &[String]) -> Result<(), EngineError> {
        let mut list = List::new();
        for line in lines {
            list.append(line)?;
        }
        self.easy.http_headers(list)?;
        Ok(())
    }

    fn clear_headers(&mut self) {
        if let Err(e) = self.easy.http_headers(List::new()) {
            warn!(cause = %e, "can't release request header list");
        }
    }

    fn perform(&mut self, transfer: &mut dyn Transfer) -> Result<(), EngineError> {
        // libcurl can't be asked for the status code from inside a callback
        // through the safe api, so it is tracked from the status lines
        let status_code = Cell::new(0u16);
        let transfer = RefCell::new(transfer);

        let mut session = self.easy.transfer();
        session.read_function(|buf| Ok(transfer.borrow_mut().read(buf)))?;
        session.header_function(|line| {
            if let Some(code) = status_line_code(line) {
                status_code.set(code);
            }
            transfer.borrow_mut().header(line) == line.len()
        })?;
        session.write_function(|data| Ok(transfer.borrow_mut().write(data, status_code.get())))?;
        session.perform()?;
        Ok(())
    }

    fn response_code(&mut self) -> Result<u16, EngineError> {
        let code = self.easy.response_code()?;
        u16::try_from(code).map_err(|e| EngineError::new(-1, format!("status code {code} out of range: {e}")))
    }
}

fn apply_option(easy: &mut Easy, option: HandleOption) -> Result<(), ::curl::Error> {
    match option {
        HandleOption::Url(url) => easy.url(&url),
        HandleOption::Post(post) => easy.post(post),
        HandleOption::PostFieldSize(size) => easy.post_field_size(size),
        HandleOption::CustomRequest(method) => easy.custom_request(&method),
        HandleOption::NoSignal(no_signal) => easy.signal(!no_signal),
        HandleOption::NoProgress(no_progress) => easy.progress(!no_progress),
        HandleOption::TcpKeepAlive(keep_alive) => easy.tcp_keepalive(keep_alive),
        HandleOption::FollowLocation(follow) => easy.follow_location(follow),
        HandleOption::AutoReferer(auto_referer) => easy.autoreferer(auto_referer),
        HandleOption::CookieFile(path) => easy.cookie_file(path),
        HandleOption::Timeout(timeout) => easy.timeout(timeout),
        HandleOption::LowSpeedLimit(limit) => easy.low_speed_limit(limit),
        HandleOption::LowSpeedTime(time) => easy.low_speed_time(time),
        HandleOption::BasicAuth { username, password } => {
            let mut auth = Auth::new();
            auth.basic(true);
            easy.http_auth(&auth)?;
            easy.username(&username)?;
            if password.is_empty() { Ok(()) } else { easy.password(&password) }
        }
        HandleOption::Proxy(proxy) => easy.proxy(&proxy),
        HandleOption::ProxyAuth { username, password } => {
            easy.proxy_username(&username)?;
            if password.is_empty() { Ok(()) } else { easy.proxy_password(&password) }
        }
        HandleOption::UserAgent(user_agent) => easy.useragent(&user_agent),
        HandleOption::SslVerifyPeer(verify) => easy.ssl_verify_peer(verify),
    }
}

impl From<::curl::Error> for EngineError {
    fn from(e: ::curl::Error) -> Self {
        let code = i32::try_from(e.code()).unwrap_or(i32::MAX);
        match e.extra_description() {
            Some(extra) => EngineError::new(code, format!("{}: {extra}", e.description())),
            None => EngineError::new(code, e.description()),
        }
    }
}

/// Status code of a `HTTP/x y reason` line, `None` for any other header line.
fn status_line_code(line: &[u8]) -> Option<u16> {
    let line = std::str::from_utf8(line).ok()?;
    let mut parts = line.split_ascii_whitespace();
    if !parts.next()?.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use std::io::{self, BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    use http::Method;

    use super::*;
    use crate::connection::ConnectionFactory;
    use crate::io::{Input, InputSource, Output, Produced};
    use crate::protocol::{Request, Response};

    #[test]
    fn status_lines_yield_codes() {
        assert_eq!(status_line_code(b"HTTP/1.1 200 OK\r\n"), Some(200));
        assert_eq!(status_line_code(b"HTTP/2 404\r\n"), Some(404));
        assert_eq!(status_line_code(b"HTTP/1.1 100 Continue\r\n"), Some(100));
    }

    #[test]
    fn other_lines_are_ignored() {
        assert_eq!(status_line_code(b"Content-Type: text/plain\r\n"), None);
        assert_eq!(status_line_code(b"\r\n"), None);
        assert_eq!(status_line_code(b"HTTP/1.1 abc\r\n"), None);
    }

    #[test]
    fn curl_error_keeps_code() {
        let error = EngineError::from(::curl::Error::new(7));
        assert_eq!(error.code(), 7);
        assert!(!error.description().is_empty());
    }

    #[test]
    fn handles_are_created() {
        let engine = CurlEngine::new();
        let mut handle = engine.create_handle().unwrap();
        handle.set_option(HandleOption::Url("http://localhost/".to_string())).unwrap();
        handle.set_headers(&["Accept: */*".to_string(), "X-Empty;".to_string()]).unwrap();
        handle.clear_headers();
    }

    #[test]
    fn uploads_round_trip_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                thread::spawn(move || echo_requests(stream));
            }
        });

        let factory = ConnectionFactory::from_pairs([("url", url.as_str()), ("timeout", "10")]).unwrap();
        let mut connection = factory.create_connection().unwrap();
        // keep proxy variables of the environment away from the loopback address
        connection.handle_mut().set_option(HandleOption::Proxy(String::new())).unwrap();

        let request = Request::builder().method(Method::POST).path("/items").content_type(mime::TEXT_PLAIN).build().unwrap();
        let mut body = Vec::new();
        let response = connection.send(&request, Output::from("hello"), Input::new(&mut body)).unwrap();

        assert_eq!(response.status_code(), 201);
        assert_eq!(response.header("x-method"), Some("POST"));
        assert_eq!(response.header("x-framing"), Some("length"));
        assert_eq!(response.header("x-content-type"), Some("text/plain"));
        assert_eq!(body, b"hello");

        // same handle, unknown size body, consumer chosen from the response
        let mut chunks = vec![b"world".to_vec(), b"hello ".to_vec()];
        let output = Output::from_fn(move |buf| match chunks.pop() {
            Some(chunk) => {
                buf[..chunk.len()].copy_from_slice(&chunk);
                Ok(Produced::Data(chunk.len()))
            }
            None => Ok(Produced::Done),
        });
        let seen = Cell::new(0);
        let mut echoed = Vec::new();
        let (status, sink) = (&seen, &mut echoed);
        let input = InputSource::factory(move |response: &Response| {
            status.set(response.status_code());
            Input::new(sink)
        });
        let response = connection.send(&Request::new(Method::PUT, "/items/1"), output, input).unwrap();

        assert_eq!(seen.get(), 201);
        assert_eq!(response.status_code(), 201);
        assert_eq!(response.header("x-method"), Some("PUT"));
        assert_eq!(response.header("x-framing"), Some("chunked"));
        assert_eq!(response.header("x-content-type"), Some("none"));
        assert_eq!(echoed, b"hello world");
    }

    /// Answers every request on the connection with `201 Created`, echoing
    /// the request body and a few facts about the request as headers.
    fn echo_requests(stream: TcpStream) -> io::Result<()> {
        let mut reader = BufReader::new(stream.try_clone()?);
        let mut writer = stream;
        loop {
            let mut request_line = String::new();
            if reader.read_line(&mut request_line)? == 0 {
                return Ok(());
            }
            let method = request_line.split_whitespace().next().unwrap_or_default().to_string();

            let mut headers = Vec::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line)?;
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
                }
            }

            if find_header(&headers, "expect").is_some_and(|value| value.eq_ignore_ascii_case("100-continue")) {
                writer.write_all(b"HTTP/1.1 100 Continue\r\n\r\n")?;
            }

            let chunked = find_header(&headers, "transfer-encoding").is_some_and(|value| value.eq_ignore_ascii_case("chunked"));
            let body = if chunked {
                read_chunked(&mut reader)?
            } else {
                let length = find_header(&headers, "content-length").map_or(0, |value| value.parse().unwrap_or(0));
                let mut body = vec![0; length];
                reader.read_exact(&mut body)?;
                body
            };

            let head = format!(
                "HTTP/1.1 201 Created\r\nContent-Length: {}\r\nX-Method: {method}\r\nX-Framing: {}\r\nX-Content-Type: {}\r\n\r\n",
                body.len(),
                if chunked { "chunked" } else { "length" },
                find_header(&headers, "content-type").unwrap_or("none"),
            );
            writer.write_all(head.as_bytes())?;
            writer.write_all(&body)?;
            writer.flush()?;
        }
    }

    fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    fn read_chunked(reader: &mut impl BufRead) -> io::Result<Vec<u8>> {
        let mut body = Vec::new();
        loop {
            let mut size_line = String::new();
            reader.read_line(&mut size_line)?;
            let size = size_line.trim().split(';').next().unwrap_or_default();
            let size = usize::from_str_radix(size, 16).map_err(io::Error::other)?;

            // chunk data or, after the last chunk, the empty trailer, then CRLF
            let mut chunk = vec![0; size + 2];
            reader.read_exact(&mut chunk)?;
            if size == 0 {
                return Ok(body);
            }
            body.extend_from_slice(&chunk[..size]);
        }
    }
}
