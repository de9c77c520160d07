//! HTTP response assembled from the engine's status code and header callbacks.

use std::collections::BTreeMap;

use http::StatusCode;
use mime::Mime;

/// The status and headers of a finished (or, for lazy inputs, started) exchange.
///
/// Header names keep the case they were received with; when a name occurs more
/// than once, the last occurrence wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status_code: u16,
    headers: BTreeMap<String, String>,
}

impl Response {
    pub fn new(status_code: u16, headers: BTreeMap<String, String>) -> Self {
        Self { status_code, headers }
    }

    /// Returns the numeric status code, `0` if the engine never received one.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status_code).ok()
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Looks up a header ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .or_else(|| self.headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value))
            .map(String::as_str)
    }

    pub fn content_type(&self) -> Option<Mime> {
        self.header(http::header::CONTENT_TYPE.as_str())?.parse().ok()
    }
}

/// Splits one raw header line as delivered by the engine into key and value.
///
/// The line is split on its first colon and both sides are trimmed of
/// whitespace and line terminators. A line without a colon (for instance the
/// status line) yields the whole trimmed line as key with an empty value.
/// Returns `None` when the key is empty, e.g. for the blank line ending the
/// header block.
pub fn parse_header_line(line: &[u8]) -> Option<(String, String)> {
    let line = String::from_utf8_lossy(line);
    let (key, value) = match line.split_once(':') {
        Some((key, value)) => (key.trim(), value.trim()),
        None => (line.trim(), ""),
    };

    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn header_line_is_trimmed_on_both_sides() {
        assert_eq!(parse_header_line(b"X-Test:  value \r\n"), Some(("X-Test".to_string(), "value".to_string())));
        assert_eq!(parse_header_line(b"  Host :localhost:8080\n"), Some(("Host".to_string(), "localhost:8080".to_string())));
    }

    #[test]
    fn line_without_colon_becomes_bare_key() {
        assert_eq!(parse_header_line(b"HTTP/1.1 200 OK\r\n"), Some(("HTTP/1.1 200 OK".to_string(), String::new())));
    }

    #[test]
    fn blank_lines_and_empty_keys_are_dropped() {
        assert_eq!(parse_header_line(b"\r\n"), None);
        assert_eq!(parse_header_line(b""), None);
        assert_eq!(parse_header_line(b"  : orphan\r\n"), None);
    }

    #[test]
    fn header_block_accumulates_with_last_wins() {
        let block = indoc! {"
            HTTP/1.1 200 OK\r
            Content-Type: text/plain\r
            Set-Cookie: a=1\r
            Set-Cookie: b=2\r
            \r
        "};

        let mut headers = BTreeMap::new();
        for line in block.split_inclusive('\n') {
            if let Some((key, value)) = parse_header_line(line.as_bytes()) {
                headers.insert(key, value);
            }
        }

        let response = Response::new(200, headers);
        assert_eq!(response.headers().len(), 3);
        assert_eq!(response.header("Set-Cookie"), Some("b=2"));
        assert_eq!(response.header("content-type"), Some("text/plain"));
        assert_eq!(response.content_type(), Some(mime::TEXT_PLAIN));
    }

    #[test]
    fn status_outside_valid_range() {
        let response = Response::new(0, BTreeMap::new());
        assert_eq!(response.status(), None);
        assert_eq!(Response::new(201, BTreeMap::new()).status(), Some(StatusCode::CREATED));
    }
}
