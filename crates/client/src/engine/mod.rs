//! The transfer engine seam.
//!
//! The connection layer never speaks HTTP itself. It configures an engine
//! handle through [`HandleOption`]s, installs a header list, and calls the
//! handle's blocking [`perform`](EngineHandle::perform). While performing, the
//! engine drives the exchange through the three [`Transfer`] callbacks on the
//! calling thread, in whatever interleaving its own I/O loop needs.
//!
//! [`CurlEngine`] is the libcurl backed implementation (feature `curl`).

use std::time::Duration;

use crate::protocol::EngineError;

#[cfg(feature = "curl")]
mod curl;
#[cfg(feature = "curl")]
pub use self::curl::{CurlEngine, CurlHandle};

#[cfg(test)]
pub(crate) mod fake;

/// Produces engine handles.
pub trait Engine {
    type Handle: EngineHandle;

    /// Acquires a fresh, unconfigured handle.
    fn create_handle(&self) -> Result<Self::Handle, EngineError>;
}

/// One reusable unit of engine state, bound to one connection.
///
/// A handle runs at most one [`perform`](EngineHandle::perform) at a time;
/// `&mut self` makes that a compile time rule.
pub trait EngineHandle {
    fn set_option(&mut self, option: HandleOption) -> Result<(), EngineError>;

    /// Installs the request header lines for the next perform, replacing any
    /// previous list.
    fn set_headers(&mut self, lines: &[String]) -> Result<(), EngineError>;

    /// Releases the installed header list.
    fn clear_headers(&mut self);

    /// Runs one exchange to completion, blocking the calling thread.
    fn perform(&mut self, transfer: &mut dyn Transfer) -> Result<(), EngineError>;

    /// Status code of the last received response, `0` if none.
    fn response_code(&mut self) -> Result<u16, EngineError>;
}

/// Callbacks the engine invokes while performing.
///
/// All three follow the engine's convention of answering with a byte count:
/// anything other than what the engine expects aborts the transfer.
pub trait Transfer {
    /// Fills `buf` with request body bytes. `0` ends the body.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Receives one raw header line, terminators included. Must return
    /// `line.len()` to continue.
    fn header(&mut self, line: &[u8]) -> usize;

    /// Receives a chunk of the response body along with the status code known
    /// so far. Must return `data.len()` to continue.
    fn write(&mut self, data: &[u8], status_code: u16) -> usize;
}

/// Every handle option the connection layer sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOption {
    Url(String),
    /// Send a request body through the read callback
    Post(bool),
    PostFieldSize(u64),
    CustomRequest(String),
    NoSignal(bool),
    NoProgress(bool),
    TcpKeepAlive(bool),
    FollowLocation(bool),
    AutoReferer(bool),
    /// Cookie file to load, an empty path enables the in-memory cookie store
    CookieFile(String),
    Timeout(Duration),
    /// Bytes per second below which the transfer counts as too slow
    LowSpeedLimit(u32),
    /// How long the transfer may stay below the low speed limit
    LowSpeedTime(Duration),
    BasicAuth { username: String, password: String },
    Proxy(String),
    ProxyAuth { username: String, password: String },
    UserAgent(String),
    SslVerifyPeer(bool),
}

impl HandleOption {
    pub fn name(&self) -> &'static str {
        match self {
            HandleOption::Url(_) => "url",
            HandleOption::Post(_) => "post",
            HandleOption::PostFieldSize(_) => "post-field-size",
            HandleOption::CustomRequest(_) => "custom-request",
            HandleOption::NoSignal(_) => "no-signal",
            HandleOption::NoProgress(_) => "no-progress",
            HandleOption::TcpKeepAlive(_) => "tcp-keep-alive",
            HandleOption::FollowLocation(_) => "follow-location",
            HandleOption::AutoReferer(_) => "auto-referer",
            HandleOption::CookieFile(_) => "cookie-file",
            HandleOption::Timeout(_) => "timeout",
            HandleOption::LowSpeedLimit(_) => "low-speed-limit",
            HandleOption::LowSpeedTime(_) => "low-speed-time",
            HandleOption::BasicAuth { .. } => "basic-auth",
            HandleOption::Proxy(_) => "proxy",
            HandleOption::ProxyAuth { .. } => "proxy-auth",
            HandleOption::UserAgent(_) => "user-agent",
            HandleOption::SslVerifyPeer(_) => "ssl-verify-peer",
        }
    }
}
