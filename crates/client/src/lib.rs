//! A blocking micro HTTP client on top of libcurl
//!
//! This crate wraps a libcurl style transfer engine behind a small connection
//! layer: a factory applies validated settings to engine handles, connections
//! reuse one handle request after request, and every exchange streams its
//! request body out of an [`io::Output`] and its response body into an
//! [`io::Input`] while the engine drives the transfer through callbacks.
//!
//! # Features
//!
//! - Settings parsed from string key/value pairs, rejected early when invalid
//! - Fixed length or chunked request bodies, decided by the body source
//! - Streaming response bodies with backpressure
//! - Lazy choice of the response consumer once status and headers are known
//! - Callback errors and panics contained at the engine boundary
//!
//!
//! # Example
//!
//! ```no_run
//! use http::Method;
//! use tracing::{error, info, Level};
//! use tracing_subscriber::FmtSubscriber;
//! use micro_http_client::connection::ConnectionFactory;
//! use micro_http_client::io::{Input, Output};
//! use micro_http_client::protocol::Request;
//!
//! fn main() {
//!     // Initialize logging
//!     let subscriber = FmtSubscriber::builder()
//!         .with_max_level(Level::INFO)
//!         .finish();
//!     tracing::subscriber::set_global_default(subscriber)
//!         .expect("setting default subscriber failed");
//!
//!     let factory = match ConnectionFactory::from_pairs([("url", "http://localhost:8080"), ("timeout", "10")]) {
//!         Ok(factory) => factory,
//!         Err(e) => {
//!             error!(cause = %e, "invalid settings");
//!             return;
//!         }
//!     };
//!
//!     let mut connection = factory.create_connection().expect("creating connection failed");
//!
//!     let mut body = Vec::new();
//!     let request = Request::new(Method::GET, "/hello");
//!     match connection.send(&request, Output::empty(), Input::new(&mut body)) {
//!         Ok(response) => info!(status = response.status_code(), size = body.len(), "received response"),
//!         Err(e) => error!(code = e.code(), cause = %e, "request failed"),
//!     }
//! }
//! ```
//!
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`config`]: Settings parsing and validation
//! - [`connection`]: Connection factory, connections and the exchange state machine
//! - [`engine`]: The transfer engine seam and its libcurl implementation
//! - [`io`]: Request and response body capabilities
//! - [`protocol`]: Requests, responses and error types
//!
//!
//! # Core Components
//!
//! ## Exchanges
//!
//! [`connection::Connection::send`] runs one exchange. It configures the
//! handle (method, url, body framing, header lines), performs the transfer and
//! assembles the [`protocol::Response`]. Response body bytes the input can't
//! take yet are queued and delivered in order once it resumes.
//!
//! ## Error Handling
//!
//! The crate uses custom error types that implement `std::error::Error`:
//!
//! - [`protocol::ClientError`]: Top-level error type
//! - [`protocol::ConfigError`]: Invalid settings
//! - [`protocol::InitError`]: Handle acquisition or option failures
//! - [`protocol::NetworkError`]: Failed exchanges, with the engine's result code
//!
//! # Limitations
//!
//! - One exchange per connection at a time, blocking the calling thread
//! - No cancellation besides the configured timeout and low speed abort
//! - Redirects are not followed

pub mod config;
pub mod connection;
pub mod engine;
pub mod io;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
