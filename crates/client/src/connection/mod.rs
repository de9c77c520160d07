//! HTTP connection handling module
//!
//! This module turns validated [`Settings`](crate::config::Settings) into
//! connections and runs request/response exchanges over them.
//!
//! # Components
//!
//! - [`ConnectionFactory`]: acquires engine handles and applies the
//!   connection wide options (timeouts, credentials, proxy, TLS verification)
//! - [`Connection`]: owns one engine handle and a base url, and:
//!   - Builds request urls from the base url and request paths
//!   - Sends requests one at a time, reusing the handle
//!   - Binds requests for repeated execution through [`PreparedRequest`]
//! - `Exchange`: the per request transfer state machine, which:
//!   - Chooses between a fixed length and a chunked request body
//!   - Accumulates response header lines
//!   - Queues response body bytes while the input is stalled
//!   - Keeps callback errors and panics from reaching the engine

mod connection_factory;
mod exchange;
mod http_connection;
mod pending;

pub use connection_factory::ConnectionFactory;
pub use http_connection::Connection;
pub use http_connection::PreparedRequest;
