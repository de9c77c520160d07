//! Protocol level types shared by the connection layer.
//!
//! - **Requests** ([`request`]): [`Request`] and its [`RequestBuilder`]
//! - **Responses** ([`response`]): [`Response`] and the engine header line parser
//! - **Payload framing** ([`payload`]): [`PayloadSize`] decides between a fixed
//!   `Content-Length` and chunked transfer encoding
//! - **Errors** ([`error`]): [`ClientError`] and its configuration, init and
//!   network sources

mod payload;
pub use payload::PayloadSize;

mod request;
pub(crate) use request::header_line;
pub use request::Request;
pub use request::RequestBuilder;

mod response;
pub use response::Response;
pub use response::parse_header_line;

mod error;
pub use error::BodyError;
pub use error::ClientError;
pub use error::ConfigError;
pub use error::EngineError;
pub use error::InitError;
pub use error::NetworkError;
