//! Body capabilities of an exchange.
//!
//! - [`Output`] wraps a [`Reader`] producing the request body
//! - [`Input`] wraps a [`Writer`] consuming the response body, supplied
//!   directly or through an [`InputSource::Factory`] that picks a consumer
//!   after seeing the response status and headers

mod input;
mod output;

pub(crate) use input::CreateInput;
pub use input::Input;
pub use input::InputSource;
pub use input::Writer;
pub use input::Written;
pub use output::Output;
pub use output::Produced;
pub use output::Reader;

#[cfg(test)]
pub(crate) use input::MockWriter;
#[cfg(test)]
pub(crate) use output::MockReader;
