use std::error::Error;

use thiserror::Error;

/// Error returned by user supplied [`Reader`](crate::io::Reader) and
/// [`Writer`](crate::io::Writer) implementations.
pub type BodyError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("engine init error: {source}")]
    Init {
        #[from]
        source: InitError,
    },

    #[error("network error: {source}")]
    Network {
        #[from]
        source: NetworkError,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("multiple definition of attribute '{key}'")]
    Duplicate { key: String },

    #[error("key '{key}' is unknown")]
    UnknownKey { key: String },

    #[error("attribute 'url' is missing")]
    MissingUrl,

    #[error("invalid value \"{value}\" for attribute 'url': {reason}")]
    InvalidUrl { value: String, reason: String },

    #[error("invalid scheme in value \"{value}\" of attribute 'url'")]
    InvalidScheme { value: String },

    #[error("invalid value \"\" for attribute '{key}'")]
    EmptyValue { key: String },

    #[error("invalid value \"{value}\" for attribute '{key}', expected a non-negative integer")]
    InvalidNumber { key: String, value: String },

    #[error("invalid value \"{value}\" for attribute '{key}', expected 'true' or 'false'")]
    InvalidBool { key: String, value: String },

    #[error("attribute '{present}' specified but attribute '{missing}' is missing")]
    IncompletePair { present: &'static str, missing: &'static str },
}

impl ConfigError {
    pub fn duplicate<S: ToString>(key: S) -> Self {
        Self::Duplicate { key: key.to_string() }
    }

    pub fn unknown_key<S: ToString>(key: S) -> Self {
        Self::UnknownKey { key: key.to_string() }
    }

    pub fn invalid_url<V: ToString, R: ToString>(value: V, reason: R) -> Self {
        Self::InvalidUrl { value: value.to_string(), reason: reason.to_string() }
    }

    pub fn invalid_scheme<S: ToString>(value: S) -> Self {
        Self::InvalidScheme { value: value.to_string() }
    }

    pub fn empty_value<S: ToString>(key: S) -> Self {
        Self::EmptyValue { key: key.to_string() }
    }

    pub fn invalid_number<K: ToString, V: ToString>(key: K, value: V) -> Self {
        Self::InvalidNumber { key: key.to_string(), value: value.to_string() }
    }

    pub fn invalid_bool<K: ToString, V: ToString>(key: K, value: V) -> Self {
        Self::InvalidBool { key: key.to_string(), value: value.to_string() }
    }

    pub fn incomplete_pair(present: &'static str, missing: &'static str) -> Self {
        Self::IncompletePair { present, missing }
    }
}

/// Raw error reported by the transfer engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{code}] {description}")]
pub struct EngineError {
    code: i32,
    description: String,
}

impl EngineError {
    pub fn new<S: ToString>(code: i32, description: S) -> Self {
        Self { code, description: description.to_string() }
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

#[derive(Error, Debug)]
pub enum InitError {
    #[error("transfer engine could not create a handle: {source}")]
    Handle {
        #[source]
        source: EngineError,
    },

    #[error("can't apply option {option}: {source}")]
    Option {
        option: &'static str,
        #[source]
        source: EngineError,
    },
}

impl InitError {
    pub fn handle(source: EngineError) -> Self {
        Self::Handle { source }
    }

    pub fn option(option: &'static str, source: EngineError) -> Self {
        Self::Option { option, source }
    }
}

/// A failed exchange, carrying the engine's numeric result code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct NetworkError {
    code: i32,
    message: String,
}

impl NetworkError {
    /// `CURLE_WRITE_ERROR`, the code of a response body the input did not take.
    pub const WRITE_ERROR: i32 = 23;

    pub(crate) fn undelivered_body(discarded: usize) -> Self {
        let message = format!("error code {} (input stopped with {discarded} body bytes undelivered) on http request", Self::WRITE_ERROR);
        Self { code: Self::WRITE_ERROR, message }
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<EngineError> for NetworkError {
    fn from(e: EngineError) -> Self {
        let message = format!("error code {} ({}) on http request", e.code, e.description);
        Self { code: e.code, message }
    }
}
