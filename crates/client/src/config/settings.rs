//! Connection settings parsed from string key/value pairs.
//!
//! Every recognized key may appear at most once, unknown keys are rejected.
//! All validation happens here, once; a [`Settings`] value is always valid.

use std::collections::BTreeSet;
use std::time::Duration;

use http::Uri;

use crate::ensure;
use crate::protocol::ConfigError;

pub const URL: &str = "url";
pub const TIMEOUT: &str = "timeout";
pub const LOW_SPEED_LIMIT: &str = "low-speed-limit";
pub const LOW_SPEED_TIME: &str = "low-speed-time";
pub const USERNAME: &str = "username";
pub const PASSWORD: &str = "password";
pub const PROXY_SERVER: &str = "proxy-server";
pub const PROXY_USERNAME: &str = "proxy-username";
pub const PROXY_PASSWORD: &str = "proxy-password";
pub const USER_AGENT: &str = "user-agent";
pub const SKIP_SSL_VERIFICATION: &str = "skip-ssl-verification";

/// Abort a transfer slower than `limit` bytes per second for longer than `time`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LowSpeed {
    pub limit: u32,
    pub time: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    url: String,
    timeout: Duration,
    low_speed: Option<LowSpeed>,
    username: Option<String>,
    password: Option<String>,
    proxy_server: Option<String>,
    proxy_username: Option<String>,
    proxy_password: Option<String>,
    user_agent: Option<String>,
    skip_ssl_verification: bool,
}

impl Settings {
    /// Parses settings from ordered key/value pairs.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - a key is unknown or given twice
    /// - `url` is missing, empty, or not an http/https url
    /// - a numeric or boolean value doesn't parse
    /// - only one of `low-speed-limit` and `low-speed-time` is given
    /// - proxy credentials are given without `proxy-server`
    pub fn parse<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut builder = SettingsBuilder::default();
        let mut seen = BTreeSet::new();

        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            ensure!(seen.insert(key.to_string()), ConfigError::duplicate(key));

            builder = match key {
                URL => builder.url(value),
                TIMEOUT => builder.timeout(Duration::from_secs(parse_number(key, value)?)),
                LOW_SPEED_LIMIT => builder.low_speed_limit(parse_number(key, value)?),
                LOW_SPEED_TIME => builder.low_speed_time(Duration::from_secs(parse_number(key, value)?)),
                USERNAME => builder.username(value),
                PASSWORD => builder.password(value),
                PROXY_SERVER => builder.proxy_server(value),
                PROXY_USERNAME => builder.proxy_username(value),
                PROXY_PASSWORD => builder.proxy_password(value),
                USER_AGENT => builder.user_agent(value),
                SKIP_SSL_VERIFICATION => builder.skip_ssl_verification(parse_bool(key, value)?),
                _ => return Err(ConfigError::unknown_key(key)),
            };
        }

        builder.build()
    }

    pub fn builder<S: Into<String>>(url: S) -> SettingsBuilder {
        SettingsBuilder::default().url(url)
    }

    /// The base url, without trailing slashes.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Total transfer timeout, zero meaning none.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn low_speed(&self) -> Option<LowSpeed> {
        self.low_speed
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn proxy_server(&self) -> Option<&str> {
        self.proxy_server.as_deref()
    }

    pub fn proxy_username(&self) -> Option<&str> {
        self.proxy_username.as_deref()
    }

    pub fn proxy_password(&self) -> Option<&str> {
        self.proxy_password.as_deref()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn skip_ssl_verification(&self) -> bool {
        self.skip_ssl_verification
    }
}

/// Programmatic construction of [`Settings`], validated with the same rules as
/// [`Settings::parse`] when [`build`](SettingsBuilder::build) is called.
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    url: Option<String>,
    timeout: Duration,
    low_speed_limit: Option<u32>,
    low_speed_time: Option<Duration>,
    username: Option<String>,
    password: Option<String>,
    proxy_server: Option<String>,
    proxy_username: Option<String>,
    proxy_password: Option<String>,
    user_agent: Option<String>,
    skip_ssl_verification: bool,
}

impl SettingsBuilder {
    pub fn url<S: Into<String>>(mut self, url: S) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn low_speed_limit(mut self, bytes_per_second: u32) -> Self {
        self.low_speed_limit = Some(bytes_per_second);
        self
    }

    pub fn low_speed_time(mut self, time: Duration) -> Self {
        self.low_speed_time = Some(time);
        self
    }

    pub fn username<S: Into<String>>(mut self, username: S) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn proxy_server<S: Into<String>>(mut self, proxy_server: S) -> Self {
        self.proxy_server = Some(proxy_server.into());
        self
    }

    pub fn proxy_username<S: Into<String>>(mut self, proxy_username: S) -> Self {
        self.proxy_username = Some(proxy_username.into());
        self
    }

    pub fn proxy_password<S: Into<String>>(mut self, proxy_password: S) -> Self {
        self.proxy_password = Some(proxy_password.into());
        self
    }

    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn skip_ssl_verification(mut self, skip: bool) -> Self {
        self.skip_ssl_verification = skip;
        self
    }

    pub fn build(self) -> Result<Settings, ConfigError> {
        let url = validate_url(self.url.as_deref().ok_or(ConfigError::MissingUrl)?)?;

        for (key, value) in [
            (USERNAME, &self.username),
            (PASSWORD, &self.password),
            (PROXY_SERVER, &self.proxy_server),
            (PROXY_USERNAME, &self.proxy_username),
            (PROXY_PASSWORD, &self.proxy_password),
        ] {
            ensure!(value.as_ref().is_none_or(|v| !v.is_empty()), ConfigError::empty_value(key));
        }

        let low_speed = match (self.low_speed_limit, self.low_speed_time) {
            (Some(limit), Some(time)) => Some(LowSpeed { limit, time }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::incomplete_pair(LOW_SPEED_LIMIT, LOW_SPEED_TIME)),
            (None, Some(_)) => return Err(ConfigError::incomplete_pair(LOW_SPEED_TIME, LOW_SPEED_LIMIT)),
        };

        if self.proxy_server.is_none() {
            ensure!(self.proxy_username.is_none(), ConfigError::incomplete_pair(PROXY_USERNAME, PROXY_SERVER));
            ensure!(self.proxy_password.is_none(), ConfigError::incomplete_pair(PROXY_PASSWORD, PROXY_SERVER));
        }

        Ok(Settings {
            url,
            timeout: self.timeout,
            low_speed,
            username: self.username,
            password: self.password,
            proxy_server: self.proxy_server,
            proxy_username: self.proxy_username,
            proxy_password: self.proxy_password,
            user_agent: self.user_agent,
            skip_ssl_verification: self.skip_ssl_verification,
        })
    }
}

fn validate_url(value: &str) -> Result<String, ConfigError> {
    let url = value.trim_end_matches('/');
    ensure!(!url.is_empty(), ConfigError::empty_value(URL));

    let uri = url.parse::<Uri>().map_err(|e| ConfigError::invalid_url(url, e))?;
    match uri.scheme_str() {
        Some(scheme) if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") => Ok(url.to_string()),
        _ => Err(ConfigError::invalid_scheme(url)),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_e| ConfigError::invalid_number(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::invalid_bool(key, value)),
    }
}
