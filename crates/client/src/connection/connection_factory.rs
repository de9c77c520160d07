use tracing::warn;

use super::http_connection::Connection;
use crate::config::Settings;
use crate::engine::{Engine, EngineHandle, HandleOption};
use crate::protocol::InitError;

#[cfg(feature = "curl")]
use crate::engine::CurlEngine;
#[cfg(feature = "curl")]
use crate::protocol::ConfigError;

/// Creates connections configured from one set of [`Settings`].
#[derive(Debug, Clone)]
pub struct ConnectionFactory<E> {
    settings: Settings,
    engine: E,
}

impl<E: Engine> ConnectionFactory<E> {
    pub fn new(settings: Settings, engine: E) -> Self {
        Self { settings, engine }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Acquires a fresh engine handle, applies the connection wide options and
    /// binds it to the configured base url.
    ///
    /// # Errors
    ///
    /// Returns an [`InitError`] if the engine can't create a handle or rejects
    /// an option. Nothing is retried.
    pub fn create_connection(&self) -> Result<Connection<E::Handle>, InitError> {
        let mut handle = self.engine.create_handle().map_err(InitError::handle)?;
        for option in self.handle_options() {
            let name = option.name();
            handle.set_option(option).map_err(|e| InitError::option(name, e))?;
        }
        Ok(Connection::new(handle, self.settings.url().to_string()))
    }

    fn handle_options(&self) -> Vec<HandleOption> {
        let settings = &self.settings;
        let mut options = vec![
            HandleOption::NoSignal(true),
            HandleOption::NoProgress(true),
            HandleOption::TcpKeepAlive(true),
            HandleOption::FollowLocation(false),
            HandleOption::AutoReferer(false),
            HandleOption::CookieFile(String::new()),
        ];

        if !settings.timeout().is_zero() {
            options.push(HandleOption::Timeout(settings.timeout()));
        }

        if let Some(low_speed) = settings.low_speed() {
            options.push(HandleOption::LowSpeedLimit(low_speed.limit));
            options.push(HandleOption::LowSpeedTime(low_speed.time));
        }

        if settings.username().is_some() || settings.password().is_some() {
            options.push(HandleOption::BasicAuth {
                username: settings.username().unwrap_or_default().to_string(),
                password: settings.password().unwrap_or_default().to_string(),
            });
        }

        if let Some(proxy) = settings.proxy_server() {
            options.push(HandleOption::Proxy(proxy.to_string()));
            if settings.proxy_username().is_some() || settings.proxy_password().is_some() {
                options.push(HandleOption::ProxyAuth {
                    username: settings.proxy_username().unwrap_or_default().to_string(),
                    password: settings.proxy_password().unwrap_or_default().to_string(),
                });
            } else {
                warn!(proxy, "proxy server configured without credentials");
            }
        }

        if let Some(user_agent) = settings.user_agent() {
            options.push(HandleOption::UserAgent(user_agent.to_string()));
        }

        if settings.skip_ssl_verification() {
            options.push(HandleOption::SslVerifyPeer(false));
        }

        options
    }
}

#[cfg(feature = "curl")]
impl ConnectionFactory<CurlEngine> {
    /// A factory backed by libcurl.
    pub fn curl(settings: Settings) -> Self {
        Self::new(settings, CurlEngine::new())
    }

    /// Parses the settings and creates a libcurl backed factory.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] of an invalid configuration.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Ok(Self::curl(Settings::parse(pairs)?))
    }
}
