//! Connection configuration.
//!
//! [`Settings`] is parsed once from string key/value pairs (or built with
//! [`SettingsBuilder`]) and never changes afterwards.

mod settings;

pub use settings::LowSpeed;
pub use settings::Settings;
pub use settings::SettingsBuilder;
pub use settings::{
    LOW_SPEED_LIMIT, LOW_SPEED_TIME, PASSWORD, PROXY_PASSWORD, PROXY_SERVER, PROXY_USERNAME, SKIP_SSL_VERIFICATION,
    TIMEOUT, URL, USER_AGENT, USERNAME,
};
