use std::env;
use std::io::{self, Write};

use http::Method;
use micro_http_client::connection::ConnectionFactory;
use micro_http_client::io::{Input, InputSource, Output, Written};
use micro_http_client::protocol::{Request, Response};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut args = env::args().skip(1);
    let url = args.next().unwrap_or_else(|| "http://127.0.0.1:3000".to_string());
    let path = args.next().unwrap_or_else(|| "/".to_string());

    let factory = match ConnectionFactory::from_pairs([("url", url.as_str()), ("timeout", "10"), ("user-agent", "micro-fetch")]) {
        Ok(factory) => factory,
        Err(e) => {
            error!(cause = %e, "invalid settings");
            return;
        }
    };

    let mut connection = match factory.create_connection() {
        Ok(connection) => connection,
        Err(e) => {
            error!(cause = %e, "can't create connection");
            return;
        }
    };

    // print successful bodies, swallow the rest
    let input = InputSource::factory(|response: &Response| {
        if response.status().is_some_and(|status| status.is_success()) {
            let mut stdout = io::stdout().lock();
            Input::from_fn(move |data| {
                stdout.write_all(data)?;
                Ok(Written::Consumed(data.len()))
            })
        } else {
            warn!(status = response.status_code(), "discarding response body");
            Input::from_fn(|data| Ok(Written::Consumed(data.len())))
        }
    });

    match connection.send(&Request::new(Method::GET, path), Output::empty(), input) {
        Ok(response) => {
            for (name, value) in response.headers() {
                info!(name = %name, value = %value, "response header");
            }
            info!(status = response.status_code(), "request finished");
        }
        Err(e) => error!(code = e.code(), cause = %e, "request failed"),
    }
}
