//! # Switchyard Demo
//!
//! Sample service: sessions plus an in-memory notes resource, served over
//! HTTP.
//!
//! Configuration is read from `<executable>.json`, then `SWITCHYARD_*`
//! environment variables, then `-key value` arguments; later sources win.
//!
//! ```text
//! switchyard-demo -http.listenAddress 0.0.0.0:8080 -http.keepAlive
//! ```

mod notes;
mod session;

use anyhow::{anyhow, Context, Result};
use switchyard_core::{
    ArgsProvider, Config, ConfigProvider, EnvironmentProvider, FileProvider, Router, Server,
    ServerConfig,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const ENV_PREFIX: &str = "SWITCHYARD";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let providers: Vec<Box<dyn ConfigProvider>> = vec![
        Box::new(
            FileProvider::beside_executable().context("Failed to locate configuration file")?,
        ),
        Box::new(EnvironmentProvider::new(ENV_PREFIX)),
        Box::new(ArgsProvider::from_env()),
    ];
    let config = Config::load(&providers).context("Failed to load configuration")?;
    let server_config =
        ServerConfig::from_config(&config).context("Invalid HTTP configuration")?;

    let notes = notes::NoteStore::default();
    let sessions = session::SessionStore::default();
    let dispatcher = build_router(&notes, &sessions).seal();

    info!(
        version = switchyard_core::VERSION,
        address = %server_config.address,
        routes = dispatcher.len(),
        "Starting switchyard demo"
    );

    Server::new(dispatcher, server_config)
        .serve()
        .await
        .context("Server failed")
}

/// Register every route the demo serves
fn build_router(notes: &notes::NoteStore, sessions: &session::SessionStore) -> Router {
    let mut router = Router::new();
    session::register(&mut router, sessions);
    notes::register(&mut router, notes);
    router
}

/// Plain output by default; `SWITCHYARD_LOG_FORMAT=json` for JSON lines.
/// Verbosity follows `RUST_LOG`.
fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let json = std::env::var(format!("{ENV_PREFIX}_LOG_FORMAT"))
        .is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
}
