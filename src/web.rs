#![cfg(not(tarpaulin_include))]

use wheeldash::app;
use wheeldash::config::ServerConfig;

/// Main entry point for the dashboard web server
///
/// Settings come from the environment (`WHEELDASH_ADDR`, `WHEELDASH_MAX_UPLOAD_MB`,
/// `WHEELDASH_SESSION_TTL_SECS`); an optional first argument overrides the listen
/// address.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env().with_args(std::env::args().skip(1));
    app::run(config).await
}
