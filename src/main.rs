use kodi_rpc_mock::{
    config::Config, logging, methods, server, settings::SettingsStore, AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let state = AppState::new(
        SettingsStore::defaults(),
        methods::build_registry(),
        config.max_request_bytes,
        config.read_timeout,
    );
    let listener = tokio::net::TcpListener::bind(config.bind_socket()?).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        max_request_bytes = config.max_request_bytes,
        "server starting"
    );

    server::run(listener, state).await?;
    Ok(())
}
