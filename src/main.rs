use ludo_arena::app::{server, types, utils};

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(true)
        .init();

    let config = utils::read_config::<types::ServerConfig>("server_config.toml", Some("LUDO"));

    let mut http_config = config.server.unwrap_or_default();

    // Bare HOST/PORT from the environment take precedence for container
    // deployments.
    if let Ok(host) = std::env::var("HOST") {
        http_config.host = host;
    }
    if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
        http_config.port = port;
    }

    let server_address = format!("{}:{}", http_config.host, http_config.port);
    let tcp_listener = tokio::net::TcpListener::bind(&server_address).await?;
    log::info!("Server successfully running on {server_address}");

    server::start_server(
        types::ServerConfig {
            server: Some(http_config),
            redis: config.redis,
        },
        tcp_listener,
    )
    .await;

    Ok(())
}
