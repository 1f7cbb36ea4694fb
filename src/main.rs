use clap::Parser;
use xiangqi_room::config::ServerConfig;
use xiangqi_room::web;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::parse();

    env_logger::Builder::new()
        .filter_level(config.log_level())
        .parse_default_env()
        .init();

    log::info!(
        "Xiangqi room server (self-check {})",
        if config.rules().forbid_self_check { "forbidden" } else { "allowed" }
    );

    web::run_server(config.bind, config.rules()).await
}
