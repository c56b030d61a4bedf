use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use clap::Parser;
use relaychat::cli::{commands::{Cli, Commands}, run_cli};
use relaychat::config::AppConfig;
use relaychat::llm::{CompletionClient, DeepSeekClient};
use tracing::{error, info, warn};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if !matches!(cli.command, Commands::Serve) {
        if let Err(e) = run_cli(cli.command, cli.config).await {
            error!("{:#}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    info!("Starting Relaychat server...");

    let config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let client = match DeepSeekClient::new(&config.upstream) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to initialize completion client: {}", e);
            std::process::exit(1);
        }
    };

    // Requests still get a clean configuration error; the server stays up.
    if let Err(e) = client.ensure_configured() {
        warn!("{}", e);
    }

    let llm: Arc<dyn CompletionClient> = Arc::new(client);
    let host = config.server.host.clone();
    let port = config.server.port;

    info!("Server listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(llm.clone()))
            .configure(relaychat::api::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
