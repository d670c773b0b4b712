use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use lingo_gateway::config::{Cli, Config};
use lingo_gateway::model::client::Connector;
use lingo_gateway::model::ollama::OllamaConnector;
use lingo_gateway::stream_check::stream_check;
use lingo_gateway::server::api::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "lingo_gateway=debug,tower_http=debug"
    } else {
        "lingo_gateway=info,tower_http=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("lingo-gateway v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let config = Config::load(&cli.config)?.apply_cli(&cli);
    let config = Arc::new(config);

    info!(
        model = %config.model.name,
        base_url = %config.model.base_url,
        "Configuration loaded"
    );

    let connector: Arc<dyn Connector> = Arc::new(OllamaConnector::new(&config.model)?);

    if cli.stream_check {
        let client = connector.connect(&config.model.name)?;
        let response = stream_check(client.as_ref(), std::io::stdout()).await?;
        println!();
        if let Some(call) = response.first().and_then(|c| c.function_call.as_ref()) {
            println!("function call: {} {}", call.name, call.arguments);
        }
        println!("streaming test over");
    }

    // Build the HTTP router.
    let state = Arc::new(AppState::new(config.clone(), connector));
    let app = build_router(state);

    // Start the server.
    let listen_addr = &config.server.listen;
    let listener = TcpListener::bind(listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
