use std::net::IpAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use web_summarizer::{
    api::routes::create_router,
    config::Config,
    pipeline::Summarizer,
    telemetry::{init_tracing, DEFAULT_FILTER},
    AppState,
};

#[derive(Parser)]
#[command(name = "web-summarizer", about = "HTTP API and web UI for summarizing pages and videos")]
struct Args {
    /// Address to bind to, overrides HOST
    #[arg(long)]
    host: Option<IpAddr>,

    /// Port to bind to, overrides PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(DEFAULT_FILTER);
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load()?;
    if let Some(host) = args.host {
        config.server_addr.set_ip(host);
    }
    if let Some(port) = args.port {
        config.server_addr.set_port(port);
    }
    let server_addr = config.server_addr;

    let summarizer = Summarizer::from_config(&config)?;
    info!(
        model = %config.ollama_model,
        ollama = %config.ollama_base_url,
        fetch_mode = ?config.fetch_mode,
        "summarizer ready"
    );

    // Create application state
    let app_state = AppState {
        config: Arc::new(config),
        summarizer: Arc::new(summarizer),
    };

    // Build the router with routes
    let app = create_router(app_state);

    // Create the listener
    let listener = TcpListener::bind(server_addr).await?;

    // Start the server
    info!(addr = %server_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
