mod bedrock;
mod http_client;
mod model;
mod trivia;

use clap::Parser;
use bedrock::provider::BedrockProvider;
use model::arg::Args;
use model::config::Config;

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config_path = args
        .config
        .unwrap_or_else(|| Config::default_config_path().to_string());
    let mut config = Config::load(&config_path).unwrap_or_else(|e| {
        tracing::error!("Failed to load config: {}", e);
        std::process::exit(1);
    });
    if let Some(port) = args.port {
        config.port = port;
    }

    let provider = BedrockProvider::from_config(&config).unwrap_or_else(|e| {
        tracing::error!("Failed to create Bedrock provider: {:#}", e);
        std::process::exit(1);
    });

    if let Some(proxy_url) = &config.proxy_url {
        tracing::info!("HTTP proxy configured: {}", proxy_url);
    }
    tracing::info!(
        region = %config.region,
        endpoint = %config.endpoint(),
        model_id = %config.model_id,
        max_tokens = config.max_tokens,
        temperature = config.temperature,
        "Bedrock model configured"
    );

    let app = trivia::create_router(
        trivia::AppState::new(provider),
        config.max_request_body_bytes,
    );

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting trivia question endpoint: {}", addr);
    tracing::info!("Available APIs:");
    tracing::info!("  POST /questions");
    tracing::info!("  POST /");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        });
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
