/**
 * Feedback Server Entry Point
 *
 * This is the main entry point for the feedback backend server.
 * It loads configuration from the environment, connects the database and
 * serves the public submission and admin API routes.
 */

use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = sitefeedback::backend::server::config::AppConfig::from_env();
    let port = config.port;

    let app = sitefeedback::backend::server::init::create_app(config).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting feedback server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    // ConnectInfo feeds the network-address backend the peer address.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
