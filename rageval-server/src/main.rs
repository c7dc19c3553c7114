use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use rageval::EvaluationConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod models;
mod state;

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "rageval-server")]
#[command(about = "Retrieval evaluation over HTTP")]
struct Args {
    /// Listen address
    #[arg(long, env = "RAGEVAL_ADDR", default_value = "0.0.0.0:3000")]
    addr: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,rageval=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = Arc::new(AppState {
        defaults: Arc::new(EvaluationConfig::default()),
    });

    let app = Router::new()
        .route("/health", get(api::health_check))
        .route("/v1/metrics", get(api::list_metrics))
        .route("/v1/evaluate", post(api::evaluate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    tracing::info!("rageval server listening on {}", args.addr);

    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
