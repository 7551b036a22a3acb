// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::http::HeaderName;
use clap::Parser;
use server::{config::Config, routes};
use tower_http::cors::{Any, CorsLayer};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::parse();
    tracing::info!("Starting up the server with {:?}", config);

    let storage = match config.build_storage().await {
        Ok(storage) => {
            tracing::info!("Storage backend is ready.");
            storage
        }
        Err(e) => {
            tracing::error!("Failed to initialise the storage backend: {:?}", e);
            std::process::exit(1);
        }
    };

    let app_routes = routes::create_router(storage);

    let cors = CorsLayer::new()
        .allow_methods(Any)
        // Explicit list of headers the frontend sends.
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
        ])
        .allow_origin(Any);

    let app = app_routes.layer(cors); // Apply the CORS layer

    tracing::info!("The server listens on http://{}", config.bind);

    let listener = match tokio::net::TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {:?}", config.bind, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {:?}", e);
        std::process::exit(1);
    }
}
