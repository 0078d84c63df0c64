//! Entry point for the `veil-gateway` HTTP server.

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use veil_core::{Clock, SystemClock};
use veil_gateway::{
    config::{Cli, Command, Settings},
    routes::create_router,
    state::AppState,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cli.settings).await,
        Command::MintToken => mint_token(&cli.settings),
    }
}

async fn serve(settings: Settings) {
    let authenticator = match settings.authenticator(Arc::new(SystemClock)) {
        Ok(a) => a,
        Err(e) => {
            tracing::error!(error = %e, "invalid authentication settings");
            std::process::exit(1);
        }
    };
    if !authenticator.is_configured() {
        tracing::warn!("API secret is not configured; every request will receive the decoy");
    }

    let executor = match settings.executor().await {
        Ok(e) => e,
        Err(e) => {
            tracing::error!(error = %e, "failed to open database executor");
            std::process::exit(1);
        }
    };
    if let Err(e) = executor.health_check().await {
        tracing::warn!(executor = executor.kind(), error = %e, "database health check failed");
    }

    let scheme = authenticator.scheme();
    let proof_headers = authenticator.allowed_headers();
    let executor_kind = executor.kind();
    let state = AppState::new(authenticator, executor).with_max_body_bytes(settings.max_body_bytes);
    let app = create_router(state);

    let addr = settings.listen_addr;
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    info!(
        addr = %addr,
        ?scheme,
        ?proof_headers,
        executor = executor_kind,
        "veil-gateway listening"
    );

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}

fn mint_token(settings: &Settings) {
    match settings.mint_headers(SystemClock.now_millis()) {
        Ok(headers) => {
            for (name, value) in headers {
                println!("{name}: {value}");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "cannot mint token");
            std::process::exit(1);
        }
    }
}
