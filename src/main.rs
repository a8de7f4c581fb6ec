//! Single-port gRPC/HTTP multiplexer (portmux).
//!
//! One listener, two traffic classes:
//!
//! ```text
//!                      ┌──────────────────────────────────────────┐
//!                      │                 PORTMUX                   │
//!     gRPC (h2c/TLS)   │  ┌─────────┐    ┌──────────┐   ┌───────┐ │
//!     ─────────────────┼─▶│   net   │───▶│   http   │──▶│  rpc  │ │
//!                      │  │listener │    │ dispatch │   │engine │ │
//!     GET /health      │  └─────────┘    └────┬─────┘   └───────┘ │
//!     ─────────────────┼──────────────────────┤                   │
//!                      │                 200 / 426 / 404          │
//!                      │  ┌────────────────────────────────────┐  │
//!                      │  │ config · health gate · lifecycle   │  │
//!                      │  └────────────────────────────────────┘  │
//!                      └──────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portmux::config::{load_config, MuxConfig};
use portmux::health;
use portmux::http::Server;

#[derive(Parser)]
#[command(name = "portmux")]
#[command(about = "Serve gRPC and plain HTTP on one port", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address from the config.
    #[arg(long)]
    bind: Option<String>,

    /// Serve TLS using this PEM certificate (requires --tls-key).
    #[arg(long, requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    /// PEM private key matching --tls-cert.
    #[arg(long, requires = "tls_cert")]
    tls_key: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portmux=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => MuxConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    // CLI cert/key flags win over the config file.
    let material = match (&args.tls_cert, &args.tls_key) {
        (Some(cert), Some(key)) => Some((std::fs::read(cert)?, std::fs::read(key)?)),
        _ => match &config.listener.tls {
            Some(tls) => Some((
                std::fs::read(&tls.cert_path)?,
                std::fs::read(&tls.key_path)?,
            )),
            None => None,
        },
    };
    let scheme = if material.is_some() { "https" } else { "http" };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = material.is_some(),
        tick_interval_ms = config.readiness.tick_interval_ms,
        startup_timeout_ms = config.readiness.startup_timeout_ms,
        "configuration loaded"
    );

    let server = Arc::new(Server::new(&config)?);

    let serve_task = {
        let server = server.clone();
        tokio::spawn(async move {
            match &material {
                Some((cert, key)) => server.serve_secure(cert, key).await,
                None => server.serve().await,
            }
        })
    };

    if let Err(err) = health::block_until_ready(&server, server.startup_timeout()).await {
        server.shutdown();
        let _ = serve_task.await;
        return Err(err.into());
    }

    tracing::info!(address = %format!("{scheme}://{}", server.local_addr()), "server ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    server.shutdown();
    match serve_task.await? {
        Ok(()) => tracing::info!("listener closed"),
        Err(err) => tracing::error!(error = %err, "serve failed"),
    }

    Ok(())
}
