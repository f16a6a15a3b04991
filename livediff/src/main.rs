// Copyright 2026 The Livediff Project
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use livediff::audit::TracingAuditSink;
use livediff::config::{self, ConfigSource, DEFAULT_LOG_LEVEL};
use livediff::differ::FileDiffer;
use livediff::server::{self, AppDeps};
use tracing_subscriber::EnvFilter;

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "livediff", about = "Serve a live HTML diff of two files")]
struct Cli {
    /// Original file
    #[arg(env = "LIVEDIFF_FILE1")]
    file1: Option<String>,

    /// Modified file
    #[arg(env = "LIVEDIFF_FILE2")]
    file2: Option<String>,

    /// Path to a livediff.yaml config file
    #[arg(long, env = "LIVEDIFF_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides server.host)
    #[arg(long, env = "LIVEDIFF_HOST")]
    host: Option<IpAddr>,

    /// Port to listen on (overrides server.port)
    #[arg(long, env = "LIVEDIFF_PORT")]
    port: Option<u16>,
}

fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let source: Box<dyn ConfigSource> = match cli.config {
        Some(path) => Box::new(config::FileSource { path }),
        None => Box::new(config::DefaultSource),
    };
    let loaded = config::load_config(source.as_ref());

    let log_level = loaded
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
    init_tracing(&log_level);
    livediff::error::install_panic_hook();

    let mut config = match loaded {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(source = %source.describe(), "failed to load config: {e}");
            std::process::exit(1);
        }
    };

    if cli.file1.is_some() {
        config.files.file1 = cli.file1;
    }
    if cli.file2.is_some() {
        config.files.file2 = cli.file2;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let request = config.diff_request();
    if !request.is_complete() {
        tracing::warn!("file paths not configured; / will answer 400 until both are set");
    }

    tracing::info!(
        source = %source.describe(),
        file1 = ?request.file1(),
        file2 = ?request.file2(),
        execution = ?config.diff.execution,
        cors = config.server.cors,
        "config loaded"
    );

    let app = server::build_router(AppDeps {
        computer: Arc::new(FileDiffer),
        request,
        execution: config.diff.execution,
        audit: Arc::new(TracingAuditSink),
        cors: config.server.cors,
    });

    let addr = config.server.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%addr, "failed to bind: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "livediff listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}
