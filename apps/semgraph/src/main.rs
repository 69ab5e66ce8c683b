//! # semgraph - Semantic Hypergraph Store
//!
//! The main binary for the semgraph recursive hyperedge store.
//!
//! This application provides:
//! - CLI interface for store operations
//! - HTTP REST API server (axum-based)
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │            apps/semgraph (THE BINARY)         │
//! │                                               │
//! │    ┌─────────────┐        ┌─────────────┐     │
//! │    │   CLI       │        │   HTTP API  │     │
//! │    │  (clap)     │        │   (axum)    │     │
//! │    └──────┬──────┘        └──────┬──────┘     │
//! │           └──────────┬───────────┘            │
//! │                      ▼                        │
//! │              ┌───────────────┐                │
//! │              │ semgraph-core │                │
//! │              │  (THE STORE)  │                │
//! │              └───────────────┘                │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! semgraph server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! semgraph add "(is/pd sky/c blue/c)"
//! semgraph match "(is/pd * ...)"
//! semgraph star sky/c --limit 10
//! ```

use clap::Parser;
use semgraph::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // SEMGRAPH_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("SEMGRAPH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "semgraph=info,semgraph_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  ┌─┐┌─┐┌┬┐┌─┐┬─┐┌─┐┌─┐┬ ┬
  └─┐├┤ ││││ ┬├┬┘├─┤├─┘├─┤
  └─┘└─┘┴ ┴└─┘┴└─┴ ┴┴  ┴ ┴

  Semantic Hypergraph Store v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
