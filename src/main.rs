//! annoroute demo server.
//!
//! ```text
//!   config.toml ──▶ AppConfig ──▶ RouteRegistry ◀── register!(..) per controller
//!                                      │
//!                                      ▼ build
//!                                 RouteTable ──▶ axum Router ──▶ HttpServer
//! ```
//!
//! Controllers live under `src/{version}/{module}/controller/`; the
//! directory names become the version and module of their routes.

mod api;
mod application;

use std::path::PathBuf;

use clap::Parser;

use annoroute::config::load_or_default;
use annoroute::{lifecycle, observability, RouteRegistry};

#[derive(Parser)]
#[command(name = "annoroute")]
#[command(about = "Annotation routed demo server", long_about = None)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Trace every route registration and print the route table.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_or_default(cli.config.as_deref())?;
    if cli.debug {
        config.routing.debug = true;
    }
    observability::init(&config.logging, config.routing.debug);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.server.bind_address,
        root_path = %config.routing.root_path,
        "annoroute starting"
    );

    let mut registry = RouteRegistry::new(config.routing.clone());
    application::register(&mut registry);
    api::register(&mut registry);

    lifecycle::serve(config, registry).await
}
