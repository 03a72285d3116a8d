//! PDF splice server
//!
//! A web service for page-level PDF assembly:
//!
//! - Merge several uploaded PDFs into one document
//! - Split one PDF into per-range documents, bundled into a zip archive
//! - Serve the results as downloads that expire after a fixed window
//!
//! Uploads are transient: every input file is removed as soon as its pages
//! have been copied. Generated artifacts stay in the output directory until
//! their retention window passes, then a detached timer deletes them.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;
mod store;
mod upload;

use store::ArtifactStore;
use upload::UploadIntake;

/// Command-line arguments for the splice server
#[derive(Parser, Debug)]
#[command(name = "pdfsplice-server")]
#[command(about = "PDF merge/split service with self-expiring downloads")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Directory holding uploads while an operation runs
    #[arg(long, default_value = "uploads")]
    upload_dir: String,

    /// Directory holding generated artifacts until they expire
    #[arg(long, default_value = "results")]
    output_dir: String,

    /// Directory with the static front-end
    #[arg(long, default_value = "public")]
    public_dir: String,

    /// Seconds an artifact stays downloadable
    #[arg(long, default_value = "3600")]
    retention_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: ArtifactStore,
    pub intake: UploadIntake,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let retention = Duration::from_secs(args.retention_secs);
    let state = AppState {
        store: ArtifactStore::new(&args.output_dir, retention)?,
        intake: UploadIntake::new(&args.upload_dir)?,
    };

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .merge(api::router())
        .fallback_service(ServeDir::new(&args.public_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Upload dir: {}, output dir: {}", args.upload_dir, args.output_dir);
    info!("Artifact retention: {}s", args.retention_secs);

    axum::serve(listener, app).await?;

    Ok(())
}
