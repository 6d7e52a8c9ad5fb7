//! pdfpatch Server
//!
//! HTTP front end for the overlay engine. Documents travel in the request
//! body and are processed in memory; nothing is written to disk.
//!
//! - `GET  /api/health`
//! - `POST /api/pdf/info` page count and page boxes
//! - `POST /api/pdf/mutate` base64 JSON in, base64 JSON out
//! - `POST /api/pdf/mutate/upload` multipart in, `application/pdf` out

use std::net::SocketAddr;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use pdfpatch_core::{FailurePolicy, MutationOptions, UnsupportedCharPolicy};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;
mod state;

use api::{handle_health, handle_info, handle_mutate, handle_mutate_upload};
use state::AppState;

/// Command-line arguments for the pdfpatch server
#[derive(Parser, Debug)]
#[command(name = "pdfpatch-server")]
#[command(about = "HTTP service for in-place PDF text overlays")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PDFPATCH_PORT", default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "PDFPATCH_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Maximum documents processed at once
    #[arg(long, env = "PDFPATCH_MAX_JOBS", default_value = "4")]
    max_jobs: usize,

    /// Processing timeout in milliseconds
    #[arg(long, env = "PDFPATCH_TIMEOUT_MS", default_value = "30000")]
    timeout_ms: u64,

    /// Maximum request body size in megabytes
    #[arg(long, env = "PDFPATCH_MAX_UPLOAD_MB", default_value = "50")]
    max_upload_mb: usize,

    /// Abort the whole batch on the first failing directive
    #[arg(long, env = "PDFPATCH_ABORT_ON_ERROR")]
    abort_on_error: bool,

    /// Fail directives whose text WinAnsiEncoding cannot represent
    #[arg(long, env = "PDFPATCH_REJECT_UNSUPPORTED")]
    reject_unsupported: bool,

    /// Flate-compress overlay streams
    #[arg(long, env = "PDFPATCH_COMPRESS")]
    compress: bool,

    /// Wrap original page content in q/Q before overlaying
    #[arg(long, env = "PDFPATCH_ISOLATE")]
    isolate: bool,

    /// Enable verbose logging
    #[arg(short, long, env = "PDFPATCH_VERBOSE")]
    verbose: bool,
}

impl Args {
    fn mutation_options(&self) -> MutationOptions {
        MutationOptions {
            failure_policy: if self.abort_on_error {
                FailurePolicy::Abort
            } else {
                FailurePolicy::Continue
            },
            unsupported_chars: if self.reject_unsupported {
                UnsupportedCharPolicy::Reject
            } else {
                UnsupportedCharPolicy::Substitute
            },
            compress_overlays: self.compress,
            isolate_page_state: self.isolate,
        }
    }
}

fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/api/health", get(handle_health))
        .route("/api/pdf/info", post(handle_info))
        .route("/api/pdf/mutate", post(handle_mutate))
        .route("/api/pdf/mutate/upload", post(handle_mutate_upload))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting pdfpatch server on {}:{}", args.host, args.port);

    let options = args.mutation_options();
    let state = AppState::new(args.max_jobs, args.timeout_ms, options.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state, args.max_upload_mb * 1024 * 1024).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Max concurrent jobs: {}", args.max_jobs);
    info!("Processing timeout: {}ms", args.timeout_ms);
    info!("Default options: {:?}", options);

    axum::serve(listener, app).await?;

    Ok(())
}
