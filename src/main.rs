use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use upload_relay::config::UploadConfig;
use upload_relay::{AppState, create_app};

/// Streaming multipart upload server with throttled progress events
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory uploaded files are written to (overrides DOWNLOADS_DIR)
    #[arg(long)]
    downloads_dir: Option<PathBuf>,

    /// Minimum milliseconds between progress events (overrides MESSAGE_TIME_DELAY_MS)
    #[arg(long)]
    message_time_delay_ms: Option<u64>,

    /// Bind host (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "upload_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = UploadConfig::from_env();
    if let Some(dir) = args.downloads_dir {
        config.downloads_dir = dir;
    }
    if let Some(ms) = args.message_time_delay_ms {
        config.message_time_delay = Duration::from_millis(ms);
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    info!("🚀 Starting upload relay...");

    tokio::fs::create_dir_all(&config.downloads_dir).await?;
    info!(
        "📂 Downloads: {}, progress every {:?}, max upload {}MB",
        config.downloads_dir.display(),
        config.message_time_delay,
        config.max_upload_size / 1024 / 1024
    );

    let bind = (config.host.clone(), config.port);
    let app = create_app(AppState::new(config)).layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            })
            .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                info!("📥 {} {}", request.method(), request.uri());
            })
            .on_response(
                |response: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 _span: &tracing::Span| {
                    info!(
                        "📤 Finished in {:?} with status {}",
                        latency,
                        response.status()
                    );
                },
            ),
    );

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("✅ Server ready at http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
