//! fiscus - personal-finance transaction service
//!
//! Boot sequence: command line, tracing, bootstrap sidecar, store
//! connection, registry install, optional backup restore, HTTP serve.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tower_http::timeout::TimeoutLayer;
use tracing::info;

use fiscus::{bootstrap, build_router, db, restore, AppState};

/// Personal-finance transaction service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long, value_name = "HOST:PORT", default_value = "127.0.0.1:9121")]
    bind: String,

    /// HTTP i/o timeout in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 60)]
    timeout: u64,

    /// Batch size for store i/o and pull limits
    #[arg(long, value_name = "ROWS", default_value_t = 1000)]
    batch: i64,

    /// Optional backup archive to restore on boot
    #[arg(long, value_name = "FILE")]
    restore: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("starting fiscus v{}", env!("CARGO_PKG_VERSION"));

    let state_path = bootstrap::state_path();
    let mut boot = bootstrap::awake(&state_path)?;

    let (pool, driver) = db::connect().await?;

    // an ephemeral store starts empty every boot, no matter what the
    // sidecar remembers
    if driver == "ephemeral" || !boot.is_registry_installed {
        db::install(&pool).await?;

        if !boot.is_registry_installed {
            boot.is_registry_installed = true;
            bootstrap::save(&state_path, &boot)?;
        }
        info!("installed registry schema on {driver} database");
    } else {
        info!("registry has been previously installed");
    }

    if let Some(archive) = &args.restore {
        if boot.last_backup_restored == archive.display().to_string() {
            info!("request to restore backup is ignored to avoid data overwrite");
        } else {
            restore::restore(&pool, args.batch as usize, archive).await?;
            boot.last_backup_restored = archive.display().to_string();
            bootstrap::save(&state_path, &boot)?;
            info!("restored backup from {}", archive.display());
        }
    }

    boot.stamp(driver);
    boot.last_known_process_id = std::process::id();
    boot.last_successful_start = chrono::Utc::now().timestamp();
    bootstrap::save(&state_path, &boot)?;

    let state = AppState::new(pool, args.batch, boot);
    let app = build_router(state).layer(TimeoutLayer::new(Duration::from_secs(args.timeout)));

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    info!(
        "ready to serve HTTP requests on {} (timeout {}s)",
        args.bind, args.timeout
    );

    axum::serve(listener, app).await?;

    Ok(())
}
