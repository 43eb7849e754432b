use std::io::BufRead;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{http::StatusCode, routing::get, Json, Router};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;

use nutrition::api::rest::openapi::ApiDoc;
use nutrition::config::NutritionConfig;
use nutrition::NutritionModule;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Module name under `modules:` in the configuration.
const MODULE_NAME: &str = "nutrition";

/// Nutrition tracker server - daily goals and food intake logging
#[derive(Parser)]
#[command(name = "nutrition-server")]
#[command(about = "Nutrition tracker server - daily goals and food intake logging")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
    /// Create missing database tables and exit
    Migrate,
    /// Read a password from stdin and print its hash for `app_user.password_hash`
    HashPassword,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let command = cli.command.unwrap_or(Commands::Run);
    if let Commands::HashPassword = command {
        return hash_password_from_stdin();
    }

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Nutrition server starting");

    match command {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config).await,
        Commands::Migrate => migrate(config).await,
        Commands::HashPassword => Ok(()),
    }
}

async fn build_module(config: &AppConfig) -> Result<(NutritionModule, NutritionConfig)> {
    let module_cfg: NutritionConfig = config.module_config(MODULE_NAME)?;
    let db = dbkit::build_db_handle(config.database_config())
        .await
        .context("Failed to set up database access")?;
    tracing::info!(dsn = db.dsn(), engine = ?db.engine(), "Database configured");
    match db.ping().await {
        Ok(()) => tracing::info!("Database reachable"),
        Err(e) => tracing::warn!(error = %e, "Database not reachable yet"),
    }

    let module = NutritionModule::new(Arc::new(db), module_cfg.clone());
    Ok((module, module_cfg))
}

async fn run_server(config: AppConfig) -> Result<()> {
    let (module, module_cfg) = build_module(&config).await?;

    // An unreachable database is not fatal: each request reports it on its own.
    if module_cfg.migrate_on_start {
        if let Err(e) = module.migrate().await {
            tracing::error!(error = %e, "Startup migrations failed; continuing");
        }
    }

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/openapi.json", get(openapi))
        .merge(module.router());
    // 0 disables the request timeout.
    if config.server.timeout_sec > 0 {
        app = app.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.timeout_sec),
        ));
    }
    let app = app.layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("Nutrition server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    // Validates DSN, engine and module settings without connecting.
    let _ = build_module(&config).await?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}

async fn migrate(config: AppConfig) -> Result<()> {
    let (module, _) = build_module(&config).await?;
    module.migrate().await?;
    println!("Schema is up to date");
    Ok(())
}

fn hash_password_from_stdin() -> Result<()> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        anyhow::bail!("empty password");
    }
    let hash = nutrition::domain::password::hash_password(password)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;
    println!("{hash}");
    Ok(())
}
