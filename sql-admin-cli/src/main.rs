use std::io::IsTerminal;
use std::net::SocketAddr;

use axum::{extract::State, http::StatusCode, routing::get, Router};
use clap::{Parser, Subcommand};
use sql_admin::{
    AdminController, ClientOptions, LocalAdminApi, PostgresProvider, SqlAdminLayer,
    SqliteProvider,
};
use thiserror::Error;
use tower_http::cors::CorsLayer;

use crate::database::Backend;

mod database;
mod shell;

const DEFAULT_DATABASE_URL: &str = "sqlite:sql-admin.db?mode=rwc";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Admin(#[from] sql_admin::Error),

    #[error("unsupported database URL: {0} (expected sqlite: or postgres://)")]
    UnsupportedUrl(String),

    #[error("--seed only applies to SQLite databases")]
    SeedUnsupported,
}

/// CLI entry point wrapper.
#[derive(Parser, Debug)]
#[command(name = "sql-admin", version, about = "Schema-driven admin client for SQL databases")]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the admin API for a database
    Serve(ServeArgs),
    /// Browse and edit tables from the terminal
    Shell(ShellArgs),
}

#[derive(Parser, Debug)]
struct ServeArgs {
    #[arg(long, env = "SQL_ADMIN_DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    database_url: String,

    #[arg(long, env = "SQL_ADMIN_LISTEN", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// Path the admin API is mounted under; the API lives at `<base-path>/api`
    #[arg(long, env = "SQL_ADMIN_BASE_PATH", default_value = "/sql-admin")]
    base_path: String,

    /// Create and fill demo tables (SQLite only)
    #[arg(long)]
    seed: bool,
}

#[derive(Parser, Debug)]
struct ShellArgs {
    /// Base URL of a running server, e.g. `http://127.0.0.1:3000/sql-admin`
    #[arg(long, env = "SQL_ADMIN_SERVER")]
    server: Option<String>,

    /// Open a database directly instead of going through a server
    #[arg(long, env = "SQL_ADMIN_DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    database_url: String,

    #[arg(long, default_value_t = sql_admin::schema::DEFAULT_PAGE_LIMIT)]
    page_limit: u64,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    // Enable ANSI colors only when stdout is a terminal and NO_COLOR is unset.
    let ansi = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    tracing_subscriber::fmt()
        .with_ansi(ansi)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let args = Args::parse();
    match args.cmd {
        Command::Serve(args) => serve(args).await,
        Command::Shell(args) => run_shell(args, ansi).await,
    }
}

async fn serve(args: ServeArgs) -> Result<(), CliError> {
    let backend = database::connect(&args.database_url).await?;

    if args.seed {
        match &backend {
            Backend::Sqlite(pool) => database::setup(pool).await?,
            Backend::Postgres(_) => return Err(CliError::SeedUnsupported),
        }
    }

    let admin = match &backend {
        Backend::Sqlite(pool) => SqlAdminLayer::sqlite(&args.base_path, pool.clone()).into_router(),
        Backend::Postgres(pool) => {
            SqlAdminLayer::postgres(&args.base_path, pool.clone()).into_router()
        }
    };

    // The admin router is stateless, so it is merged after with_state()
    let app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .with_state(backend)
        .merge(admin)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    let address = listener.local_addr()?;
    tracing::info!(%address, base_path = %args.base_path, "sql-admin listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "failed to listen for ctrl-c");
    }
}

async fn run_shell(args: ShellArgs, ansi: bool) -> Result<(), CliError> {
    if let Some(server) = args.server {
        let options = ClientOptions {
            base_url: server,
            page_limit: args.page_limit,
        };
        return shell::run(AdminController::connect(&options)?, ansi).await;
    }

    match database::connect(&args.database_url).await? {
        Backend::Sqlite(pool) => {
            let api = LocalAdminApi::new(SqliteProvider::new(pool));
            shell::run(AdminController::with_page_limit(api, args.page_limit), ansi).await
        }
        Backend::Postgres(pool) => {
            let api = LocalAdminApi::new(PostgresProvider::new(pool));
            shell::run(AdminController::with_page_limit(api, args.page_limit), ansi).await
        }
    }
}

async fn root_handler() -> &'static str {
    "sql-admin server"
}

async fn health_handler(
    State(backend): State<Backend>,
) -> Result<(StatusCode, &'static str), StatusCode> {
    backend.ping().await.map_err(|error| {
        tracing::warn!(%error, "health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok((StatusCode::OK, "Server is healthy"))
}
