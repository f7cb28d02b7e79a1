//! `books-list` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`   — connect to Postgres and start the API server.
//! - `migrate` — run pending database migrations.
//! - `schema`  — print the book entity description as JSON.
//!
//! Connection settings come from `DATABASE_URL` or the `PG_*` variables,
//! optionally via a `.env` file in the working directory.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use db::{BookRepository, DbConfig, BOOK_SCHEMA};

#[derive(Parser)]
#[command(name = "books-list", about = "Books CRUD API over Postgres", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the API server.
    Serve {
        #[arg(long, env = "BOOKS_BIND", default_value = api::DEFAULT_BIND)]
        bind: String,
        /// HTTP path serving the query endpoint.
        #[arg(long, env = "BOOKS_PATH", default_value = api::DEFAULT_PATH)]
        path: String,
        /// Apply pending migrations before serving.
        #[arg(long)]
        migrate: bool,
    },
    /// Run pending database migrations.
    Migrate,
    /// Print the entity schema as JSON.
    Schema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match &dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "Failed to read .env file"),
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind, path, migrate } => {
            let server_config =
                api::ServerConfig::new(&bind, &path).context("invalid server configuration")?;
            let db_config = DbConfig::from_env().context("invalid database configuration")?;

            let pool = db::pool::create_pool(&db_config)
                .await
                .context("failed to connect to database")?;
            if migrate {
                db::pool::run_migrations(&pool).await.context("migration failed")?;
            }

            info!("Starting API server on {bind}");
            let store = Arc::new(BookRepository::new(pool));
            api::serve(server_config, store).await?;
        }
        Command::Migrate => {
            let db_config = DbConfig::from_env().context("invalid database configuration")?;
            let pool = db::pool::create_pool(&db_config)
                .await
                .context("failed to connect to database")?;
            db::pool::run_migrations(&pool).await.context("migration failed")?;
            info!("Migrations applied successfully");
        }
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&BOOK_SCHEMA)?);
        }
    }

    Ok(())
}
