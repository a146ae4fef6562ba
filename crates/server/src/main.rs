mod config;
mod http;
mod telemetry;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use api::{
    schema::{build_schema, schema_sdl, AppSchema},
    seed::seed_demo,
    store::{MemoryStore, RecordStore, SeaOrmStore},
    sync::StoreSync,
};
use clap::{Parser, Subcommand, ValueEnum};
use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use crate::{
    config::AppConfig,
    http::{build_router, serve, AppState},
    telemetry::{init_tracing, shutdown_tracing, TelemetryConfig},
};

const MEMORY_DATABASE_URL: &str = "sqlite::memory:";
const MEMORY_KEEP_ALIVE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Parser, Debug)]
#[command(name = "directory-server", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run HTTP server
    Serve {
        #[arg(long, env = "BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
        /// Keep accounts and employees in memory instead of DATABASE_URL
        #[arg(long)]
        memory: bool,
    },
    /// Run migrations
    Migrate {
        #[arg(long, value_enum, default_value_t = MigrateAction::Up)]
        action: MigrateAction,
    },
    /// Seed a demo account and demo employees
    Seed,
    /// Print GraphQL SDL
    PrintSchema,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MigrateAction {
    Up,
    Down,
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    init_tracing(TelemetryConfig::from_env()?)?;
    let result = run(cli.cmd).await;
    shutdown_tracing();
    result
}

async fn run(cmd: Cmd) -> anyhow::Result<()> {
    match cmd {
        Cmd::PrintSchema => {
            println!("{}", schema_sdl());
            Ok(())
        }
        Cmd::Migrate { action } => {
            let db = connect(config::database_url().as_str()).await?;
            match action {
                MigrateAction::Up => Migrator::up(&db, None).await?,
                MigrateAction::Down => Migrator::down(&db, None).await?,
                MigrateAction::Reset => Migrator::reset(&db).await?,
            }
            info!(?action, "migrations applied");
            Ok(())
        }
        Cmd::Seed => {
            let config = AppConfig::load()?;
            let db = connect(config.database_url.as_str()).await?;
            let sync = StoreSync::connect(Arc::new(SeaOrmStore::new(db.clone())))
                .await
                .context("loading employees")?;
            let seeded = seed_demo(&db, &config.auth, &sync)
                .await
                .context("seeding demo data")?;
            info!(
                account_created = seeded.user.is_some(),
                employees = seeded.employees.len(),
                "seed complete"
            );
            Ok(())
        }
        Cmd::Serve { bind, memory } => {
            let config = AppConfig::load()?;
            let db = if memory {
                connect(memory_options()).await?
            } else {
                connect(config.database_url.as_str()).await?
            };
            Migrator::up(&db, None)
                .await
                .context("running migrations")?;
            let store: Arc<dyn RecordStore> = if memory {
                Arc::new(MemoryStore::new())
            } else {
                Arc::new(SeaOrmStore::new(db.clone()))
            };
            let sync = Arc::new(
                StoreSync::connect(store)
                    .await
                    .context("loading employees")?,
            );
            let db = Arc::new(db);
            let auth = Arc::new(config.auth.clone());
            let AppSchema(schema) = build_schema(db.clone(), auth.clone(), sync);
            let router = build_router(AppState { schema, db, auth }, &config.cors_allowed_origins);
            info!(memory, "starting directory server");
            serve(bind, router).await
        }
    }
}

async fn connect(options: impl Into<ConnectOptions>) -> anyhow::Result<DatabaseConnection> {
    Database::connect(options)
        .await
        .context("connecting to database")
}

/// Each SQLite connection to `:memory:` opens its own empty database, so the
/// pool holds exactly one connection and never retires it.
fn memory_options() -> ConnectOptions {
    let mut options = ConnectOptions::new(MEMORY_DATABASE_URL);
    options
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(MEMORY_KEEP_ALIVE)
        .max_lifetime(MEMORY_KEEP_ALIVE);
    options
}
