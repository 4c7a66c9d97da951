//! Command-line migration runner.

use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use fleetmaint_api::{config, db, logging, migrator::Migrator};

#[derive(Parser)]
#[command(name = "migrate", about = "Run database migrations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending migrations (optionally only the next N)
    Up {
        #[arg(short, long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations (default: the last one)
    Down {
        #[arg(short, long, default_value_t = 1)]
        steps: u32,
    },
    /// Drop everything and re-apply all migrations
    Fresh,
    /// Show the status of every migration
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config()?;
    logging::init_tracing(&cfg);

    let pool = db::establish_connection_from_app_config(&cfg).await?;

    match cli.command {
        Command::Up { steps } => {
            Migrator::up(&pool, steps).await?;
            info!("Migrations applied");
        }
        Command::Down { steps } => {
            Migrator::down(&pool, Some(steps)).await?;
            info!("Migrations rolled back");
        }
        Command::Fresh => {
            Migrator::fresh(&pool).await?;
            info!("Database recreated from scratch");
        }
        Command::Status => {
            Migrator::status(&pool).await?;
        }
    }

    db::close_pool(pool).await?;
    Ok(())
}
