use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod commands;

use crate::config::AppConfig;
use commands::{init_database, migrate_and_serve, serve};

#[derive(Parser)]
#[command(name = "ridy")]
#[command(about = "Ridy delivery backend: web server and database tools")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        #[command(flatten)]
        config: AppConfig,
    },
    /// Initialize the database using migrations
    ///
    /// For SQLite, append `?mode=rwc` so the file is created if missing.
    InitDb {
        /// Database URL
        #[arg(short, long, env = "DATABASE_URL")]
        database_url: String,
    },
    /// Apply pending migrations, then start the web server
    MigrateAndServe {
        #[command(flatten)]
        config: AppConfig,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Serve { config } => {
                serve(config).await?;
            }
            Commands::InitDb { database_url } => {
                init_database(&database_url).await?;
            }
            Commands::MigrateAndServe { config } => {
                migrate_and_serve(config).await?;
            }
        }
        Ok(())
    }
}
