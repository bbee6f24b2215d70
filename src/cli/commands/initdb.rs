use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use tracing::{debug, info, trace};

use crate::config::redact_database_url;

/// Applies every pending migration. Returns how many were applied.
pub async fn init_database(database_url: &str) -> Result<usize> {
    trace!("Entering init_database function");
    let target = redact_database_url(database_url);
    info!("Preparing schema in {}", target);

    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to database {}", target))?;

    let pending = Migrator::get_pending_migrations(&db)
        .await
        .context("Failed to read migration state")?;
    if pending.is_empty() {
        info!("Schema is already up to date");
        return Ok(0);
    }

    for migration in &pending {
        debug!("Pending migration {}", migration.name());
    }
    Migrator::up(&db, None)
        .await
        .context("Failed to apply migrations")?;

    info!("Applied {} migration(s)", pending.len());
    Ok(pending.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_database_applies_then_skips() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("ridy.db").display());

        let applied = init_database(&url).await.unwrap();
        assert_eq!(applied, Migrator::migrations().len());

        assert_eq!(init_database(&url).await.unwrap(), 0);
    }
}
