#[cfg(test)]
pub mod test_utils {
    use std::sync::Arc;

    use crate::config::AppConfig;
    use crate::rate_limit::RateLimits;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use argon2::Params;
    use axum::Router;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};
    use service::content_store::MemoryContentStore;
    use service::password::PasswordService;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing, with uploads kept in memory and cheap
    /// Argon2 parameters
    pub async fn setup_test_app_state(config: AppConfig) -> AppState {
        let db = setup_test_db().await;
        let params = Params::new(Params::MIN_M_COST, 1, 1, None).expect("valid argon2 params");

        AppState {
            db,
            rate_limits: RateLimits::new(config.global_rate_limit, config.login_rate_limit),
            content_store: Arc::new(MemoryContentStore::new(config.public_base_url.clone())),
            passwords: PasswordService::with_params(params),
            config: Arc::new(config),
        }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is taken from RUST_LOG, defaulting to WARN.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| level.parse::<Level>().ok())
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing with a custom configuration
    pub async fn setup_test_app_with(config: AppConfig) -> Router {
        let _guard = init_test_tracing();

        let state = setup_test_app_state(config).await;
        create_router(state)
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> Router {
        setup_test_app_with(AppConfig::with_database_url("sqlite::memory:")).await
    }
}
