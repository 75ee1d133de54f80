//! Application state management.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use vigil_audit::{default_analyzers, AuditOrchestrator, AuditService, HttpFetcher, PageFetcher};
use vigil_core::AppConfig;
use vigil_db::Database;
use vigil_report::{RandomTokenIssuer, ReportPublisher, ReportReader, TokenIssuer};
use vigil_scoring::ScorePolicyV1;

/// Everything a command needs, wired once at startup.
pub struct AppState {
    /// Effective configuration
    pub config: AppConfig,
    /// Shared database handle
    pub db: Arc<Database>,
    /// Queue front-end
    pub service: AuditService,
    /// Public report lookups
    pub reader: ReportReader,
}

impl AppState {
    /// Load configuration, open and migrate the database, and wire the
    /// pipeline with the real HTTP fetcher.
    pub async fn load() -> Result<Self> {
        let config = AppConfig::load_with_env().context("failed to load configuration")?;

        let db_path = config
            .database_path()
            .context("failed to resolve database path")?;
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        info!("Database: {}", db_path.display());

        let db = Database::with_max_connections(&db_path, config.database.max_connections)
            .await
            .context("failed to open database")?;
        db.run_migrations().await.context("failed to run migrations")?;

        let fetcher = HttpFetcher::new(&config.fetcher).context("failed to build HTTP client")?;
        Ok(Self::build(config, Arc::new(db), Arc::new(fetcher)))
    }

    /// Wire the pipeline over an already migrated database.
    #[must_use]
    pub fn build(config: AppConfig, db: Arc<Database>, fetcher: Arc<dyn PageFetcher>) -> Self {
        let issuer: Arc<dyn TokenIssuer> = Arc::new(RandomTokenIssuer);

        let mut orchestrator = AuditOrchestrator::new(
            Arc::clone(&db),
            fetcher,
            default_analyzers(),
            Arc::new(ScorePolicyV1::new()),
        );
        if config.publish.enabled {
            let publisher = ReportPublisher::new(Arc::clone(&db), Arc::clone(&issuer))
                .with_ttl_days(config.publish.ttl_days);
            orchestrator = orchestrator.with_publisher(Arc::new(publisher));
        }

        let service = AuditService::new(Arc::clone(&db), Arc::new(orchestrator));
        let reader = ReportReader::new(Arc::clone(&db), issuer);

        Self {
            config,
            db,
            service,
            reader,
        }
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.db.pool().close().await;
    }
}
