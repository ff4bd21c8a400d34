//! Reusable booking server runtime.
//!
//! Provides [`ServerHandle`] that encapsulates the full server lifecycle:
//! storage init, migrations, the allocation engine, REST API, idle lock
//! eviction, metrics, and graceful shutdown.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::application::{
    AllocationEngine, AvailabilityProjector, CapacityLedger, KeyedLocks, SharedAllocationEngine,
    SharedAvailabilityProjector,
};
use crate::config::{AppConfig, StorageBackend};
use crate::domain::RepositoryProvider;
use crate::infrastructure::crypto::ApiKeyRegistry;
use crate::infrastructure::storage::InMemoryRepositoryProvider;
use crate::infrastructure::{init_database, run_migrations, SeaOrmRepositoryProvider};
use crate::interfaces::http::{create_api_router, ApiDeps};
use crate::shared::retry::RetryConfig;
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};
use crate::shared::time::{SharedClock, SystemClock};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the booking service.
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Run database migrations on startup (default: true). Ignored for the
    /// in-memory backend.
    pub auto_migrate: bool,
    /// Clock used for "today" and pickup checks (default: local time).
    pub clock: SharedClock,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            clock: Arc::new(SystemClock),
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running booking service.
///
/// # Examples
///
/// ```rust,no_run
/// use foodtruck_booking::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     // ... wait for shutdown signal ...
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// Repository provider for data access.
    pub repos: Arc<dyn RepositoryProvider>,
    pub engine: SharedAllocationEngine,
    pub projector: SharedAvailabilityProjector,
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// Address the REST API is bound to (the real port when 0 was requested).
    pub local_addr: SocketAddr,

    db: Option<DatabaseConnection>,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

/// The global metrics recorder can only be installed once per process.
/// On restart (stop + start within the same process) it is reused.
fn prometheus_handle() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    if let Some(handle) = PROM_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("Prometheus metrics recorder installed");
    Ok(PROM_HANDLE.get_or_init(|| handle).clone())
}

impl ServerHandle {
    /// Start the service with the given options.
    ///
    /// This will:
    /// 1. Install Prometheus metrics recorder
    /// 2. Open the storage backend (and run migrations for SQLite)
    /// 3. Build the lock arena and ledger, and recompute today's and later
    ///    ledger rows from their reservations
    /// 4. Build the allocation engine and projector
    /// 5. Start the idle lock sweeper
    /// 6. Start REST API server (with Swagger UI)
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting foodtruck booking service...");

        let prometheus = prometheus_handle()?;

        // ── Storage ────────────────────────────────────────────
        type Storage = (Arc<dyn RepositoryProvider>, Option<DatabaseConnection>, &'static str);
        let (repos, db, backend): Storage =
            match app_cfg.database.backend {
                StorageBackend::Memory => {
                    warn!("Using in-memory storage; reservations are lost on restart");
                    let repos: Arc<dyn RepositoryProvider> =
                        Arc::new(InMemoryRepositoryProvider::new());
                    (repos, None, "memory")
                }
                StorageBackend::Sqlite => {
                    let db_config = app_cfg.database.to_database_config();
                    let db = init_database(&db_config).await?;
                    if opts.auto_migrate {
                        info!("Running database migrations...");
                        run_migrations(&db).await?;
                        info!("Migrations completed");
                    }
                    let repos: Arc<dyn RepositoryProvider> =
                        Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
                    (repos, Some(db), "sqlite")
                }
            };

        // ── Engine ─────────────────────────────────────────────
        let catalog = Arc::new(app_cfg.catalog()?);
        info!(locations = catalog.active().len(), "Location catalog loaded");

        let booking = &app_cfg.booking;
        let locks = Arc::new(KeyedLocks::new(booking.lock_timeout()));
        let ledger = Arc::new(CapacityLedger::new(
            repos.clone(),
            locks.clone(),
            opts.clock.clone(),
        ));
        let corrected = ledger.reconcile_from(opts.clock.today()).await?;
        if corrected > 0 {
            warn!(rows = corrected, "Ledger rows did not match their reservations and were corrected");
        }
        let engine = Arc::new(AllocationEngine::new(
            repos.clone(),
            ledger.clone(),
            catalog.clone(),
            opts.clock.clone(),
            booking.policy(),
        ));
        let projector = Arc::new(AvailabilityProjector::new(
            repos.clone(),
            ledger,
            catalog.clone(),
            opts.clock.clone(),
            booking.thresholds(),
        ));

        let api_keys = Arc::new(ApiKeyRegistry::new(&app_cfg.security.api_keys));
        if api_keys.is_empty() {
            warn!("No API keys configured; staff and admin routes will reject every request");
        }

        // ── Shutdown coordinator ───────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        // ── Background tasks ───────────────────────────────────
        locks.start_eviction(booking.lock_eviction_interval(), shutdown_signal.clone());

        // ── REST API server ────────────────────────────────────
        let api_router = create_api_router(ApiDeps {
            engine: engine.clone(),
            projector: projector.clone(),
            catalog,
            clock: opts.clock,
            repos: repos.clone(),
            api_keys,
            prometheus,
            backend,
            retry: RetryConfig::default(),
        });

        let api_addr = format!("{}:{}", app_cfg.server.host, app_cfg.server.port);
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API server listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_shutdown = shutdown_signal.clone();
        let api_server = axum::serve(listener, api_router.into_make_service())
            .with_graceful_shutdown(async move {
                api_shutdown.wait().await;
                info!("REST API server received shutdown signal");
            });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            repos,
            engine,
            projector,
            config: app_cfg,
            local_addr,
            db,
            shutdown,
            api_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking).
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the shutdown signal, then for in-flight requests to drain
    /// (bounded by `server.shutdown_timeout`).
    pub async fn wait(self) {
        let Self {
            db,
            shutdown,
            api_task,
            ..
        } = self;

        let finished = shutdown
            .shutdown_with_cleanup(|| async move {
                match api_task.await {
                    Ok(()) => info!("REST API server stopped"),
                    Err(e) => error!("REST API server task panicked: {}", e),
                }
                if let Some(db) = db {
                    if let Err(e) = db.close().await {
                        warn!("Error closing database connection: {}", e);
                    } else {
                        info!("Database connection closed");
                    }
                }
            })
            .await;

        if !finished {
            warn!("Some in-flight requests were abandoned");
        }
        info!("Foodtruck booking service shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("Shutting down foodtruck booking service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    /// Check if the server is still running.
    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`ServerHandle::start`]).
/// `RUST_LOG` takes precedence over `logging.level`.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn raw_get(addr: SocketAddr, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn starts_serves_and_stops_on_memory_backend() {
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".into();
        config.server.port = 0;
        config.server.shutdown_timeout = 5;
        config.database.backend = StorageBackend::Memory;

        let handle = ServerHandle::start(ServerOptions {
            config,
            ..ServerOptions::default()
        })
        .await
        .unwrap();
        assert!(handle.is_running());
        assert_ne!(handle.local_addr.port(), 0);

        let response = raw_get(handle.local_addr, "/health").await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.contains("\"backend\":\"memory\""));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn invalid_config_fails_fast() {
        let mut config = AppConfig::default();
        config.database.backend = StorageBackend::Memory;
        config.booking.limited_ratio = 0.1;
        config.booking.almost_full_ratio = 0.2;

        let result = ServerHandle::start(ServerOptions {
            config,
            ..ServerOptions::default()
        })
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn startup_corrects_ledger_drift_on_sqlite() {
        use crate::domain::inventory::{DailyInventory, LedgerKey};
        use crate::shared::time::FixedClock;

        let path = std::env::temp_dir().join(format!("booking-{}.db", uuid::Uuid::new_v4()));
        let path = path.to_string_lossy().to_string();
        let now = chrono::NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let key = LedgerKey::new("market", now.date());

        // A hold with no reservation behind it, as left by a crash.
        {
            let db = init_database(&crate::infrastructure::DatabaseConfig::sqlite(&path))
                .await
                .unwrap();
            run_migrations(&db).await.unwrap();
            let mut row = DailyInventory::new(key.clone(), now.and_utc());
            row.total_units = Some(10);
            row.reserved_units = 4;
            SeaOrmRepositoryProvider::new(db.clone())
                .inventory()
                .upsert(row)
                .await
                .unwrap();
            db.close().await.unwrap();
        }

        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".into();
        config.server.port = 0;
        config.database.backend = StorageBackend::Sqlite;
        config.database.path = path.clone();

        let handle = ServerHandle::start(ServerOptions {
            config,
            auto_migrate: true,
            clock: Arc::new(FixedClock::new(now)),
        })
        .await
        .unwrap();

        let row = handle.repos.inventory().find(&key).await.unwrap().unwrap();
        assert_eq!(row.reserved_units, 0);
        assert_eq!(row.total_units, Some(10));

        handle.shutdown().await;
        let _ = std::fs::remove_file(&path);
    }
}
