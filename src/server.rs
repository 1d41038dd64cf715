//! Server runtime
//!
//! [`ServerHandle`] owns the whole process lifecycle: metrics recorder,
//! database and migrations, bootstrap admin, startup sweep, the HTTP
//! listener and graceful shutdown.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::application::{AccessServices, ServiceSettings};
use crate::config::AppConfig;
use crate::domain::RepositoryProvider;
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::infrastructure::geo::{GeoLocator, IpApiLocator, StaticGeoLocator};
use crate::infrastructure::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};
use crate::interfaces::http::create_api_router;
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup
    pub auto_migrate: bool,
    /// Provision the bootstrap admin account if missing
    pub ensure_admin: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            ensure_admin: true,
        }
    }
}

/// Handle to a running server.
///
/// ```rust,no_run
/// use nts_server::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.shutdown_signal().wait().await;
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub services: AccessServices,
    pub config: AppConfig,
    /// Address the HTTP listener is bound to
    pub local_addr: SocketAddr,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

/// The global recorder can only be installed once per process; later
/// starts in the same process reuse it.
fn prometheus_handle() -> Option<PrometheusHandle> {
    static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("Prometheus metrics recorder installed");
                Some(handle)
            }
            Err(e) => {
                warn!(error = %e, "Prometheus recorder unavailable; /metrics disabled");
                None
            }
        })
        .clone()
}

fn geo_locator(config: &AppConfig) -> Arc<dyn GeoLocator> {
    if !config.geo.enabled {
        info!("Geolocation disabled");
        return Arc::new(StaticGeoLocator::new());
    }
    match IpApiLocator::new(&config.geo) {
        Ok(locator) => {
            info!(base_url = %config.geo.base_url, "Geolocation enabled");
            Arc::new(locator)
        }
        Err(e) => {
            warn!(error = %e, "Failed to build geolocation client; locations will be Unknown");
            Arc::new(StaticGeoLocator::new())
        }
    }
}

impl ServerHandle {
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let config = opts.config;
        info!(version = env!("CARGO_PKG_VERSION"), "Starting NTS access server");

        let metrics_handle = prometheus_handle();

        let environment = config.security.environment;
        if config.security.jwt_secret.is_none() && !environment.is_production() {
            warn!("No JWT secret configured; using a random per-process secret (tokens will not survive a restart)");
        }
        let jwt = JwtConfig::new(
            config.resolve_jwt_secret()?,
            config.security.token_ttl_hours,
            config.security.jwt_issuer.clone(),
        );
        info!(ttl_hours = jwt.expiration_hours, "Token signing configured");

        let db = init_database(&DatabaseConfig::from(&config.database)).await?;
        if opts.auto_migrate {
            run_migrations(&db).await?;
        }

        let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        let services = AccessServices::new(
            repos,
            jwt,
            geo_locator(&config),
            ServiceSettings {
                bootstrap_username: config.admin.username.clone(),
                stale_after: chrono::Duration::hours(config.session.stale_after_hours),
            },
        );

        if opts.ensure_admin {
            let admin = services
                .users
                .ensure_bootstrap(&config.admin, environment.is_production())
                .await?;
            info!(username = %admin.username, "Bootstrap admin ready");
        }

        if config.session.sweep_on_startup {
            match services.lifecycle.sweep_stale().await {
                Ok(count) => info!(count, "Startup session sweep finished"),
                Err(e) => warn!(error = %e, "Startup session sweep failed"),
            }
        }

        let router = create_api_router(
            services.clone(),
            db.clone(),
            metrics_handle,
            config.server.trust_proxy_headers,
        );

        let listener = tokio::net::TcpListener::bind(config.address()).await?;
        let local_addr = listener.local_addr()?;
        info!("HTTP server listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let shutdown = ShutdownCoordinator::new(config.server.shutdown_timeout);
        let api_shutdown = shutdown.signal();
        let api_server = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("HTTP server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("HTTP server error: {}", e);
            }
        });

        Ok(Self {
            services,
            config,
            local_addr,
            db,
            shutdown,
            api_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Trigger shutdown on SIGINT / SIGTERM.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for in-flight requests (bounded by `server.shutdown_timeout`),
    /// then close the database.
    pub async fn wait(self) {
        let task = self.api_task;
        let drained = self
            .shutdown
            .drain(async move {
                if let Err(e) = task.await {
                    error!("HTTP server task panicked: {}", e);
                }
            })
            .await;
        if !drained {
            warn!("Abandoning in-flight requests");
        }

        if let Err(e) = self.db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("Database connection closed");
        }
        info!("Shutdown complete");
    }

    pub async fn shutdown(self) {
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Initialize tracing from the logging config. `RUST_LOG` overrides the
/// configured level. Calling it twice is harmless.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let result = match config.logging.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    };
    if result.is_err() {
        warn!("Tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.server.shutdown_timeout = 5;
        config.database.url = "sqlite::memory:".to_string();
        config.database.max_connections = 1;
        config.geo.enabled = false;
        config.security.jwt_secret = Some("server-test-secret-0123456789".to_string());
        config
    }

    #[tokio::test]
    async fn serves_health_and_login_then_shuts_down() {
        let handle = ServerHandle::start(ServerOptions {
            config: test_config(),
            ..Default::default()
        })
        .await
        .unwrap();
        assert!(handle.is_running());

        let base = format!("http://{}", handle.local_addr);
        let client = reqwest::Client::new();

        let health = client.get(format!("{}/health", base)).send().await.unwrap();
        assert_eq!(health.status(), 200);

        let login = client
            .post(format!("{}/login", base))
            .json(&serde_json::json!({"username": "Admin", "password": "Admin"}))
            .send()
            .await
            .unwrap();
        assert_eq!(login.status(), 200);
        let body: serde_json::Value = login.json().await.unwrap();
        assert!(body["token"].as_str().is_some());
        assert!(health_has_request_id(&client, &base).await);

        handle.shutdown().await;
    }

    async fn health_has_request_id(client: &reqwest::Client, base: &str) -> bool {
        client
            .get(format!("{}/health", base))
            .send()
            .await
            .map(|r| r.headers().contains_key("x-request-id"))
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn production_without_secret_refuses_to_start() {
        let mut config = test_config();
        config.security.jwt_secret = None;
        config.security.environment = crate::config::Environment::Production;
        let result = ServerHandle::start(ServerOptions {
            config,
            ..Default::default()
        })
        .await;
        assert!(result.is_err());
    }
}
