//! Application layer: the access-control services.
//!
//! Every service is a cheap `Clone` over shared repositories, constructed
//! once per process by [`AccessServices::new`].

pub mod access_gate;
pub mod audit;
pub mod authorization;
pub mod context;
pub mod ip_policy;
pub mod lifecycle;
pub mod revocation;
pub mod session_registry;
pub mod token_authority;
pub mod users;

use std::sync::Arc;

pub use access_gate::AccessGate;
pub use audit::AuditTrail;
pub use authorization::AuthorizationGuard;
pub use context::ClientContext;
pub use ip_policy::{CountryCount, IpCount, IpPolicyService, SecurityStats};
pub use lifecycle::{LoginOutcome, SessionLifecycle, TokenStatus};
pub use revocation::RevocationLedger;
pub use session_registry::SessionRegistry;
pub use token_authority::TokenAuthority;
pub use users::{BulkAction, BulkOutcome, NewUserRequest, UserService};

use crate::domain::RepositoryProvider;
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::infrastructure::geo::GeoLocator;

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub bootstrap_username: String,
    pub stale_after: chrono::Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            bootstrap_username: crate::config::DEFAULT_ADMIN_USERNAME.to_string(),
            stale_after: chrono::Duration::hours(24),
        }
    }
}

/// All services wired over one repository provider
#[derive(Clone)]
pub struct AccessServices {
    pub repos: Arc<dyn RepositoryProvider>,
    pub tokens: TokenAuthority,
    pub ledger: RevocationLedger,
    pub registry: SessionRegistry,
    pub gate: AccessGate,
    pub guard: AuthorizationGuard,
    pub lifecycle: SessionLifecycle,
    pub users: UserService,
    pub ip_policy: IpPolicyService,
    pub audit: AuditTrail,
}

impl AccessServices {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        jwt: JwtConfig,
        geo: Arc<dyn GeoLocator>,
        settings: ServiceSettings,
    ) -> Self {
        let audit = AuditTrail::new(repos.clone());
        let tokens = TokenAuthority::new(jwt);
        let ledger = RevocationLedger::new(repos.clone());
        let registry = SessionRegistry::new(repos.clone(), ledger.clone());
        let gate = AccessGate::new(repos.clone(), geo.clone(), audit.clone());
        let guard = AuthorizationGuard::new(repos.clone());
        let lifecycle = SessionLifecycle::new(
            repos.clone(),
            tokens.clone(),
            ledger.clone(),
            registry.clone(),
            geo,
            audit.clone(),
            settings.stale_after,
        );
        let users = UserService::new(
            repos.clone(),
            registry.clone(),
            audit.clone(),
            settings.bootstrap_username,
        );
        let ip_policy = IpPolicyService::new(repos.clone(), audit.clone());

        Self {
            repos,
            tokens,
            ledger,
            registry,
            gate,
            guard,
            lifecycle,
            users,
            ip_policy,
            audit,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use sea_orm::DatabaseConnection;

    use super::*;
    use crate::config::AdminConfig;
    use crate::domain::UserTag;
    use crate::infrastructure::database::{test_database, SeaOrmRepositoryProvider};
    use crate::infrastructure::geo::StaticGeoLocator;

    pub fn jwt() -> JwtConfig {
        JwtConfig::new("unit-test-secret-0123456789", 24, "nts-test")
    }

    pub fn client() -> ClientContext {
        ClientContext::new("127.0.0.1", "unit-test")
    }

    /// Services over a fresh database holding the bootstrap admin
    /// (`Admin`/`Admin`) and one extra user.
    pub async fn services_with_user(
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> (AccessServices, DatabaseConnection) {
        let db = test_database().await;
        let repos = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        let services = AccessServices::new(
            repos,
            jwt(),
            Arc::new(StaticGeoLocator::new()),
            ServiceSettings::default(),
        );
        services
            .users
            .ensure_bootstrap(&AdminConfig::default(), false)
            .await
            .unwrap();
        services
            .users
            .create(
                NewUserRequest {
                    username: username.to_string(),
                    password: password.to_string(),
                    tag: UserTag::RZ,
                    is_admin,
                },
                "Admin",
            )
            .await
            .unwrap();
        (services, db)
    }
}
