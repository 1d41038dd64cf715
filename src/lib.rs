//! # NTS Access Server
//!
//! Token authentication, session lifecycle and IP access control for the
//! NTS credential service.
//!
//! ## Architecture
//!
//! - **domain**: entities, value types and repository traits
//! - **application**: token authority, revocation ledger, session registry,
//!   access gate, authorization guard, session lifecycle, user and IP
//!   policy administration, audit trail
//! - **infrastructure**: JWT and bcrypt, SeaORM persistence, geolocation
//! - **interfaces**: axum HTTP API with Swagger documentation
//! - **shared**: error taxonomy, pagination, shutdown coordination

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use infrastructure::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};

pub use interfaces::http::create_api_router;
