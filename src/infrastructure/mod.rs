//! Infrastructure layer - external concerns

pub mod crypto;
pub mod database;
pub mod geo;

pub use database::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};
pub use geo::{GeoLocator, IpApiLocator, StaticGeoLocator};
