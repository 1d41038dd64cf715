//! Session aggregate
//!
//! One row per issued token. Rows are deactivated, never deleted.

pub mod model;
pub mod repository;

pub use model::{ActiveSessionView, DeactivateCriteria, GeoLocation, NewSession, Session};
pub use repository::SessionRepository;
