//! HTTP REST API
//!
//! - `middleware`: access gate, bearer authentication, admin guard
//! - `modules`: handlers and DTOs per resource
//! - `router`: route table, layers and the OpenAPI document

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc};
