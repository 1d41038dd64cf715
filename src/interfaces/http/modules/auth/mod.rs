//! Login, token verification, logout and token status

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
