//! Admin view and control of active sessions

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
