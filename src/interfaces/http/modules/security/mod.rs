//! IP allow-list, block-list and security statistics (admin only)

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
