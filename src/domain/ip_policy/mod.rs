//! IP allow-list / block-list aggregate

pub mod model;
pub mod repository;

pub use model::{
    canonical_ip, AccessDecision, AllowedIp, BlockedIp, NewAllowedIp, NewBlockedIp,
    DEFAULT_BLOCK_REASON,
};
pub use repository::IpPolicyRepository;
