use crate::domain::GeoLocation;

/// Caller facts resolved by the access gate and attached to the request
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub ip: String,
    pub user_agent: String,
    /// Location already known for `ip`, if any
    pub geo: Option<GeoLocation>,
}

impl ClientContext {
    pub fn new(ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            user_agent: user_agent.into(),
            geo: None,
        }
    }
}
