//! Audit trail
//!
//! Security-relevant transitions are appended to `system_logs`. Writing the
//! trail never fails the operation being audited; a failed append is only
//! reported through tracing.

use std::sync::Arc;

use tracing::error;

use crate::domain::{LogLevel, NewLogEntry, RepositoryProvider, SystemLogEntry};
use crate::shared::{DomainResult, PaginatedResult};

#[derive(Clone)]
pub struct AuditTrail {
    repos: Arc<dyn RepositoryProvider>,
}

impl AuditTrail {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn record(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        username: Option<&str>,
        ip: Option<&str>,
    ) {
        let entry = NewLogEntry {
            level,
            message: message.into(),
            username: username.map(str::to_string),
            ip_address: ip.map(str::to_string),
        };
        if let Err(e) = self.repos.audit_logs().append(entry).await {
            error!(error = %e, "Failed to write audit log entry");
        }
    }

    pub async fn info(&self, message: impl Into<String>, username: Option<&str>, ip: Option<&str>) {
        self.record(LogLevel::Info, message, username, ip).await
    }

    pub async fn warn(&self, message: impl Into<String>, username: Option<&str>, ip: Option<&str>) {
        self.record(LogLevel::Warn, message, username, ip).await
    }

    pub async fn error(&self, message: impl Into<String>, username: Option<&str>, ip: Option<&str>) {
        self.record(LogLevel::Error, message, username, ip).await
    }

    pub async fn list(&self, page: u32, limit: u32) -> DomainResult<PaginatedResult<SystemLogEntry>> {
        self.repos.audit_logs().list(page, limit).await
    }
}
