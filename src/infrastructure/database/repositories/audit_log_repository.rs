use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect,
    Set,
};

use crate::domain::{AuditLogRepository, LogLevel, NewLogEntry, SystemLogEntry};
use crate::infrastructure::database::entities::system_log;
use crate::shared::{page_window, DomainResult, PaginatedResult};

pub struct SeaOrmAuditLogRepository {
    db: DatabaseConnection,
}

impl SeaOrmAuditLogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditLogRepository for SeaOrmAuditLogRepository {
    async fn append(&self, entry: NewLogEntry) -> DomainResult<()> {
        system_log::ActiveModel {
            level: Set(entry.level.as_str().to_string()),
            message: Set(entry.message),
            username: Set(entry.username),
            ip_address: Set(entry.ip_address),
            timestamp: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    async fn list(&self, page: u32, limit: u32) -> DomainResult<PaginatedResult<SystemLogEntry>> {
        let (page, limit, offset) = page_window(Some(page), Some(limit), 50);
        let query = system_log::Entity::find()
            .order_by_desc(system_log::Column::Timestamp)
            .order_by_desc(system_log::Column::Id);

        let total = query.clone().count(&self.db).await?;
        let models = query
            .offset(offset)
            .limit(limit as u64)
            .all(&self.db)
            .await?;

        let items = models
            .into_iter()
            .map(|m| SystemLogEntry {
                id: m.id,
                level: LogLevel::parse(&m.level),
                message: m.message,
                username: m.username,
                ip_address: m.ip_address,
                timestamp: m.timestamp,
            })
            .collect();
        Ok(PaginatedResult::new(items, total, page, limit))
    }
}
