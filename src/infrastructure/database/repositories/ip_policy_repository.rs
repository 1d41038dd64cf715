use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::domain::{AllowedIp, BlockedIp, IpPolicyRepository, NewAllowedIp, NewBlockedIp};
use crate::infrastructure::database::entities::{allowed_ip, blocked_ip};
use crate::shared::DomainResult;

pub struct SeaOrmIpPolicyRepository {
    db: DatabaseConnection,
}

impl SeaOrmIpPolicyRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn allowed_to_domain(m: allowed_ip::Model) -> AllowedIp {
    AllowedIp {
        id: m.id,
        ip_address: m.ip_address,
        country: m.country,
        description: m.description,
        created_at: m.created_at,
        is_active: m.is_active,
    }
}

fn blocked_to_domain(m: blocked_ip::Model) -> BlockedIp {
    BlockedIp {
        id: m.id,
        ip_address: m.ip_address,
        reason: m.reason,
        blocked_at: m.blocked_at,
        blocked_by: m.blocked_by,
        is_active: m.is_active,
    }
}

#[async_trait]
impl IpPolicyRepository for SeaOrmIpPolicyRepository {
    async fn is_blocked(&self, ip: &str) -> DomainResult<bool> {
        let count = blocked_ip::Entity::find()
            .filter(blocked_ip::Column::IpAddress.eq(ip))
            .filter(blocked_ip::Column::IsActive.eq(true))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn is_allowed(&self, ip: &str) -> DomainResult<bool> {
        let count = allowed_ip::Entity::find()
            .filter(allowed_ip::Column::IpAddress.eq(ip))
            .filter(allowed_ip::Column::IsActive.eq(true))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn count_allowed(&self) -> DomainResult<u64> {
        Ok(allowed_ip::Entity::find()
            .filter(allowed_ip::Column::IsActive.eq(true))
            .count(&self.db)
            .await?)
    }

    async fn count_blocked(&self) -> DomainResult<u64> {
        Ok(blocked_ip::Entity::find()
            .filter(blocked_ip::Column::IsActive.eq(true))
            .count(&self.db)
            .await?)
    }

    async fn list_allowed(&self) -> DomainResult<Vec<AllowedIp>> {
        let models = allowed_ip::Entity::find()
            .order_by_desc(allowed_ip::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(allowed_to_domain).collect())
    }

    async fn add_allowed(&self, entry: NewAllowedIp) -> DomainResult<AllowedIp> {
        let row = allowed_ip::ActiveModel {
            ip_address: Set(entry.ip_address),
            country: Set(entry.country),
            description: Set(entry.description),
            created_at: Set(Utc::now()),
            is_active: Set(true),
            ..Default::default()
        };
        Ok(allowed_to_domain(row.insert(&self.db).await?))
    }

    async fn remove_allowed(&self, id: i32) -> DomainResult<bool> {
        let result = allowed_ip::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn list_blocked(&self) -> DomainResult<Vec<BlockedIp>> {
        let models = blocked_ip::Entity::find()
            .order_by_desc(blocked_ip::Column::BlockedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(blocked_to_domain).collect())
    }

    async fn add_blocked(&self, entry: NewBlockedIp) -> DomainResult<BlockedIp> {
        let row = blocked_ip::ActiveModel {
            ip_address: Set(entry.ip_address),
            reason: Set(entry.reason),
            blocked_at: Set(Utc::now()),
            blocked_by: Set(entry.blocked_by),
            is_active: Set(true),
            ..Default::default()
        };
        Ok(blocked_to_domain(row.insert(&self.db).await?))
    }

    async fn find_blocked(&self, id: i32) -> DomainResult<Option<BlockedIp>> {
        let model = blocked_ip::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(blocked_to_domain))
    }

    async fn remove_blocked(&self, id: i32) -> DomainResult<bool> {
        let result = blocked_ip::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}
