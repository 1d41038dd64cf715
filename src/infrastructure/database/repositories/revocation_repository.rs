use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};

use crate::domain::{RevocationRepository, RevokedToken};
use crate::infrastructure::database::entities::revoked_token;
use crate::shared::DomainResult;

pub struct SeaOrmRevocationRepository {
    db: DatabaseConnection,
}

impl SeaOrmRevocationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RevocationRepository for SeaOrmRevocationRepository {
    async fn insert(&self, token: &str) -> DomainResult<bool> {
        let row = revoked_token::ActiveModel {
            token: Set(token.to_string()),
            revoked_at: Set(Utc::now()),
            ..Default::default()
        };

        let inserted = revoked_token::Entity::insert(row)
            .on_conflict(
                OnConflict::column(revoked_token::Column::Token)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(inserted > 0)
    }

    async fn contains(&self, token: &str) -> DomainResult<bool> {
        let count = revoked_token::Entity::find()
            .filter(revoked_token::Column::Token.eq(token))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn find(&self, token: &str) -> DomainResult<Option<RevokedToken>> {
        let model = revoked_token::Entity::find()
            .filter(revoked_token::Column::Token.eq(token))
            .one(&self.db)
            .await?;
        Ok(model.map(|m| RevokedToken {
            token: m.token,
            revoked_at: m.revoked_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::test_database;

    #[tokio::test]
    async fn insert_is_idempotent() {
        let repo = SeaOrmRevocationRepository::new(test_database().await);

        assert!(!repo.contains("tok").await.unwrap());
        assert!(repo.insert("tok").await.unwrap());
        assert!(!repo.insert("tok").await.unwrap());
        assert!(repo.contains("tok").await.unwrap());

        let row = repo.find("tok").await.unwrap().unwrap();
        assert_eq!(row.token, "tok");
        assert!(repo.find("other").await.unwrap().is_none());
    }
}
