use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::domain::{CreateUserDto, GetUserDto, User, UserRepository, UserRole, UserSortField, UserTag};
use crate::infrastructure::database::entities::user;
use crate::shared::{page_window, DomainResult, PaginatedResult};

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn role_to_domain(role: user::UserRole) -> UserRole {
    match role {
        user::UserRole::Admin => UserRole::Admin,
        user::UserRole::Standard => UserRole::Standard,
    }
}

fn role_to_entity(role: UserRole) -> user::UserRole {
    match role {
        UserRole::Admin => user::UserRole::Admin,
        UserRole::Standard => user::UserRole::Standard,
    }
}

pub(crate) fn tag_to_domain(tag: user::UserTag) -> UserTag {
    match tag {
        user::UserTag::Rz => UserTag::RZ,
        user::UserTag::Lb => UserTag::LB,
        user::UserTag::Kr => UserTag::KR,
    }
}

fn tag_to_entity(tag: UserTag) -> user::UserTag {
    match tag {
        UserTag::RZ => user::UserTag::Rz,
        UserTag::LB => user::UserTag::Lb,
        UserTag::KR => user::UserTag::Kr,
    }
}

fn model_to_domain(model: user::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        password_hash: model.password_hash,
        role: role_to_domain(model.role),
        tag: model.tag.map(tag_to_domain),
        is_bootstrap: model.is_bootstrap,
        created_at: model.created_at,
    }
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn create(&self, dto: CreateUserDto) -> DomainResult<User> {
        let new_user = user::ActiveModel {
            username: Set(dto.username),
            password_hash: Set(dto.password_hash),
            role: Set(role_to_entity(dto.role)),
            tag: Set(dto.tag.map(tag_to_entity)),
            is_bootstrap: Set(dto.is_bootstrap),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let model = new_user.insert(&self.db).await?;
        Ok(model_to_domain(model))
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?;
        Ok(model.map(model_to_domain))
    }

    async fn find_bootstrap(&self) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::IsBootstrap.eq(true))
            .one(&self.db)
            .await?;
        Ok(model.map(model_to_domain))
    }

    async fn list(&self, dto: GetUserDto) -> DomainResult<PaginatedResult<User>> {
        let (page, limit, offset) = page_window(dto.page, dto.limit, 20);

        let mut query = user::Entity::find();

        if let Some(ref search) = dto.search {
            query = query.filter(user::Column::Username.contains(search));
        }
        if let Some(tag) = dto.tag {
            query = query.filter(user::Column::Tag.eq(tag_to_entity(tag)));
        }

        let column = match dto.sort_by {
            UserSortField::Username => user::Column::Username,
            UserSortField::Tag => user::Column::Tag,
            UserSortField::CreatedAt => user::Column::CreatedAt,
        };
        query = if dto.descending {
            query.order_by_desc(column)
        } else {
            query.order_by_asc(column)
        };
        query = query.order_by_asc(user::Column::Id);

        let total = query.clone().count(&self.db).await?;

        let models = query
            .offset(offset)
            .limit(limit as u64)
            .all(&self.db)
            .await?;

        let items = models.into_iter().map(model_to_domain).collect();
        Ok(PaginatedResult::new(items, total, page, limit))
    }

    async fn set_tag(&self, username: &str, tag: Option<UserTag>) -> DomainResult<bool> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::Tag, Expr::value(tag.map(tag_to_entity)))
            .filter(user::Column::Username.eq(username))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn set_role(&self, username: &str, role: UserRole) -> DomainResult<bool> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::Role, Expr::value(role_to_entity(role)))
            .filter(user::Column::Username.eq(username))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn mark_bootstrap(&self, username: &str) -> DomainResult<()> {
        user::Entity::update_many()
            .col_expr(user::Column::IsBootstrap, Expr::value(false))
            .filter(user::Column::Username.ne(username))
            .filter(user::Column::IsBootstrap.eq(true))
            .exec(&self.db)
            .await?;

        user::Entity::update_many()
            .col_expr(user::Column::IsBootstrap, Expr::value(true))
            .col_expr(user::Column::Role, Expr::value(user::UserRole::Admin))
            .filter(user::Column::Username.eq(username))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn delete(&self, username: &str) -> DomainResult<bool> {
        let result = user::Entity::delete_many()
            .filter(user::Column::Username.eq(username))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::test_database;
    use crate::shared::DomainError;

    fn dto(username: &str, tag: Option<UserTag>) -> CreateUserDto {
        CreateUserDto {
            username: username.to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::Standard,
            tag,
            is_bootstrap: false,
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let repo = SeaOrmUserRepository::new(test_database().await);
        repo.create(dto("alice", Some(UserTag::RZ))).await.unwrap();
        let err = repo.create(dto("alice", None)).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn tag_and_role_updates() {
        let repo = SeaOrmUserRepository::new(test_database().await);
        repo.create(dto("alice", Some(UserTag::RZ))).await.unwrap();

        assert!(repo.set_tag("alice", Some(UserTag::KR)).await.unwrap());
        assert!(repo.set_role("alice", UserRole::Admin).await.unwrap());
        assert!(!repo.set_tag("nobody", None).await.unwrap());

        let alice = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.tag, Some(UserTag::KR));
        assert!(alice.is_admin());

        assert!(repo.set_tag("alice", None).await.unwrap());
        let alice = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.tag, None);
    }

    #[tokio::test]
    async fn bootstrap_marker_is_unique() {
        let repo = SeaOrmUserRepository::new(test_database().await);
        repo.create(dto("first", None)).await.unwrap();
        repo.create(dto("second", None)).await.unwrap();

        repo.mark_bootstrap("first").await.unwrap();
        repo.mark_bootstrap("second").await.unwrap();

        let boot = repo.find_bootstrap().await.unwrap().unwrap();
        assert_eq!(boot.username, "second");
        assert!(boot.is_admin());
        let first = repo.find_by_username("first").await.unwrap().unwrap();
        assert!(!first.is_bootstrap);
    }

    #[tokio::test]
    async fn list_filters_and_paginates() {
        let repo = SeaOrmUserRepository::new(test_database().await);
        for name in ["alice", "alina", "bob"] {
            repo.create(dto(name, Some(UserTag::LB))).await.unwrap();
        }
        repo.create(dto("carol", Some(UserTag::KR))).await.unwrap();

        let page = repo
            .list(GetUserDto {
                search: Some("ali".into()),
                sort_by: UserSortField::Username,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].username, "alice");

        let page = repo
            .list(GetUserDto {
                tag: Some(UserTag::LB),
                limit: Some(2),
                page: Some(2),
                sort_by: UserSortField::Username,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].username, "bob");
    }

    #[tokio::test]
    async fn delete_reports_absence() {
        let repo = SeaOrmUserRepository::new(test_database().await);
        repo.create(dto("alice", None)).await.unwrap();
        assert!(repo.delete("alice").await.unwrap());
        assert!(!repo.delete("alice").await.unwrap());
    }
}
