use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Alias, Expr, Order, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};

use crate::domain::{
    ActiveSessionView, DeactivateCriteria, GeoLocation, NewSession, Session, SessionRepository,
};
use crate::infrastructure::database::entities::{active_session, revoked_token, user};
use crate::shared::DomainResult;

use super::user_repository::tag_to_domain;

/// SQLite caps bound parameters per statement
const IN_CHUNK: usize = 500;

pub struct SeaOrmSessionRepository {
    db: DatabaseConnection,
}

impl SeaOrmSessionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn live() -> Select<active_session::Entity> {
        active_session::Entity::find().filter(active_session::Column::IsActive.eq(true))
    }
}

fn model_to_domain(m: active_session::Model) -> Session {
    Session {
        id: m.id,
        username: m.username,
        token: m.token,
        ip_address: m.ip,
        geo: GeoLocation {
            country: m.country,
            city: m.city,
            region: m.region,
            timezone: m.timezone,
        },
        user_agent: m.user_agent,
        login_time: m.login_time,
        last_activity: m.last_activity,
        is_active: m.is_active,
    }
}

#[async_trait]
impl SessionRepository for SeaOrmSessionRepository {
    async fn insert(&self, session: NewSession) -> DomainResult<Session> {
        let now = Utc::now();
        let row = active_session::ActiveModel {
            username: Set(session.username),
            token: Set(session.token),
            ip: Set(session.ip_address),
            country: Set(session.geo.country),
            city: Set(session.geo.city),
            region: Set(session.geo.region),
            timezone: Set(session.geo.timezone),
            user_agent: Set(session.user_agent),
            login_time: Set(now),
            last_activity: Set(now),
            is_active: Set(true),
            ..Default::default()
        };
        let model = row.insert(&self.db).await?;
        Ok(model_to_domain(model))
    }

    async fn touch(&self, token: &str, at: DateTime<Utc>) -> DomainResult<u64> {
        let result = active_session::Entity::update_many()
            .col_expr(active_session::Column::LastActivity, Expr::value(at))
            .filter(active_session::Column::Token.eq(token))
            .filter(active_session::Column::IsActive.eq(true))
            .filter(active_session::Column::LastActivity.lt(at))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn deactivate(&self, criteria: &DeactivateCriteria) -> DomainResult<u64> {
        let result = active_session::Entity::update_many()
            .col_expr(active_session::Column::IsActive, Expr::value(false))
            .filter(active_session::Column::IsActive.eq(true))
            .filter(criteria_condition(criteria))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn unrevoked_inactive_tokens(&self) -> DomainResult<Vec<String>> {
        let tokens = active_session::Entity::find()
            .filter(active_session::Column::IsActive.eq(false))
            .filter(
                active_session::Column::Token.not_in_subquery(
                    Query::select()
                        .column(revoked_token::Column::Token)
                        .from(revoked_token::Entity)
                        .to_owned(),
                ),
            )
            .select_only()
            .column(active_session::Column::Token)
            .into_tuple::<String>()
            .all(&self.db)
            .await?;
        Ok(tokens)
    }

    async fn find_by_token(&self, token: &str) -> DomainResult<Option<Session>> {
        let model = active_session::Entity::find()
            .filter(active_session::Column::Token.eq(token))
            .one(&self.db)
            .await?;
        Ok(model.map(model_to_domain))
    }

    async fn list_active(&self) -> DomainResult<Vec<Session>> {
        let models = Self::live()
            .order_by_desc(active_session::Column::LastActivity)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn latest_active_per_user(&self) -> DomainResult<Vec<ActiveSessionView>> {
        let newer = Alias::new("newer");
        // Newest live session of the outer row's user; id breaks timestamp ties.
        let newest_of_user = Query::select()
            .column((newer.clone(), active_session::Column::Id))
            .from_as(active_session::Entity, newer.clone())
            .and_where(
                Expr::col((newer.clone(), active_session::Column::Username))
                    .equals((active_session::Entity, active_session::Column::Username)),
            )
            .and_where(Expr::col((newer.clone(), active_session::Column::IsActive)).eq(true))
            .order_by((newer.clone(), active_session::Column::LastActivity), Order::Desc)
            .order_by((newer, active_session::Column::Id), Order::Desc)
            .limit(1)
            .to_owned();

        let latest: Vec<Session> = Self::live()
            .filter(
                Expr::col((active_session::Entity, active_session::Column::Id))
                    .in_subquery(newest_of_user),
            )
            .filter(
                active_session::Column::Username.in_subquery(
                    Query::select()
                        .column(user::Column::Username)
                        .from(user::Entity)
                        .to_owned(),
                ),
            )
            .order_by_desc(active_session::Column::LastActivity)
            .all(&self.db)
            .await?
            .into_iter()
            .map(model_to_domain)
            .collect();
        if latest.is_empty() {
            return Ok(Vec::new());
        }

        let names: Vec<&str> = latest.iter().map(|s| s.username.as_str()).collect();
        let mut owners: HashMap<String, user::Model> = HashMap::new();
        for chunk in names.chunks(IN_CHUNK) {
            let users = user::Entity::find()
                .filter(user::Column::Username.is_in(chunk.iter().copied()))
                .all(&self.db)
                .await?;
            owners.extend(users.into_iter().map(|u| (u.username.clone(), u)));
        }

        Ok(latest
            .into_iter()
            .filter_map(|session| {
                let owner = owners.get(&session.username)?;
                Some(ActiveSessionView {
                    user_id: owner.id,
                    tag: owner.tag.map(tag_to_domain),
                    session,
                })
            })
            .collect())
    }
}

/// Row filter for one deactivation request
fn criteria_condition(criteria: &DeactivateCriteria) -> Condition {
    let matching = match criteria {
        DeactivateCriteria::Token(token) => active_session::Column::Token.eq(token.as_str()),
        DeactivateCriteria::User(username) => active_session::Column::Username.eq(username.as_str()),
        DeactivateCriteria::AllExceptBootstrap => active_session::Column::Username.not_in_subquery(
            Query::select()
                .column(user::Column::Username)
                .from(user::Entity)
                .and_where(user::Column::IsBootstrap.eq(true))
                .to_owned(),
        ),
        DeactivateCriteria::StaleBefore(cutoff) => active_session::Column::LastActivity.lt(*cutoff),
    };
    Condition::all().add(matching)
}
