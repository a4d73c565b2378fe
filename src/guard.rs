use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};
use tracing::debug;

use crate::{
    entities::{role, user},
    error::{AppError, AppResult},
    models::{Action, Credentials},
};

pub const ADMIN_ROLE: &str = "admin";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AccessDecision {
    Granted,
    Unauthenticated,
    Forbidden(Action),
}

impl AccessDecision {
    pub fn into_result(self) -> AppResult<()> {
        match self {
            AccessDecision::Granted => Ok(()),
            AccessDecision::Unauthenticated => Err(AppError::Unauthenticated),
            AccessDecision::Forbidden(action) => Err(AppError::Forbidden(action)),
        }
    }
}

#[async_trait]
pub trait AccessGuard: Send + Sync {
    async fn authorize(
        &self,
        credentials: Option<&Credentials>,
        action: Action,
    ) -> AppResult<AccessDecision>;
}

pub struct PlaintextGuard {
    db: DatabaseConnection,
}

impl PlaintextGuard {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccessGuard for PlaintextGuard {
    async fn authorize(
        &self,
        credentials: Option<&Credentials>,
        action: Action,
    ) -> AppResult<AccessDecision> {
        let Some(credentials) = credentials else {
            return Ok(AccessDecision::Unauthenticated);
        };

        let role_id = user::Entity::find()
            .select_only()
            .column(user::Column::RoleId)
            .filter(user::Column::Username.eq(credentials.username.as_str()))
            .filter(user::Column::Password.eq(credentials.password.as_str()))
            .into_tuple::<i32>()
            .one(&self.db)
            .await?;
        let Some(role_id) = role_id else {
            debug!(username = %credentials.username, "credentials rejected");
            return Ok(AccessDecision::Unauthenticated);
        };

        let role_type = role::Entity::find_by_id(role_id)
            .select_only()
            .column(role::Column::RoleType)
            .into_tuple::<String>()
            .one(&self.db)
            .await?;

        if role_type.as_deref() == Some(ADMIN_ROLE) {
            Ok(AccessDecision::Granted)
        } else {
            debug!(username = %credentials.username, ?role_type, ?action, "mutation forbidden");
            Ok(AccessDecision::Forbidden(action))
        }
    }
}
