use sea_orm::{ActiveValue, QueryFilter, SqlErr, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, User, UserChanges,
    password::{hash_password, verify_password},
    users,
    util::normalize_required,
};

use super::{Engine, with_tx};

fn user_not_found() -> EngineError {
    EngineError::KeyNotFound("user".to_string())
}

/// The unique index on `username` has the last word: a write that loses a
/// race against another registration or rename is a duplicate handle.
fn handle_conflict(username: &str, err: DbErr) -> EngineError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => EngineError::ExistingKey(username.to_string()),
        _ => err.into(),
    }
}

impl Engine {
    /// Register a user and return its id.
    ///
    /// The handle is stored trimmed and must not be taken.
    pub async fn register_user(
        &self,
        name: &str,
        username: &str,
        password: &str,
    ) -> ResultEngine<Uuid> {
        let name = normalize_required(name, "name")?;
        let username = normalize_required(username, "username")?;
        if password.is_empty() {
            return Err(EngineError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }
        let password = hash_password(password)?;

        let id = Uuid::new_v4();
        with_tx!(self, |db_tx| {
            users::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                username: ActiveValue::Set(username.clone()),
                password: ActiveValue::Set(password),
                name: ActiveValue::Set(name),
                foraneo: ActiveValue::Set(false),
            }
            .insert(&db_tx)
            .await
            .map_err(|err| handle_conflict(&username, err))?;
            tracing::info!(user_id = %id, username = %username, "user registered");
            Ok(id)
        })
    }

    /// Check a username/password pair.
    ///
    /// Unknown handle and wrong password are the same error.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<User> {
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(username.trim()))
            .one(&self.database)
            .await?
            .ok_or(EngineError::InvalidCredentials)?;

        if !verify_password(password, &model.password)? {
            return Err(EngineError::InvalidCredentials);
        }
        User::try_from(model)
    }

    pub async fn user(&self, id: &str) -> ResultEngine<User> {
        let model = users::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(user_not_found)?;
        User::try_from(model)
    }

    /// Apply allow-listed profile changes.
    pub async fn update_user(&self, id: &str, changes: UserChanges) -> ResultEngine<User> {
        let name = changes
            .name
            .as_deref()
            .map(|name| normalize_required(name, "name"))
            .transpose()?;
        let username = changes
            .username
            .as_deref()
            .map(|username| normalize_required(username, "username"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let model = users::Entity::find_by_id(id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(user_not_found)?;
            if changes.is_empty() {
                return User::try_from(model);
            }

            if let Some(username) = username.as_deref()
                && username != model.username
            {
                let taken = users::Entity::find()
                    .filter(users::Column::Username.eq(username))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if taken {
                    return Err(EngineError::ExistingKey(username.to_string()));
                }
            }

            let mut active: users::ActiveModel = model.into();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(username) = username.as_deref() {
                active.username = ActiveValue::Set(username.to_string());
            }
            if let Some(foraneo) = changes.foraneo {
                active.foraneo = ActiveValue::Set(foraneo);
            }
            let model = active.update(&db_tx).await.map_err(|err| match username.as_deref() {
                Some(username) => handle_conflict(username, err),
                None => err.into(),
            })?;
            tracing::debug!(user_id = %model.id, "user profile updated");

            User::try_from(model)
        })
    }
}
