//! Registration, login and profile endpoints

use api_types::user::{Login, LoginResponse, UserCreated, UserNew, UserPatch, UserView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{User, UserChanges};

use crate::{JsonBody, ServerError, server::ServerState};

fn user_view(user: User) -> UserView {
    UserView {
        name: user.name,
        username: user.username,
        foraneo: user.foraneo,
    }
}

pub async fn register(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<UserNew>,
) -> Result<(StatusCode, Json<UserCreated>), ServerError> {
    let id = state
        .engine
        .register_user(&payload.name, &payload.username, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserCreated {
            message: "user created".to_string(),
            user_id: id.to_string(),
        }),
    ))
}

/// Exchange credentials for a bearer token.
pub async fn login(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<Login>,
) -> Result<Json<LoginResponse>, ServerError> {
    let user = state
        .engine
        .authenticate(&payload.username, &payload.password)
        .await?;
    let user_id = user.id.to_string();
    let token = state.issuer.issue(&user_id)?;
    tracing::info!(user_id = %user_id, "user logged in");

    Ok(Json(LoginResponse { token, user_id }))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<UserView>, ServerError> {
    let user = state.engine.user(&id).await?;

    Ok(Json(user_view(user)))
}

pub async fn patch(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UserPatch>,
) -> Result<Json<UserView>, ServerError> {
    let changes = UserChanges {
        name: payload.name,
        username: payload.username,
        foraneo: payload.foraneo,
    };
    let user = state.engine.update_user(&id, changes).await?;

    Ok(Json(user_view(user)))
}
