use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{parse_user_uuid, PasswordUpdateRequest, UserProfile, UserUpdateRequest},
    services,
};
use crate::{
    auth::extractors::CurrentIdentity, errors::AppError, state::AppState, validation::ValidJson,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route(
            "/user/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/password/:id", put(update_password))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    Ok(Json(services::list_users(&state).await?))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    let uuid = parse_user_uuid(&id)?;
    Ok(Json(services::get_user(&state, uuid).await?))
}

#[instrument(skip(state, identity, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UserUpdateRequest>,
) -> Result<(StatusCode, &'static str), AppError> {
    let uuid = parse_user_uuid(&id)?;
    info!(actor = identity.principal(), "updating user");
    services::update_user(&state, uuid, payload).await?;
    Ok((StatusCode::OK, "User updated"))
}

#[instrument(skip(state, identity, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<PasswordUpdateRequest>,
) -> Result<(StatusCode, &'static str), AppError> {
    let uuid = parse_user_uuid(&id)?;
    info!(actor = identity.principal(), "updating password");
    services::update_password(&state, uuid, payload).await?;
    Ok((StatusCode::OK, "Password updated"))
}

#[instrument(skip(state, identity))]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = parse_user_uuid(&id)?;
    info!(actor = identity.principal(), "deleting user");
    services::delete_user(&state, uuid).await?;
    Ok(StatusCode::NO_CONTENT)
}
