use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::{codec::PasswordCodec, jwt::AuthUser};
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::{
    MessageResponse, StatsResponse, UpdateAddressRequest, UpdateEmailRequest, UpdateNameRequest,
    UpdatePasswordRequest, UpdatePhoneRequest, UpdateUsernameRequest, UserResponse, UsersResponse,
};
use crate::users::services::UserService;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/update-username/:id", post(update_username))
        .route("/update-name/:id", post(update_name))
        .route("/update-email/:id", post(update_email))
        .route("/update-password/:id", post(update_password))
        .route("/update-phone/:id", post(update_phone))
        .route("/update-address/:id", post(update_address))
        .route("/delete/:id", post(delete_user))
        .route("/find/:id", get(get_user))
        .route("/", get(get_users))
        .route("/stats", get(get_users_stats))
}

fn service(state: &AppState) -> UserService {
    UserService::new(
        state.store.clone(),
        PasswordCodec::new(&state.config.pass_secret),
    )
}

#[instrument(skip(state, auth, payload))]
async fn update_username(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUsernameRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    auth.require_self_or_admin(id)?;
    let user = service(&state)
        .update_username(id, &payload.username, &payload.password)
        .await?;
    Ok(Json(UserResponse { user }))
}

#[instrument(skip(state, auth, payload))]
async fn update_name(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNameRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    auth.require_self_or_admin(id)?;
    let user = service(&state)
        .update_name(id, &payload.name, &payload.password)
        .await?;
    Ok(Json(UserResponse { user }))
}

#[instrument(skip(state, auth, payload))]
async fn update_email(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEmailRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    auth.require_self_or_admin(id)?;
    let user = service(&state)
        .update_email(id, &payload.email, &payload.password)
        .await?;
    Ok(Json(UserResponse { user }))
}

#[instrument(skip(state, auth, payload))]
async fn update_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    auth.require_self_or_admin(id)?;
    let user = service(&state)
        .update_password(
            id,
            &payload.old_password,
            &payload.new_password,
            &payload.confirm_password,
        )
        .await?;
    Ok(Json(UserResponse { user }))
}

#[instrument(skip(state, auth, payload))]
async fn update_phone(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePhoneRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    auth.require_self_or_admin(id)?;
    let user = service(&state)
        .update_phone(id, &payload.phone, &payload.password)
        .await?;
    Ok(Json(UserResponse { user }))
}

#[instrument(skip(state, auth, payload))]
async fn update_address(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAddressRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    auth.require_self_or_admin(id)?;
    let user = service(&state)
        .update_address(id, &payload.address, &payload.password)
        .await?;
    Ok(Json(UserResponse { user }))
}

#[instrument(skip(state, auth))]
async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    auth.require_self_or_admin(id)?;
    service(&state).delete_user(id).await?;
    Ok(Json(MessageResponse {
        msg: "user deleted",
    }))
}

#[instrument(skip(state, auth))]
async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    auth.require_self_or_admin(id)?;
    let user = service(&state).get_user(id).await?;
    Ok(Json(UserResponse { user }))
}

#[instrument(skip(state, auth))]
async fn get_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UsersResponse>, ApiError> {
    auth.require_admin()?;
    let users = service(&state).list_users().await?;
    Ok(Json(UsersResponse { users }))
}

#[instrument(skip(state, auth))]
async fn get_users_stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<StatsResponse>, ApiError> {
    auth.require_admin()?;
    let stats = service(&state).users_stats().await?;
    Ok(Json(StatsResponse { stats }))
}
