use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::instrument;

use crate::auth::{
    codec::PasswordCodec,
    dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
    jwt::JwtKeys,
    services::{AuthService, RegisterInput},
};
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

fn service(state: &AppState) -> AuthService {
    AuthService::new(
        state.store.clone(),
        PasswordCodec::new(&state.config.pass_secret),
        JwtKeys::from_ref(state),
    )
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let user = service(&state)
        .register(RegisterInput {
            username: payload.username,
            name: payload.name,
            email: payload.email,
            password: payload.password,
            phone: payload.phone,
            address: payload.address,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { user })))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let outcome = service(&state)
        .login(&payload.email, &payload.password)
        .await?;
    Ok(Json(LoginResponse {
        user: outcome.user,
        access_token: outcome.access_token,
    }))
}
