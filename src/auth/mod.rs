use crate::state::AppState;
use axum::Router;

pub mod codec;
mod dto;
pub mod handlers;
pub mod jwt;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::router()
}
