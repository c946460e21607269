use crate::state::AppState;
use axum::Router;

pub mod claims;
pub mod dto;
pub mod extractors;
pub mod gate;
pub mod handlers;
pub mod identity;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
