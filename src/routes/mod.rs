use axum::{routing::get, Router};

use crate::state::AppState;

pub mod health;
pub mod notices;
pub mod rent_records;
pub mod tenants;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .merge(tenants::router())
        .merge(notices::router())
        .merge(rent_records::router())
}
