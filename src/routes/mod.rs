use axum::{routing::get, Router};

use crate::state::AppState;

pub mod availability;
pub mod catalog;
pub mod health;
pub mod quotes;
pub mod seasons;

pub fn v1_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .merge(availability::router())
        .merge(catalog::router())
        .merge(quotes::router())
        .merge(seasons::router())
}
