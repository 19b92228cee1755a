use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route(
            "/api/challenges",
            get(handlers::list_challenges).post(handlers::create_challenge),
        )
        .route("/api/challenges/stats", get(handlers::get_stats))
        .route(
            "/api/challenges/:id",
            get(handlers::get_challenge)
                .put(handlers::update_challenge)
                .delete(handlers::delete_challenge),
        )
        .route(
            "/api/challenges/:id/certify",
            axum::routing::post(handlers::certify).delete(handlers::uncertify),
        )
        .route("/api/challenges/:id/calendar", get(handlers::get_calendar))
        .with_state(state)
}
