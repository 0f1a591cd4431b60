use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/schedule", get(handlers::get_schedule))
        .route("/api/schedule/refresh", post(handlers::refresh_schedule))
        .route("/api/homework", get(handlers::get_homework))
        .route("/api/homework/refresh", post(handlers::refresh_homework))
        .route("/api/preferences", get(handlers::get_preferences))
        .route("/api/preferences/toggle", post(handlers::toggle_preference))
        .route("/api/preferences/text", post(handlers::set_preference_text))
        .route("/api/inject", post(handlers::inject))
        .route("/api/clock", get(handlers::get_clock))
        .with_state(state)
}
