use crate::errors::AppError;
use crate::models::{
    ClockResponse, HomeworkResponse, PreferenceUpdateResponse, ScheduleResponse, TextRequest,
    ToggleRequest,
};
use crate::preferences::{PrefKey, Preferences};
use crate::state::AppState;
use crate::ui::render_popup;
use axum::{extract::State, http::StatusCode, response::Html, Json};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    state.view.open().await;
    Html(render_popup(&state.view.snapshot().await))
}

pub async fn get_schedule(State(state): State<AppState>) -> Json<ScheduleResponse> {
    Json(state.view.schedule().await)
}

pub async fn refresh_schedule(State(state): State<AppState>) -> Json<ScheduleResponse> {
    state.view.refresh_calendar().await;
    Json(state.view.schedule().await)
}

pub async fn get_homework(State(state): State<AppState>) -> Json<HomeworkResponse> {
    Json(state.view.homework().await)
}

pub async fn refresh_homework(State(state): State<AppState>) -> Json<HomeworkResponse> {
    state.view.refresh_homework().await;
    Json(state.view.homework().await)
}

pub async fn get_preferences(State(state): State<AppState>) -> Json<Preferences> {
    Json(state.view.preferences().await)
}

pub async fn toggle_preference(
    State(state): State<AppState>,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<PreferenceUpdateResponse>, AppError> {
    let key = parse_key(&payload.key)?;
    let write = state.view.toggle(key).await?;

    Ok(Json(PreferenceUpdateResponse {
        key: key.as_str().to_string(),
        value: serde_json::Value::Bool(write.value),
        persisted: write.persisted.is_ok(),
    }))
}

pub async fn set_preference_text(
    State(state): State<AppState>,
    Json(payload): Json<TextRequest>,
) -> Result<Json<PreferenceUpdateResponse>, AppError> {
    let key = parse_key(&payload.key)?;
    let write = state.view.set_text(key, payload.value).await?;

    Ok(Json(PreferenceUpdateResponse {
        key: key.as_str().to_string(),
        value: serde_json::Value::String(write.value),
        persisted: write.persisted.is_ok(),
    }))
}

pub async fn inject(State(state): State<AppState>) -> StatusCode {
    state.view.spawn_injection();
    StatusCode::ACCEPTED
}

pub async fn get_clock(State(state): State<AppState>) -> Json<ClockResponse> {
    Json(ClockResponse {
        time: state.view.clock_display(),
    })
}

fn parse_key(value: &str) -> Result<PrefKey, AppError> {
    PrefKey::parse(value.trim())
        .ok_or_else(|| AppError::bad_request(format!("unknown preference '{}'", value.trim())))
}
