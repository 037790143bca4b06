use crate::errors::AppError;
use crate::models::StoredRecord;
use crate::state::AppState;
use crate::ui::render_dashboard;
use axum::{extract::State, response::Html, Json};

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let records = load_records(&state).await?;
    Ok(Html(render_dashboard(&records)))
}

pub async fn get_records(State(state): State<AppState>) -> Result<Json<Vec<StoredRecord>>, AppError> {
    Ok(Json(load_records(&state).await?))
}

/// A missing table reads as an empty history rather than an error.
async fn load_records(state: &AppState) -> Result<Vec<StoredRecord>, AppError> {
    let store = state.store.lock().await;
    if !store.table_exists()? {
        return Ok(Vec::new());
    }
    Ok(store.fetch_all()?)
}
