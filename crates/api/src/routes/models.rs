//! Configured provider/model listing.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Model listing response.
#[derive(Serialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelInfo>,
}

/// One configured provider with its default model.
#[derive(Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub object: String,
    pub owned_by: String,
    pub default: bool,
}

/// List configured providers and their default models.
pub async fn list_models(State(state): State<AppState>) -> Json<ModelList> {
    let router = state.engine.router();
    let default_kind = router.default_kind();

    let data = router
        .configured()
        .into_iter()
        .map(|(kind, model)| ModelInfo {
            id: model.to_string(),
            object: "model".to_string(),
            owned_by: kind.to_string(),
            default: kind == default_kind,
        })
        .collect();

    Json(ModelList {
        object: "list".to_string(),
        data,
    })
}
