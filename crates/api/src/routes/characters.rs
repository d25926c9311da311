//! Character CRUD routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use database::models::{Character, CharacterData};
use database::character;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::state::AppState;

/// List all characters.
pub async fn list_characters(State(state): State<AppState>) -> Result<Json<Vec<Character>>> {
    let characters = character::list_characters(state.db.pool()).await?;
    Ok(Json(characters))
}

/// Create a character.
pub async fn create_character(
    State(state): State<AppState>,
    Json(data): Json<CharacterData>,
) -> Result<(StatusCode, Json<Character>)> {
    let id = Uuid::new_v4().to_string();
    let created = character::create_character(state.db.pool(), &id, &data).await?;

    info!(character = %created.id, name = %created.name, "Character created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a character by ID.
pub async fn get_character(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Character>> {
    let found = character::get_character(state.db.pool(), &id).await?;
    Ok(Json(found))
}

/// Update a character.
pub async fn update_character(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(data): Json<CharacterData>,
) -> Result<Json<Character>> {
    let updated = character::update_character(state.db.pool(), &id, &data).await?;

    info!(character = %id, "Character updated");
    Ok(Json(updated))
}

/// Delete a character.
pub async fn delete_character(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    character::delete_character(state.db.pool(), &id).await?;

    info!(character = %id, "Character deleted");
    Ok(StatusCode::NO_CONTENT)
}
