//! Lorebook and lore entry CRUD routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use database::lorebook;
use database::models::{LoreEntryData, LoreEntryRow, LorebookData, LorebookRow};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::state::AppState;

/// A lorebook together with its entries.
#[derive(Serialize)]
pub struct LorebookDetail {
    #[serde(flatten)]
    pub lorebook: LorebookRow,
    pub entries: Vec<LoreEntryRow>,
}

/// List all lorebooks.
pub async fn list_lorebooks(State(state): State<AppState>) -> Result<Json<Vec<LorebookRow>>> {
    let books = lorebook::list_lorebooks(state.db.pool()).await?;
    Ok(Json(books))
}

/// Create a lorebook.
pub async fn create_lorebook(
    State(state): State<AppState>,
    Json(data): Json<LorebookData>,
) -> Result<(StatusCode, Json<LorebookRow>)> {
    let id = Uuid::new_v4().to_string();
    let created = lorebook::create_lorebook(state.db.pool(), &id, &data).await?;

    info!(lorebook = %created.id, name = %created.name, "Lorebook created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a lorebook with its entries.
pub async fn get_lorebook(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LorebookDetail>> {
    let pool = state.db.pool();
    let book = lorebook::get_lorebook(pool, &id).await?;
    let entries = lorebook::list_entries(pool, &id).await?;

    Ok(Json(LorebookDetail {
        lorebook: book,
        entries,
    }))
}

/// Update a lorebook.
pub async fn update_lorebook(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(data): Json<LorebookData>,
) -> Result<Json<LorebookRow>> {
    let updated = lorebook::update_lorebook(state.db.pool(), &id, &data).await?;

    info!(lorebook = %id, "Lorebook updated");
    Ok(Json(updated))
}

/// Delete a lorebook and its entries.
pub async fn delete_lorebook(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    lorebook::delete_lorebook(state.db.pool(), &id).await?;

    info!(lorebook = %id, "Lorebook deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// List entries in a lorebook.
pub async fn list_entries(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<LoreEntryRow>>> {
    let pool = state.db.pool();
    // 404 on a missing book rather than an empty list.
    lorebook::get_lorebook(pool, &id).await?;
    let entries = lorebook::list_entries(pool, &id).await?;
    Ok(Json(entries))
}

/// Create an entry in a lorebook.
pub async fn create_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(data): Json<LoreEntryData>,
) -> Result<(StatusCode, Json<LoreEntryRow>)> {
    let entry_id = Uuid::new_v4().to_string();
    let created = lorebook::create_entry(state.db.pool(), &id, &entry_id, &data).await?;

    info!(lorebook = %id, entry = %created.id, "Lore entry created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a lore entry.
pub async fn update_entry(
    State(state): State<AppState>,
    Path((_id, entry_id)): Path<(String, String)>,
    Json(data): Json<LoreEntryData>,
) -> Result<Json<LoreEntryRow>> {
    let updated = lorebook::update_entry(state.db.pool(), &entry_id, &data).await?;

    info!(entry = %entry_id, "Lore entry updated");
    Ok(Json(updated))
}

/// Delete a lore entry.
pub async fn delete_entry(
    State(state): State<AppState>,
    Path((_id, entry_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    lorebook::delete_entry(state.db.pool(), &entry_id).await?;

    info!(entry = %entry_id, "Lore entry deleted");
    Ok(StatusCode::NO_CONTENT)
}
