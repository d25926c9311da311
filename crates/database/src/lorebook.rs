//! Lorebook and lore entry CRUD operations.

use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{LoreEntryData, LoreEntryRow, LorebookData, LorebookRow};
use crate::validation;

/// Create a new lorebook.
pub async fn create_lorebook(
    pool: &SqlitePool,
    id: &str,
    data: &LorebookData,
) -> Result<LorebookRow> {
    validation::validate_name(&data.name)?;

    sqlx::query("INSERT INTO lorebooks (id, name, description) VALUES (?, ?, ?)")
        .bind(id)
        .bind(&data.name)
        .bind(&data.description)
        .execute(pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return DatabaseError::AlreadyExists {
                        entity: "Lorebook",
                        id: id.to_string(),
                    };
                }
            }
            DatabaseError::Sqlx(e)
        })?;

    get_lorebook(pool, id).await
}

/// Get a lorebook by ID.
pub async fn get_lorebook(pool: &SqlitePool, id: &str) -> Result<LorebookRow> {
    sqlx::query_as::<_, LorebookRow>(
        "SELECT id, name, description, created_at, updated_at FROM lorebooks WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Lorebook",
        id: id.to_string(),
    })
}

/// Update an existing lorebook.
pub async fn update_lorebook(
    pool: &SqlitePool,
    id: &str,
    data: &LorebookData,
) -> Result<LorebookRow> {
    validation::validate_name(&data.name)?;

    let result = sqlx::query(
        "UPDATE lorebooks SET name = ?, description = ?, updated_at = datetime('now') WHERE id = ?",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Lorebook",
            id: id.to_string(),
        });
    }

    get_lorebook(pool, id).await
}

/// Delete a lorebook and (by cascade) its entries.
pub async fn delete_lorebook(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM lorebooks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Lorebook",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// List all lorebooks by name.
pub async fn list_lorebooks(pool: &SqlitePool) -> Result<Vec<LorebookRow>> {
    let books = sqlx::query_as::<_, LorebookRow>(
        "SELECT id, name, description, created_at, updated_at FROM lorebooks ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(books)
}

const ENTRY_COLUMNS: &str =
    "id, lorebook_id, name, category, keywords, content, importance, enabled, created_at, updated_at";

fn validate_entry(data: &LoreEntryData) -> Result<()> {
    validation::validate_name(&data.name)?;
    validation::validate_keywords(&data.keywords)?;
    validation::validate_importance(&data.importance)?;
    validation::validate_text("content", &data.content)?;
    Ok(())
}

/// Create a lore entry in a lorebook.
pub async fn create_entry(
    pool: &SqlitePool,
    lorebook_id: &str,
    id: &str,
    data: &LoreEntryData,
) -> Result<LoreEntryRow> {
    validate_entry(data)?;

    // Surface a missing book as NotFound rather than a bare FK violation.
    get_lorebook(pool, lorebook_id).await?;

    sqlx::query(
        r#"
        INSERT INTO lore_entries (id, lorebook_id, name, category, keywords, content, importance, enabled)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(lorebook_id)
    .bind(&data.name)
    .bind(&data.category)
    .bind(Json(&data.keywords))
    .bind(&data.content)
    .bind(&data.importance)
    .bind(data.enabled)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "LoreEntry",
                    id: id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    get_entry(pool, id).await
}

/// Get a lore entry by ID.
pub async fn get_entry(pool: &SqlitePool, id: &str) -> Result<LoreEntryRow> {
    sqlx::query_as::<_, LoreEntryRow>(&format!(
        "SELECT {} FROM lore_entries WHERE id = ?",
        ENTRY_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "LoreEntry",
        id: id.to_string(),
    })
}

/// Update an existing lore entry.
pub async fn update_entry(pool: &SqlitePool, id: &str, data: &LoreEntryData) -> Result<LoreEntryRow> {
    validate_entry(data)?;

    let result = sqlx::query(
        r#"
        UPDATE lore_entries
        SET name = ?, category = ?, keywords = ?, content = ?, importance = ?,
            enabled = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(&data.name)
    .bind(&data.category)
    .bind(Json(&data.keywords))
    .bind(&data.content)
    .bind(&data.importance)
    .bind(data.enabled)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "LoreEntry",
            id: id.to_string(),
        });
    }

    get_entry(pool, id).await
}

/// Delete a lore entry by ID.
pub async fn delete_entry(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM lore_entries WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "LoreEntry",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// List entries in a lorebook, oldest first.
pub async fn list_entries(pool: &SqlitePool, lorebook_id: &str) -> Result<Vec<LoreEntryRow>> {
    let entries = sqlx::query_as::<_, LoreEntryRow>(&format!(
        "SELECT {} FROM lore_entries WHERE lorebook_id = ? ORDER BY created_at, id",
        ENTRY_COLUMNS
    ))
    .bind(lorebook_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn book() -> LorebookData {
        LorebookData {
            name: "Northern Reaches".to_string(),
            description: "World facts for the frontier arc.".to_string(),
        }
    }

    fn entry() -> LoreEntryData {
        LoreEntryData {
            name: "Ironhold".to_string(),
            category: Some("location".to_string()),
            keywords: vec!["ironhold".to_string(), "fortress".to_string()],
            content: "A dwarven fortress carved into the mountainside.".to_string(),
            importance: "high".to_string(),
            enabled: true,
        }
    }

    #[tokio::test]
    async fn test_lorebook_crud() {
        let db = test_db().await;

        let created = create_lorebook(db.pool(), "book-1", &book()).await.unwrap();
        assert_eq!(created.name, "Northern Reaches");

        let update = LorebookData {
            name: "Northern Reaches (v2)".to_string(),
            ..book()
        };
        let updated = update_lorebook(db.pool(), "book-1", &update).await.unwrap();
        assert_eq!(updated.name, "Northern Reaches (v2)");

        assert_eq!(list_lorebooks(db.pool()).await.unwrap().len(), 1);

        delete_lorebook(db.pool(), "book-1").await.unwrap();
        assert!(matches!(
            get_lorebook(db.pool(), "book-1").await,
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_entry_crud_and_round_trip() {
        let db = test_db().await;
        create_lorebook(db.pool(), "book-1", &book()).await.unwrap();

        let created = create_entry(db.pool(), "book-1", "entry-1", &entry())
            .await
            .unwrap();
        assert_eq!(created.keywords.0.len(), 2);
        assert_eq!(created.importance, "high");
        assert!(created.enabled);

        let mut data = entry();
        data.enabled = false;
        let updated = update_entry(db.pool(), "entry-1", &data).await.unwrap();
        assert!(!updated.enabled);

        let entries = list_entries(db.pool(), "book-1").await.unwrap();
        assert_eq!(entries.len(), 1);

        delete_entry(db.pool(), "entry-1").await.unwrap();
        assert!(list_entries(db.pool(), "book-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entry_requires_existing_book() {
        let db = test_db().await;

        let result = create_entry(db.pool(), "missing", "entry-1", &entry()).await;
        assert!(matches!(
            result,
            Err(DatabaseError::NotFound { entity: "Lorebook", .. })
        ));
    }

    #[tokio::test]
    async fn test_entry_importance_validated() {
        let db = test_db().await;
        create_lorebook(db.pool(), "book-1", &book()).await.unwrap();

        let mut data = entry();
        data.importance = "urgent".to_string();
        let result = create_entry(db.pool(), "book-1", "entry-1", &data).await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));
    }

    #[tokio::test]
    async fn test_deleting_book_cascades_to_entries() {
        let db = test_db().await;
        create_lorebook(db.pool(), "book-1", &book()).await.unwrap();
        create_entry(db.pool(), "book-1", "entry-1", &entry())
            .await
            .unwrap();

        delete_lorebook(db.pool(), "book-1").await.unwrap();
        assert!(matches!(
            get_entry(db.pool(), "entry-1").await,
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
