//! Character CRUD operations.

use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Character, CharacterData};
use crate::validation;

const CHARACTER_COLUMNS: &str = "id, name, description, personality, scenario, first_message, \
     message_example, creator_notes, system_prompt, post_history_instructions, tags, \
     lorebook_id, created_at, updated_at";

fn validate(data: &CharacterData) -> Result<()> {
    validation::validate_name(&data.name)?;
    validation::validate_text("description", &data.description)?;
    validation::validate_text("personality", &data.personality)?;
    validation::validate_text("scenario", &data.scenario)?;
    validation::validate_text("message_example", &data.message_example)?;
    validation::validate_text("system_prompt", &data.system_prompt)?;
    Ok(())
}

/// Create a new character.
pub async fn create_character(
    pool: &SqlitePool,
    id: &str,
    data: &CharacterData,
) -> Result<Character> {
    validate(data)?;

    sqlx::query(
        r#"
        INSERT INTO characters (
            id, name, description, personality, scenario, first_message,
            message_example, creator_notes, system_prompt,
            post_history_instructions, tags, lorebook_id
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(&data.personality)
    .bind(&data.scenario)
    .bind(&data.first_message)
    .bind(&data.message_example)
    .bind(&data.creator_notes)
    .bind(&data.system_prompt)
    .bind(&data.post_history_instructions)
    .bind(Json(&data.tags))
    .bind(&data.lorebook_id)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Character",
                    id: id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    get_character(pool, id).await
}

/// Get a character by ID.
pub async fn get_character(pool: &SqlitePool, id: &str) -> Result<Character> {
    sqlx::query_as::<_, Character>(&format!(
        "SELECT {} FROM characters WHERE id = ?",
        CHARACTER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Character",
        id: id.to_string(),
    })
}

/// Update an existing character.
pub async fn update_character(
    pool: &SqlitePool,
    id: &str,
    data: &CharacterData,
) -> Result<Character> {
    validate(data)?;

    let result = sqlx::query(
        r#"
        UPDATE characters
        SET name = ?, description = ?, personality = ?, scenario = ?,
            first_message = ?, message_example = ?, creator_notes = ?,
            system_prompt = ?, post_history_instructions = ?, tags = ?,
            lorebook_id = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(&data.personality)
    .bind(&data.scenario)
    .bind(&data.first_message)
    .bind(&data.message_example)
    .bind(&data.creator_notes)
    .bind(&data.system_prompt)
    .bind(&data.post_history_instructions)
    .bind(Json(&data.tags))
    .bind(&data.lorebook_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Character",
            id: id.to_string(),
        });
    }

    get_character(pool, id).await
}

/// Delete a character by ID.
pub async fn delete_character(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM characters WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Character",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// List all characters, newest first.
pub async fn list_characters(pool: &SqlitePool) -> Result<Vec<Character>> {
    let characters = sqlx::query_as::<_, Character>(&format!(
        "SELECT {} FROM characters ORDER BY created_at DESC, id",
        CHARACTER_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(characters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn test_pool() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn sample() -> CharacterData {
        CharacterData {
            name: "Mara".to_string(),
            description: "A wry ranger.".to_string(),
            personality: "Cautious.".to_string(),
            tags: vec!["fantasy".to_string(), "ranger".to_string()],
            ..CharacterData::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let db = test_pool().await;

        create_character(db.pool(), "char-1", &sample()).await.unwrap();
        let result = create_character(db.pool(), "char-1", &sample()).await;
        assert!(matches!(
            result,
            Err(DatabaseError::AlreadyExists { entity: "Character", .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let db = test_pool().await;

        let data = CharacterData {
            name: "  ".to_string(),
            ..sample()
        };
        let result = create_character(db.pool(), "char-1", &data).await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));
    }

    #[tokio::test]
    async fn test_tags_round_trip() {
        let db = test_pool().await;

        let created = create_character(db.pool(), "char-1", &sample()).await.unwrap();
        assert_eq!(
            created.tags.0,
            vec!["fantasy".to_string(), "ranger".to_string()]
        );
    }

    #[tokio::test]
    async fn test_update_missing_character() {
        let db = test_pool().await;

        let result = update_character(db.pool(), "ghost", &sample()).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_lorebook_link_requires_existing_book() {
        let db = test_pool().await;

        let data = CharacterData {
            lorebook_id: Some("missing-book".to_string()),
            ..sample()
        };
        // Foreign keys are enforced, so a dangling link fails.
        let result = create_character(db.pool(), "char-1", &data).await;
        assert!(matches!(result, Err(DatabaseError::Sqlx(_))));
    }
}
