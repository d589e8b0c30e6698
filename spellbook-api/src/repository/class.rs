//! Class Repository
//!
//! Classes and the note pages uploaded to them. The note keys of a class
//! are the inputs of its quiz jobs.

use async_trait::async_trait;
use spellbook_core::domain::class::{ClassRecord, NoteRecord};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, sqlx::Error>;

#[async_trait]
pub trait ClassRepository: Send + Sync {
    async fn create_class(&self, user_id: &str, name: &str) -> Result<ClassRecord>;

    /// One page of the classes of `user_id`, newest first
    async fn list_classes(&self, user_id: &str, offset: u32, limit: u32) -> Result<Vec<ClassRecord>>;

    async fn count_classes(&self, user_id: &str) -> Result<u64>;

    /// Finds a class only if it belongs to `user_id`
    async fn find_class(&self, user_id: &str, class_id: Uuid) -> Result<Option<ClassRecord>>;

    async fn insert_note(&self, note: &NoteRecord) -> Result<()>;

    /// Content keys of every note in the class, in upload order
    async fn note_keys(&self, class_id: Uuid) -> Result<Vec<String>>;

    /// One page of notes in upload order
    async fn list_notes(&self, class_id: Uuid, offset: u32, limit: u32) -> Result<Vec<NoteRecord>>;

    async fn count_notes(&self, class_id: Uuid) -> Result<u32>;

    /// Note counts keyed by class; classes without notes are absent
    async fn note_counts(&self, class_ids: &[Uuid]) -> Result<HashMap<Uuid, u32>>;

    /// Returns false if no such note existed
    async fn delete_note(&self, class_id: Uuid, key: &str) -> Result<bool>;
}

pub struct PgClassRepository {
    pool: PgPool,
}

impl PgClassRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClassRepository for PgClassRepository {
    async fn create_class(&self, user_id: &str, name: &str) -> Result<ClassRecord> {
        let class = ClassRecord {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            created_at: chrono::Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO classes (id, user_id, name, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(class.id)
        .bind(&class.user_id)
        .bind(&class.name)
        .bind(class.created_at)
        .execute(&self.pool)
        .await?;

        Ok(class)
    }

    async fn list_classes(&self, user_id: &str, offset: u32, limit: u32) -> Result<Vec<ClassRecord>> {
        let rows = sqlx::query_as::<_, ClassRow>(
            r#"
            SELECT id, user_id, name, created_at
            FROM classes
            WHERE user_id = $1
            ORDER BY created_at DESC
            OFFSET $2
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(i64::from(offset))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_classes(&self, user_id: &str) -> Result<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM classes WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn find_class(&self, user_id: &str, class_id: Uuid) -> Result<Option<ClassRecord>> {
        let row = sqlx::query_as::<_, ClassRow>(
            r#"
            SELECT id, user_id, name, created_at
            FROM classes
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(class_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn insert_note(&self, note: &NoteRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notes (blob_key, class_id, user_id, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&note.key)
        .bind(note.class_id)
        .bind(&note.user_id)
        .bind(note.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn note_keys(&self, class_id: Uuid) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT blob_key FROM notes WHERE class_id = $1 ORDER BY id ASC",
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_notes(&self, class_id: Uuid, offset: u32, limit: u32) -> Result<Vec<NoteRecord>> {
        let rows = sqlx::query_as::<_, NoteRow>(
            r#"
            SELECT blob_key, class_id, user_id, created_at
            FROM notes
            WHERE class_id = $1
            ORDER BY id ASC
            OFFSET $2
            LIMIT $3
            "#,
        )
        .bind(class_id)
        .bind(i64::from(offset))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_notes(&self, class_id: Uuid) -> Result<u32> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notes WHERE class_id = $1")
            .bind(class_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn note_counts(&self, class_ids: &[Uuid]) -> Result<HashMap<Uuid, u32>> {
        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT class_id, COUNT(*)
            FROM notes
            WHERE class_id = ANY($1)
            GROUP BY class_id
            "#,
        )
        .bind(class_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(class_id, count)| (class_id, u32::try_from(count).unwrap_or(u32::MAX)))
            .collect())
    }

    async fn delete_note(&self, class_id: Uuid, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE class_id = $1 AND blob_key = $2")
            .bind(class_id)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ClassRow {
    id: Uuid,
    user_id: String,
    name: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<ClassRow> for ClassRecord {
    fn from(row: ClassRow) -> Self {
        ClassRecord {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct NoteRow {
    blob_key: String,
    class_id: Uuid,
    user_id: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<NoteRow> for NoteRecord {
    fn from(row: NoteRow) -> Self {
        NoteRecord {
            key: row.blob_key,
            class_id: row.class_id,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}
