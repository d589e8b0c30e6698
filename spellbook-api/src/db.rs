use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Classes owned by users
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS classes (
            id UUID PRIMARY KEY,
            user_id VARCHAR(255) NOT NULL,
            name VARCHAR(255) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Uploaded note pages; the serial id keeps upload order
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notes (
            id BIGSERIAL PRIMARY KEY,
            blob_key TEXT NOT NULL UNIQUE,
            class_id UUID NOT NULL REFERENCES classes(id) ON DELETE CASCADE,
            user_id VARCHAR(255) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One row per enqueued quiz job
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quiz_records (
            job_id UUID PRIMARY KEY,
            class_id UUID NOT NULL REFERENCES classes(id) ON DELETE CASCADE,
            user_id VARCHAR(255) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // At most one score per job, enforced by the primary key
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quiz_scores (
            job_id UUID PRIMARY KEY REFERENCES quiz_records(job_id) ON DELETE CASCADE,
            score DOUBLE PRECISION NOT NULL CHECK (score >= 0 AND score <= 100),
            created_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Work queue consumed by the quiz worker
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS job_queue (
            id BIGSERIAL PRIMARY KEY,
            job_id UUID NOT NULL,
            payload JSONB NOT NULL,
            enqueued_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_classes_user_id ON classes(user_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_notes_class_id ON notes(class_id, id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_quiz_records_class_id ON quiz_records(class_id)")
        .execute(pool)
        .await?;

    Ok(())
}
