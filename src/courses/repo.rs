use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Course record in the database. Media columns hold relative stored-file
/// references; URL resolution happens in the serializer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub video: Option<String>,
    pub duration: String,
    pub level: String,
    pub category: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Validated column values for an insert or a full-row update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseFields {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub video: Option<String>,
    pub duration: String,
    pub level: String,
    pub category: String,
}

const COLUMNS: &str =
    "id, title, description, image, video, duration, level, category, created_at, updated_at";

impl Course {
    /// All courses, most recently created first.
    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Course>> {
        let rows = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COLUMNS} FROM courses ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Course>> {
        let course =
            sqlx::query_as::<_, Course>(&format!("SELECT {COLUMNS} FROM courses WHERE id = $1"))
                .bind(id)
                .fetch_optional(db)
                .await?;
        Ok(course)
    }

    pub async fn insert(db: &PgPool, fields: &CourseFields) -> sqlx::Result<Course> {
        sqlx::query_as::<_, Course>(&format!(
            r#"
            INSERT INTO courses (title, description, image, video, duration, level, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(&fields.image)
        .bind(&fields.video)
        .bind(&fields.duration)
        .bind(&fields.level)
        .bind(&fields.category)
        .fetch_one(db)
        .await
    }

    /// Full-row update; `updated_at` advances to now(), `created_at` is
    /// never touched.
    pub async fn update(db: &PgPool, id: Uuid, fields: &CourseFields) -> sqlx::Result<Course> {
        sqlx::query_as::<_, Course>(&format!(
            r#"
            UPDATE courses
            SET title = $2, description = $3, image = $4, video = $5,
                duration = $6, level = $7, category = $8, updated_at = now()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(&fields.image)
        .bind(&fields.video)
        .bind(&fields.duration)
        .bind(&fields.level)
        .bind(&fields.category)
        .fetch_one(db)
        .await
    }

    /// Returns false when no row matched the id.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
