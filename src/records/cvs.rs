// src/records/cvs.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::app_log;
use crate::types::cv_data::CvDocument;

const CV_COLUMNS: &str = "id, user_id, title, template, language, document, ats_score, is_primary, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvRecord {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub template: String,
    pub language: String,
    pub document: CvDocument,
    pub ats_score: Option<u8>,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CvRow {
    id: String,
    user_id: String,
    title: String,
    template: String,
    language: String,
    document: String,
    ats_score: Option<i64>,
    is_primary: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CvRow> for CvRecord {
    type Error = anyhow::Error;

    fn try_from(row: CvRow) -> Result<Self> {
        let document = serde_json::from_str(&row.document)
            .with_context(|| format!("Stored CV {} has an unreadable document", row.id))?;
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            template: row.template,
            language: row.language,
            document,
            ats_score: row.ats_score.map(|s| s.clamp(0, 100) as u8),
            is_primary: row.is_primary,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCv {
    pub title: String,
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub document: CvDocument,
}

fn default_template() -> String {
    "default".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CvUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub document: Option<CvDocument>,
}

pub struct CvRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CvRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a new CV. A user's first CV becomes the primary one.
    pub async fn create(&self, user_id: &str, new_cv: NewCv) -> Result<CvRecord> {
        let now = Utc::now();
        let id = uuid::Uuid::new_v4().to_string();
        let document =
            serde_json::to_string(&new_cv.document).context("Failed to serialize CV document")?;

        let mut tx = self.pool.begin().await?;

        let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cvs WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
        let is_primary = existing == 0;

        sqlx::query(
            r#"
            INSERT INTO cvs (id, user_id, title, template, language, document, ats_score, is_primary, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(new_cv.title.trim())
        .bind(&new_cv.template)
        .bind(&new_cv.language)
        .bind(&document)
        .bind(is_primary)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to insert CV")?;

        tx.commit().await?;

        app_log!(info, "Created CV {} for user {} (primary: {})", id, user_id, is_primary);

        Ok(CvRecord {
            id,
            user_id: user_id.to_string(),
            title: new_cv.title.trim().to_string(),
            template: new_cv.template,
            language: new_cv.language,
            document: new_cv.document,
            ats_score: None,
            is_primary,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get(&self, user_id: &str, id: &str) -> Result<Option<CvRecord>> {
        let row = sqlx::query_as::<_, CvRow>(&format!(
            "SELECT {} FROM cvs WHERE user_id = ? AND id = ?",
            CV_COLUMNS
        ))
        .bind(user_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(CvRecord::try_from).transpose()
    }

    /// Primary first, then most recently updated
    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<CvRecord>> {
        let rows = sqlx::query_as::<_, CvRow>(&format!(
            "SELECT {} FROM cvs WHERE user_id = ? ORDER BY is_primary DESC, updated_at DESC, rowid DESC",
            CV_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(CvRecord::try_from).collect()
    }

    pub async fn update(&self, user_id: &str, id: &str, update: CvUpdate) -> Result<Option<CvRecord>> {
        let Some(mut record) = self.get(user_id, id).await? else {
            return Ok(None);
        };

        if let Some(title) = update.title {
            record.title = title.trim().to_string();
        }
        if let Some(template) = update.template {
            record.template = template;
        }
        if let Some(language) = update.language {
            record.language = language;
        }
        if let Some(document) = update.document {
            record.document = document;
        }
        record.updated_at = Utc::now();

        let document =
            serde_json::to_string(&record.document).context("Failed to serialize CV document")?;

        sqlx::query(
            r#"
            UPDATE cvs SET title = ?, template = ?, language = ?, document = ?, updated_at = ?
            WHERE user_id = ? AND id = ?
            "#,
        )
        .bind(&record.title)
        .bind(&record.template)
        .bind(&record.language)
        .bind(&document)
        .bind(record.updated_at)
        .bind(user_id)
        .bind(id)
        .execute(self.pool)
        .await
        .context("Failed to update CV")?;

        Ok(Some(record))
    }

    /// Delete a CV. When it was the primary one, the most recently updated
    /// remaining CV is promoted.
    pub async fn delete(&self, user_id: &str, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let was_primary: Option<(bool,)> =
            sqlx::query_as("SELECT is_primary FROM cvs WHERE user_id = ? AND id = ?")
                .bind(user_id)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((was_primary,)) = was_primary else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM cvs WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete CV")?;

        if was_primary {
            sqlx::query(
                r#"
                UPDATE cvs SET is_primary = TRUE
                WHERE id = (
                    SELECT id FROM cvs WHERE user_id = ?
                    ORDER BY updated_at DESC, rowid DESC LIMIT 1
                )
                "#,
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("Failed to promote primary CV")?;
        }

        tx.commit().await?;
        app_log!(info, "Deleted CV {} for user {}", id, user_id);
        Ok(true)
    }

    /// Make `id` the user's only primary CV
    pub async fn set_primary(&self, user_id: &str, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM cvs WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(false);
        }

        sqlx::query("UPDATE cvs SET is_primary = FALSE WHERE user_id = ? AND id <> ?")
            .bind(user_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE cvs SET is_primary = TRUE WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await.context("Failed to commit primary CV change")?;
        app_log!(info, "CV {} is now primary for user {}", id, user_id);
        Ok(true)
    }

    /// Copy a CV as "<title> (Copy)". The copy is never primary and carries
    /// no ATS score.
    pub async fn duplicate(&self, user_id: &str, id: &str) -> Result<Option<CvRecord>> {
        let Some(source) = self.get(user_id, id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        let copy = CvRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: format!("{} (Copy)", source.title),
            ats_score: None,
            is_primary: false,
            created_at: now,
            updated_at: now,
            ..source
        };
        let document =
            serde_json::to_string(&copy.document).context("Failed to serialize CV document")?;

        sqlx::query(
            r#"
            INSERT INTO cvs (id, user_id, title, template, language, document, ats_score, is_primary, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, NULL, FALSE, ?, ?)
            "#,
        )
        .bind(&copy.id)
        .bind(user_id)
        .bind(&copy.title)
        .bind(&copy.template)
        .bind(&copy.language)
        .bind(&document)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await
        .context("Failed to insert CV copy")?;

        app_log!(info, "Duplicated CV {} as {}", id, copy.id);
        Ok(Some(copy))
    }

    pub async fn record_ats_score(&self, user_id: &str, id: &str, score: u8) -> Result<bool> {
        let result = sqlx::query("UPDATE cvs SET ats_score = ? WHERE user_id = ? AND id = ?")
            .bind(i64::from(score.min(100)))
            .bind(user_id)
            .bind(id)
            .execute(self.pool)
            .await
            .context("Failed to store ATS score")?;
        Ok(result.rows_affected() > 0)
    }
}
