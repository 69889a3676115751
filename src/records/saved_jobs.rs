// src/records/saved_jobs.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::app_log;
use crate::jobs::JobPosting;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedJob {
    pub id: String,
    pub user_id: String,
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: Option<String>,
    pub source: String,
    pub posting: JobPosting,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct SavedJobRow {
    id: String,
    user_id: String,
    job_id: String,
    title: String,
    company: String,
    location: String,
    url: Option<String>,
    source: String,
    posting: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SavedJobRow> for SavedJob {
    type Error = anyhow::Error;

    fn try_from(row: SavedJobRow) -> Result<Self> {
        let posting = serde_json::from_str(&row.posting)
            .with_context(|| format!("Saved job {} has an unreadable posting", row.id))?;
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            job_id: row.job_id,
            title: row.title,
            company: row.company,
            location: row.location,
            url: row.url,
            source: row.source,
            posting,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

pub struct SavedJobRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SavedJobRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Save a posting for the user. Saving the same job again refreshes the
    /// snapshot and keeps earlier notes unless new ones are given.
    pub async fn save(
        &self,
        user_id: &str,
        posting: &JobPosting,
        notes: Option<&str>,
    ) -> Result<SavedJob> {
        let snapshot = serde_json::to_string(posting).context("Failed to serialize job posting")?;
        let notes = notes.map(str::trim).filter(|n| !n.is_empty());

        sqlx::query(
            r#"
            INSERT INTO saved_jobs (id, user_id, job_id, title, company, location, url, source, posting, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, job_id) DO UPDATE SET
                title = excluded.title,
                company = excluded.company,
                location = excluded.location,
                url = excluded.url,
                source = excluded.source,
                posting = excluded.posting,
                notes = COALESCE(excluded.notes, saved_jobs.notes)
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(&posting.id)
        .bind(&posting.title)
        .bind(&posting.company)
        .bind(&posting.location)
        .bind(&posting.url)
        .bind(&posting.source)
        .bind(&snapshot)
        .bind(notes)
        .bind(Utc::now())
        .execute(self.pool)
        .await
        .context("Failed to save job")?;

        app_log!(info, "User {} saved job {}", user_id, posting.id);

        let row = sqlx::query_as::<_, SavedJobRow>(
            "SELECT * FROM saved_jobs WHERE user_id = ? AND job_id = ?",
        )
        .bind(user_id)
        .bind(&posting.id)
        .fetch_one(self.pool)
        .await?;

        SavedJob::try_from(row)
    }

    /// Newest first
    pub async fn list(&self, user_id: &str) -> Result<Vec<SavedJob>> {
        let rows = sqlx::query_as::<_, SavedJobRow>(
            "SELECT * FROM saved_jobs WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(SavedJob::try_from).collect()
    }

    /// Remove by saved-job id or by job id
    pub async fn delete(&self, user_id: &str, id: &str) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM saved_jobs WHERE user_id = ? AND (id = ? OR job_id = ?)")
                .bind(user_id)
                .bind(id)
                .bind(id)
                .execute(self.pool)
                .await
                .context("Failed to delete saved job")?;
        Ok(result.rows_affected() > 0)
    }
}
