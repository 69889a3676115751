// src/records/applications.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::fmt;
use std::str::FromStr;

use crate::app_log;
use crate::types::cv_data::{filled, ValidationIssue};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Draft,
    Applied,
    Interviewing,
    Offer,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Interviewing => "interviewing",
            ApplicationStatus::Offer => "offer",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(ApplicationStatus::Draft),
            "applied" => Ok(ApplicationStatus::Applied),
            "interviewing" => Ok(ApplicationStatus::Interviewing),
            "offer" => Ok(ApplicationStatus::Offer),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "withdrawn" => Ok(ApplicationStatus::Withdrawn),
            other => anyhow::bail!("Unknown application status: {}", other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub user_id: String,
    pub cv_id: Option<String>,
    pub job_id: Option<String>,
    pub company: String,
    pub position: String,
    pub status: ApplicationStatus,
    pub notes: String,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ApplicationRow {
    id: String,
    user_id: String,
    cv_id: Option<String>,
    job_id: Option<String>,
    company: String,
    position: String,
    status: String,
    notes: String,
    applied_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = anyhow::Error;

    fn try_from(row: ApplicationRow) -> Result<Self> {
        Ok(Self {
            status: row.status.parse()?,
            id: row.id,
            user_id: row.user_id,
            cv_id: row.cv_id,
            job_id: row.job_id,
            company: row.company,
            position: row.position,
            notes: row.notes,
            applied_at: row.applied_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewApplication {
    #[serde(default)]
    pub cv_id: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub notes: String,
}

impl NewApplication {
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if !filled(&self.company) {
            issues.push(ValidationIssue::new("company", "Company is required"));
        }
        if !filled(&self.position) {
            issues.push(ValidationIssue::new("position", "Position is required"));
        }
        issues
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationUpdate {
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// The application is in a state that implies it was sent
fn implies_sent(status: ApplicationStatus) -> bool {
    !matches!(status, ApplicationStatus::Draft | ApplicationStatus::Withdrawn)
}

pub struct ApplicationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ApplicationRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: &str, new: NewApplication) -> Result<Application> {
        let now = Utc::now();
        let application = Application {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            cv_id: new.cv_id.filter(|id| filled(id)),
            job_id: new.job_id.filter(|id| filled(id)),
            company: new.company.trim().to_string(),
            position: new.position.trim().to_string(),
            status: new.status,
            notes: new.notes,
            applied_at: implies_sent(new.status).then_some(now),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO applications (id, user_id, cv_id, job_id, company, position, status, notes, applied_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&application.id)
        .bind(user_id)
        .bind(&application.cv_id)
        .bind(&application.job_id)
        .bind(&application.company)
        .bind(&application.position)
        .bind(application.status.as_str())
        .bind(&application.notes)
        .bind(application.applied_at)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await
        .context("Failed to insert application")?;

        app_log!(
            info,
            "Created application {} for {} at {}",
            application.id,
            application.position,
            application.company
        );
        Ok(application)
    }

    pub async fn get(&self, user_id: &str, id: &str) -> Result<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE user_id = ? AND id = ?",
        )
        .bind(user_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Application::try_from).transpose()
    }

    /// Most recently updated first, optionally restricted to one status
    pub async fn list(
        &self,
        user_id: &str,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, ApplicationRow>(
                    "SELECT * FROM applications WHERE user_id = ? AND status = ? ORDER BY updated_at DESC, rowid DESC",
                )
                .bind(user_id)
                .bind(status.as_str())
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ApplicationRow>(
                    "SELECT * FROM applications WHERE user_id = ? ORDER BY updated_at DESC, rowid DESC",
                )
                .bind(user_id)
                .fetch_all(self.pool)
                .await?
            }
        };

        rows.into_iter().map(Application::try_from).collect()
    }

    /// Change status or notes. The first move to a sent status stamps
    /// `applied_at`.
    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        update: ApplicationUpdate,
    ) -> Result<Option<Application>> {
        let Some(mut application) = self.get(user_id, id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        if let Some(status) = update.status {
            if application.status != status {
                app_log!(
                    info,
                    "Application {} moved from {} to {}",
                    id,
                    application.status,
                    status
                );
            }
            application.status = status;
            if implies_sent(status) && application.applied_at.is_none() {
                application.applied_at = Some(now);
            }
        }
        if let Some(notes) = update.notes {
            application.notes = notes;
        }
        application.updated_at = now;

        sqlx::query(
            r#"
            UPDATE applications SET status = ?, notes = ?, applied_at = ?, updated_at = ?
            WHERE user_id = ? AND id = ?
            "#,
        )
        .bind(application.status.as_str())
        .bind(&application.notes)
        .bind(application.applied_at)
        .bind(now)
        .bind(user_id)
        .bind(id)
        .execute(self.pool)
        .await
        .context("Failed to update application")?;

        Ok(Some(application))
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM applications WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(id)
            .execute(self.pool)
            .await
            .context("Failed to delete application")?;
        Ok(result.rows_affected() > 0)
    }

    /// All of the user's applications as CSV with a header row
    pub async fn export_csv(&self, user_id: &str) -> Result<String> {
        let applications = self.list(user_id, None).await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "company",
            "position",
            "status",
            "applied_at",
            "updated_at",
            "job_id",
            "cv_id",
            "notes",
        ])?;

        for application in &applications {
            let applied_at = application
                .applied_at
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            let updated_at = application.updated_at.format("%Y-%m-%d").to_string();
            writer.write_record([
                application.company.as_str(),
                application.position.as_str(),
                application.status.as_str(),
                applied_at.as_str(),
                updated_at.as_str(),
                application.job_id.as_deref().unwrap_or(""),
                application.cv_id.as_deref().unwrap_or(""),
                application.notes.as_str(),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to finish CSV export: {}", e))?;
        String::from_utf8(bytes).context("CSV export is not valid UTF-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Database;

    fn new_application(company: &str) -> NewApplication {
        NewApplication {
            company: company.to_string(),
            position: "Rust Engineer".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validation_requires_company_and_position() {
        let fields: Vec<String> = NewApplication::default()
            .validate()
            .into_iter()
            .map(|i| i.field)
            .collect();
        assert_eq!(fields, vec!["company", "position"]);
        assert!(new_application("Acme").validate().is_empty());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(
            "Interviewing".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::Interviewing
        );
        assert!("ghosted".parse::<ApplicationStatus>().is_err());
    }

    #[tokio::test]
    async fn test_status_change_stamps_applied_at_once() {
        let db = Database::in_memory().await.unwrap();
        let repo = ApplicationRepository::new(db.pool());

        let created = repo.create("u1", new_application("Acme")).await.unwrap();
        assert_eq!(created.status, ApplicationStatus::Draft);
        assert!(created.applied_at.is_none());

        let applied = repo
            .update(
                "u1",
                &created.id,
                ApplicationUpdate {
                    status: Some(ApplicationStatus::Applied),
                    notes: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        let stamped = applied.applied_at.unwrap();

        let interviewing = repo
            .update(
                "u1",
                &created.id,
                ApplicationUpdate {
                    status: Some(ApplicationStatus::Interviewing),
                    notes: Some("Panel on Monday".to_string()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(interviewing.applied_at, Some(stamped));
        assert_eq!(interviewing.notes, "Panel on Monday");

        let stored = repo.get("u1", &created.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ApplicationStatus::Interviewing);
        assert!(repo
            .update("u2", &created.id, ApplicationUpdate::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let db = Database::in_memory().await.unwrap();
        let repo = ApplicationRepository::new(db.pool());
        repo.create("u1", new_application("Acme")).await.unwrap();
        repo.create(
            "u1",
            NewApplication {
                status: ApplicationStatus::Offer,
                ..new_application("Globex")
            },
        )
        .await
        .unwrap();

        assert_eq!(repo.list("u1", None).await.unwrap().len(), 2);
        let offers = repo
            .list("u1", Some(ApplicationStatus::Offer))
            .await
            .unwrap();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].company, "Globex");
        assert!(offers[0].applied_at.is_some());
    }

    #[tokio::test]
    async fn test_csv_export() {
        let db = Database::in_memory().await.unwrap();
        let repo = ApplicationRepository::new(db.pool());
        repo.create(
            "u1",
            NewApplication {
                notes: "Referred by Sam, team lead".to_string(),
                ..new_application("Acme")
            },
        )
        .await
        .unwrap();

        let csv = repo.export_csv("u1").await.unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("company,position,status,applied_at,updated_at,job_id,cv_id,notes")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("Acme,Rust Engineer,draft,,"));
        assert!(row.ends_with(",,,\"Referred by Sam, team lead\""));

        let empty = repo.export_csv("nobody").await.unwrap();
        assert_eq!(empty.lines().count(), 1);
    }
}
