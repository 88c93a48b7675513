// src/db.rs

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{Asset, Job, LedgerEntry, ProjectItem, Wallet};

pub async fn get_wallet(pool: &PgPool, user_id: Uuid) -> Result<Option<Wallet>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT user_id, balance, plan, expires_at, updated_at
           FROM credits_wallet
           WHERE user_id = $1"#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Wallet {
        user_id: r.get("user_id"),
        balance: r.get("balance"),
        plan: r.get("plan"),
        expires_at: r.get("expires_at"),
        updated_at: r.get("updated_at"),
    }))
}

/// Derived balance for the degraded path: sum every ledger entry.
pub async fn sum_ledger(pool: &PgPool, user_id: Uuid) -> Result<i32, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT COALESCE(SUM(change), 0)::INT AS balance
           FROM credits_ledger
           WHERE user_id = $1"#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(row.get("balance"))
}

pub async fn weekly_job_count(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT COUNT(*) AS n
           FROM jobs
           WHERE user_id = $1
             AND created_at >= NOW() - INTERVAL '7 days'"#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(row.get("n"))
}

pub async fn weekly_credits_used(pool: &PgPool, user_id: Uuid) -> Result<i32, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT COALESCE(SUM(-change), 0)::INT AS used
           FROM credits_ledger
           WHERE user_id = $1
             AND change < 0
             AND created_at >= NOW() - INTERVAL '7 days'"#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(row.get("used"))
}

pub async fn list_projects_page(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
    cursor: Option<DateTime<Utc>>,
) -> Result<Vec<ProjectItem>, sqlx::Error> {
    let rows = match cursor {
        Some(cursor) => {
            sqlx::query(
                r#"SELECT id, title, cover_url, status, updated_at
                   FROM projects
                   WHERE user_id = $1 AND updated_at < $2
                   ORDER BY updated_at DESC
                   LIMIT $3"#,
            )
            .bind(user_id)
            .bind(cursor)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                r#"SELECT id, title, cover_url, status, updated_at
                   FROM projects
                   WHERE user_id = $1
                   ORDER BY updated_at DESC
                   LIMIT $2"#,
            )
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows
        .into_iter()
        .map(|r| ProjectItem {
            id: r.get("id"),
            title: r.get("title"),
            cover_url: r.get("cover_url"),
            status: r.get("status"),
            updated_at: r.get("updated_at"),
        })
        .collect())
}

/// Cursor contract: only a full-sized page advertises a next cursor.
pub fn next_cursor(items: &[ProjectItem], limit: i64) -> Option<DateTime<Utc>> {
    if !items.is_empty() && items.len() as i64 == limit {
        items.last().map(|p| p.updated_at)
    } else {
        None
    }
}

pub async fn list_ledger_entries(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<LedgerEntry>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT id, change, reason, job_id, created_at
           FROM credits_ledger
           WHERE user_id = $1
           ORDER BY created_at DESC
           LIMIT $2"#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| LedgerEntry {
            id: r.get("id"),
            change: r.get("change"),
            reason: r.get("reason"),
            job_id: r.get("job_id"),
            created_at: r.get("created_at"),
        })
        .collect())
}

pub async fn list_assets(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<Asset>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT id, project_id, image_url, thumb_url, meta, created_at
           FROM assets
           WHERE user_id = $1
           ORDER BY created_at DESC
           LIMIT $2"#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| Asset {
            id: r.get("id"),
            project_id: r.get("project_id"),
            image_url: r.get("image_url"),
            thumb_url: r.get("thumb_url"),
            meta: r.get("meta"),
            created_at: r.get("created_at"),
        })
        .collect())
}

/// Ownership mismatch reads the same as a missing row.
pub async fn get_job_for_user(
    pool: &PgPool,
    job_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Job>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT id, user_id, project_id, type, status, input_url, output_url,
                  tokens_used, error_message, created_at, updated_at
           FROM jobs
           WHERE id = $1 AND user_id = $2"#,
    )
    .bind(job_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Job {
        id: r.get("id"),
        user_id: r.get("user_id"),
        project_id: r.get("project_id"),
        job_type: r.get("type"),
        status: r.get("status"),
        input_url: r.get("input_url"),
        output_url: r.get("output_url"),
        tokens_used: r.get("tokens_used"),
        error_message: r.get("error_message"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }))
}

pub struct NewJob {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_id: Option<Uuid>,
    pub job_type: crate::models::JobType,
    pub input_url: Option<String>,
}

pub async fn insert_job(pool: &PgPool, job: &NewJob) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO jobs (id, user_id, project_id, type, status, input_url)
           VALUES ($1, $2, $3, $4, 'queued', $5)"#,
    )
    .bind(job.id)
    .bind(job.user_id)
    .bind(job.project_id)
    .bind(job.job_type)
    .bind(&job.input_url)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn mark_job_error(
    pool: &PgPool,
    job_id: Uuid,
    message: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"UPDATE jobs
           SET status = 'error', error_message = $2, updated_at = NOW()
           WHERE id = $1"#,
    )
    .bind(job_id)
    .bind(message)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn project_owned_by(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT 1 FROM projects WHERE id = $1 AND user_id = $2")
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.is_some())
}

pub struct OnboardingFields<'a> {
    pub business_name: &'a str,
    pub business_type: &'a str,
    pub main_goal: &'a str,
}

/// Returns the number of updated rows; zero means the profile was never
/// provisioned by the identity-provider trigger.
pub async fn complete_onboarding(
    pool: &PgPool,
    user_id: Uuid,
    fields: &OnboardingFields<'_>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE profiles
           SET business_name = $2, business_type = $3, main_goal = $4,
               onboarding_completed_at = NOW()
           WHERE user_id = $1"#,
    )
    .bind(user_id)
    .bind(fields.business_name)
    .bind(fields.business_type)
    .bind(fields.main_goal)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
