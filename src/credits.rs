// src/credits.rs
//
// Credit wallet logic: balance lookup with the degraded ledger-sum fallback,
// and the transactional settle applied when the generation worker reports a
// terminal job state.

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::db;
use crate::models::{JobStatus, JobType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditBalance {
    /// Served by the `credit_balance` view.
    Precomputed(i32),
    /// View missing: balance derived by summing the ledger. Degraded mode,
    /// not the normal path.
    Derived(i32),
}

impl CreditBalance {
    pub fn amount(self) -> i32 {
        match self {
            Self::Precomputed(b) | Self::Derived(b) => b,
        }
    }

    pub fn is_degraded(self) -> bool {
        matches!(self, Self::Derived(_))
    }
}

pub async fn current_balance(pool: &PgPool, user_id: Uuid) -> Result<CreditBalance, sqlx::Error> {
    match sqlx::query("SELECT balance FROM credit_balance WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
    {
        Ok(row) => Ok(CreditBalance::Precomputed(
            row.map(|r| r.get("balance")).unwrap_or(0),
        )),
        Err(e) if is_undefined_table(&e) => {
            log::warn!("credit_balance view missing, deriving balance from ledger (degraded)");
            let sum = db::sum_ledger(pool, user_id).await?;
            Ok(CreditBalance::Derived(sum))
        }
        Err(e) => Err(e),
    }
}

// 42P01 = undefined_table
fn is_undefined_table(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("42P01"),
        _ => false,
    }
}

/// Cost of a completed job in credits: worker-reported token usage wins,
/// zero or absent usage falls back to a flat rate of one credit.
pub fn credit_cost(tokens_used: Option<i32>) -> i32 {
    match tokens_used {
        Some(t) if t > 0 => t,
        _ => 1,
    }
}

pub struct JobCallback {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub output_url: Option<String>,
    pub tokens_used: Option<i32>,
    pub error_message: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CallbackOutcome {
    Applied { user_id: Uuid, debited: i32 },
    /// The job was already terminal; replayed delivery, nothing changed.
    AlreadyTerminal,
    UnknownJob,
}

/// Applies a terminal worker callback exactly once.
///
/// The status transition is a single conditional UPDATE: a job that already
/// reached a terminal state matches no row, so a replayed callback skips all
/// side effects. Asset insert, ledger debit and wallet decrement run in the
/// same transaction as the transition, so a crash mid-sequence leaves either
/// everything or nothing.
pub async fn apply_job_callback(
    pool: &PgPool,
    cb: &JobCallback,
) -> Result<CallbackOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        r#"UPDATE jobs
           SET status = $2, output_url = $3, tokens_used = $4,
               error_message = $5, updated_at = NOW()
           WHERE id = $1 AND status IN ('queued', 'processing')
           RETURNING user_id, project_id, type"#,
    )
    .bind(cb.job_id)
    .bind(cb.status)
    .bind(&cb.output_url)
    .bind(cb.tokens_used)
    .bind(&cb.error_message)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        let known = sqlx::query("SELECT 1 FROM jobs WHERE id = $1")
            .bind(cb.job_id)
            .fetch_optional(&mut *tx)
            .await?;
        tx.rollback().await?;
        return Ok(if known.is_some() {
            CallbackOutcome::AlreadyTerminal
        } else {
            CallbackOutcome::UnknownJob
        });
    };

    let user_id: Uuid = row.get("user_id");
    let mut debited = 0;

    if cb.status == JobStatus::Done {
        let project_id: Option<Uuid> = row.get("project_id");
        let job_type: JobType = row.get("type");
        let output_url = cb.output_url.as_deref().unwrap_or_default();
        let cost = credit_cost(cb.tokens_used);

        // Output doubles as the thumbnail until a resizer exists.
        sqlx::query(
            r#"INSERT INTO assets (project_id, user_id, image_url, thumb_url, meta)
               VALUES ($1, $2, $3, $3, $4)"#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(output_url)
        .bind(serde_json::json!({ "job_id": cb.job_id, "type": job_type }))
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"INSERT INTO credits_ledger (user_id, change, reason, job_id, meta)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(user_id)
        .bind(-cost)
        .bind(job_type.ledger_reason())
        .bind(cb.job_id)
        .bind(serde_json::json!({ "tokens_used": cb.tokens_used }))
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query(
            r#"UPDATE credits_wallet
               SET balance = balance - $2, updated_at = NOW()
               WHERE user_id = $1"#,
        )
        .bind(user_id)
        .bind(cost)
        .execute(&mut *tx)
        .await?;

        // One wallet per user is an invariant; a missing row means the
        // account was never provisioned. Abort so the worker retries.
        if updated.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        debited = cost;
    }

    tx.commit().await?;
    Ok(CallbackOutcome::Applied { user_id, debited })
}
