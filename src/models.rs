// src/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Done,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "job_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Generate,
    RemoveBg,
    Template,
}

impl JobType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "generate" => Some(Self::Generate),
            "remove_bg" => Some(Self::RemoveBg),
            "template" => Some(Self::Template),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::RemoveBg => "remove_bg",
            Self::Template => "template",
        }
    }

    /// The ledger reason enum has no `remove_bg` member; background removal
    /// debits under `generate`.
    pub fn ledger_reason(self) -> LedgerReason {
        match self {
            Self::Template => LedgerReason::Template,
            Self::Generate | Self::RemoveBg => LedgerReason::Generate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "reason_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LedgerReason {
    Generate,
    Template,
    Topup,
    Bonus,
    Trial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "plan_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Free,
    Pro,
    Enterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Archived,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Wallet {
    pub user_id: Uuid,
    pub balance: i32,
    pub plan: PlanTier,
    pub expires_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Job {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub status: JobStatus,
    pub input_url: Option<String>,
    pub output_url: Option<String>,
    pub tokens_used: Option<i32>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Asset {
    pub id: Uuid,
    pub project_id: Option<Uuid>,
    pub image_url: String,
    pub thumb_url: Option<String>,
    #[schema(value_type = Object)]
    pub meta: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectItem {
    pub id: Uuid,
    pub title: String,
    pub cover_url: Option<String>,
    pub status: ProjectStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub change: i32,
    pub reason: LedgerReason,
    pub job_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
