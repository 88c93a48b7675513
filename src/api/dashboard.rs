// src/api/dashboard.rs

use actix_web::web::ReqData;
use actix_web::{HttpResponse, Responder, get, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::PlanTier;
use crate::{AppState, db};

#[derive(Debug, Serialize, ToSchema)]
pub struct WalletSummary {
    pub balance: i32,
    pub plan: PlanTier,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    pub wallet: WalletSummary,
    pub jobs_this_week: i64,
    pub credits_used_this_week: i32,
}

#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "dashboard",
    responses(
        (status = 200, description = "Wallet snapshot plus trailing-week activity", body = SummaryResponse),
        (status = 404, description = "Wallet not provisioned")
    )
)]
#[get("/dashboard/summary")]
pub async fn summary(state: web::Data<AppState>, user_id: ReqData<Uuid>) -> impl Responder {
    let user_id = *user_id;

    let wallet = match db::get_wallet(&state.pool, user_id).await {
        Ok(Some(w)) => w,
        Ok(None) => {
            return HttpResponse::NotFound().json(json!({ "error": "wallet not found" }));
        }
        Err(e) => {
            log::error!("wallet fetch error user_id={user_id}: {e}");
            return HttpResponse::InternalServerError().json(json!({ "error": "internal error" }));
        }
    };

    let jobs_this_week = match db::weekly_job_count(&state.pool, user_id).await {
        Ok(n) => n,
        Err(e) => {
            log::error!("weekly job count error user_id={user_id}: {e}");
            return HttpResponse::InternalServerError().json(json!({ "error": "internal error" }));
        }
    };

    let credits_used_this_week = match db::weekly_credits_used(&state.pool, user_id).await {
        Ok(n) => n,
        Err(e) => {
            log::error!("weekly credits error user_id={user_id}: {e}");
            return HttpResponse::InternalServerError().json(json!({ "error": "internal error" }));
        }
    };

    HttpResponse::Ok().json(SummaryResponse {
        wallet: WalletSummary {
            balance: wallet.balance,
            plan: wallet.plan,
            expires_at: wallet.expires_at,
        },
        jobs_this_week,
        credits_used_this_week,
    })
}
