// src/api/credits.rs

use actix_web::web::ReqData;
use actix_web::{HttpResponse, Responder, get, post, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{AppState, credits, db};

const DEFAULT_HISTORY_SIZE: i64 = 20;
const MAX_HISTORY_SIZE: i64 = 100;

#[utoipa::path(
    get,
    path = "/api/credits",
    tag = "credits",
    responses(
        (status = 200, description = "Current balance; source is wallet, or ledger in degraded mode")
    )
)]
#[get("/credits")]
pub async fn credit_balance(state: web::Data<AppState>, user_id: ReqData<Uuid>) -> impl Responder {
    match credits::current_balance(&state.pool, *user_id).await {
        Ok(balance) => {
            let source = if balance.is_degraded() { "ledger" } else { "wallet" };
            HttpResponse::Ok().json(json!({ "balance": balance.amount(), "source": source }))
        }
        Err(e) => {
            log::error!("balance lookup error user_id={}: {e}", *user_id);
            HttpResponse::InternalServerError().json(json!({ "error": "internal error" }))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/credits/history",
    tag = "credits",
    params(("limit" = Option<i64>, Query, description = "Page size, default 20")),
    responses(
        (status = 200, description = "Ledger entries, newest first")
    )
)]
#[get("/credits/history")]
pub async fn credit_history(
    query: web::Query<HistoryQuery>,
    state: web::Data<AppState>,
    user_id: ReqData<Uuid>,
) -> impl Responder {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_SIZE)
        .clamp(1, MAX_HISTORY_SIZE);

    match db::list_ledger_entries(&state.pool, *user_id, limit).await {
        Ok(history) => HttpResponse::Ok().json(json!({ "history": history })),
        Err(e) => {
            log::error!("ledger history error user_id={}: {e}", *user_id);
            HttpResponse::InternalServerError().json(json!({ "error": "internal error" }))
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TopupRequest {
    pub amount: i32,
}

#[utoipa::path(
    post,
    path = "/api/credits/topup",
    tag = "credits",
    request_body = TopupRequest,
    responses(
        (status = 200, description = "Checkout URL for the requested amount"),
        (status = 400, description = "Non-positive amount")
    )
)]
#[post("/credits/topup")]
pub async fn initiate_topup(
    payload: web::Json<TopupRequest>,
    user_id: ReqData<Uuid>,
) -> impl Responder {
    if payload.amount <= 0 {
        return HttpResponse::BadRequest().json(json!({ "error": "invalid amount" }));
    }

    // Payment gateway integration (Midtrans/Xendit) is not wired up yet;
    // return a stub checkout link so the client flow can be exercised.
    let payment_url = format!(
        "https://dummy-payment-gateway.com/pay?amount={}&user_id={}",
        payload.amount, *user_id
    );

    HttpResponse::Ok().json(json!({ "payment_url": payment_url }))
}
