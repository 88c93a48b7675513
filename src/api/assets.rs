// src/api/assets.rs

use actix_web::web::ReqData;
use actix_web::{HttpResponse, Responder, get, web};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, db};

const DEFAULT_RESULTS_SIZE: i64 = 30;
const MAX_RESULTS_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct AssetsQuery {
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/assets",
    tag = "dashboard",
    params(("limit" = Option<i64>, Query, description = "Page size, default 30")),
    responses(
        (status = 200, description = "Generated results, newest first")
    )
)]
#[get("/assets")]
pub async fn list_assets(
    query: web::Query<AssetsQuery>,
    state: web::Data<AppState>,
    user_id: ReqData<Uuid>,
) -> impl Responder {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RESULTS_SIZE)
        .clamp(1, MAX_RESULTS_SIZE);

    match db::list_assets(&state.pool, *user_id, limit).await {
        Ok(assets) => HttpResponse::Ok().json(json!({ "assets": assets })),
        Err(e) => {
            log::error!("asset list error user_id={}: {e}", *user_id);
            HttpResponse::InternalServerError().json(json!({ "error": "internal error" }))
        }
    }
}
