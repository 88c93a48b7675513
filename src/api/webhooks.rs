// src/api/webhooks.rs
//
// Receiver for the generation worker's asynchronous result callbacks.
// Delivery is at-least-once; the settle in `credits::apply_job_callback`
// makes the terminal transition effectively exactly-once.

use actix_web::{HttpRequest, HttpResponse, post, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::AppState;
use crate::api::signing::verify_hmac_sha256_hex;
use crate::credits::{self, CallbackOutcome, JobCallback};
use crate::models::JobStatus;

pub const SIGNATURE_HEADER: &str = "X-Worker-Signature";

#[derive(Debug, Deserialize, ToSchema)]
pub struct WorkerCallback {
    pub job_id: Uuid,
    pub status: JobStatus,
    #[serde(default)]
    pub output_url: Option<String>,
    #[serde(default)]
    pub tokens_used: Option<i32>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[utoipa::path(
    post,
    path = "/webhooks/worker",
    tag = "webhooks",
    request_body = WorkerCallback,
    responses(
        (status = 200, description = "Callback applied (or replay acknowledged)"),
        (status = 400, description = "Malformed payload or non-terminal status"),
        (status = 401, description = "Missing or invalid signature"),
        (status = 404, description = "Unknown job"),
        (status = 500, description = "Persistence failure, worker should retry")
    )
)]
#[post("/webhooks/worker")]
pub async fn worker_callback(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> HttpResponse {
    // Signature is computed over the raw body; parse only after it checks out.
    let Some(signature) = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
    else {
        log::warn!("worker callback without signature header");
        return HttpResponse::Unauthorized().json(json!({ "error": "missing signature" }));
    };

    if !verify_hmac_sha256_hex(&state.worker_secret, &body, signature) {
        log::warn!("worker callback signature mismatch");
        return HttpResponse::Unauthorized().json(json!({ "error": "invalid signature" }));
    }

    let callback: WorkerCallback = match serde_json::from_slice(&body) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("worker callback malformed body: {e}");
            return HttpResponse::BadRequest().json(json!({ "error": "malformed payload" }));
        }
    };

    if !callback.status.is_terminal() {
        return HttpResponse::BadRequest()
            .json(json!({ "error": "status must be done or error" }));
    }

    if callback.status == JobStatus::Done && callback.output_url.is_none() {
        return HttpResponse::BadRequest()
            .json(json!({ "error": "output_url required for done" }));
    }

    let job_callback = JobCallback {
        job_id: callback.job_id,
        status: callback.status,
        output_url: callback.output_url,
        tokens_used: callback.tokens_used,
        error_message: callback.error_message,
    };

    match credits::apply_job_callback(&state.pool, &job_callback).await {
        Ok(CallbackOutcome::Applied { user_id, debited }) => {
            log::info!(
                "worker callback applied job_id={} user_id={} status={:?} debited={}",
                job_callback.job_id,
                user_id,
                job_callback.status,
                debited
            );
            HttpResponse::Ok().json(json!({ "ok": true }))
        }
        Ok(CallbackOutcome::AlreadyTerminal) => {
            log::info!(
                "worker callback replay ignored job_id={}",
                job_callback.job_id
            );
            HttpResponse::Ok().json(json!({ "ok": true, "idempotent": true }))
        }
        Ok(CallbackOutcome::UnknownJob) => {
            HttpResponse::NotFound().json(json!({ "error": "job not found" }))
        }
        Err(e) => {
            log::error!(
                "worker callback persistence error job_id={}: {e}",
                job_callback.job_id
            );
            HttpResponse::InternalServerError().json(json!({ "error": "internal error" }))
        }
    }
}
