// src/api/jobs.rs

use actix_multipart::Multipart;
use actix_web::web::ReqData;
use actix_web::{HttpResponse, Responder, get, post, web};
use aws_sdk_s3::primitives::ByteStream;
use futures_util::StreamExt;
use serde_json::json;
use uuid::Uuid;

use crate::api::worker_client::{self, DispatchRequest};
use crate::models::JobType;
use crate::{AppState, credits, db, s3_utils};

#[utoipa::path(
    post,
    path = "/api/generate",
    tag = "jobs",
    responses(
        (status = 200, description = "Job accepted, returns job_id for polling"),
        (status = 400, description = "Missing image file or invalid field"),
        (status = 402, description = "Insufficient credits"),
        (status = 404, description = "Referenced project not found"),
        (status = 502, description = "Worker dispatch failed, job marked error")
    )
)]
#[post("/generate")]
pub async fn submit_generation(
    mut payload: Multipart,
    state: web::Data<AppState>,
    user_id: ReqData<Uuid>,
) -> impl Responder {
    let user_id = user_id.into_inner();

    // Advisory precondition only: the actual debit happens later in the
    // webhook, so two in-flight submissions can both pass with one credit
    // left. Accepted over-admission, not silently "fixed".
    let balance = match credits::current_balance(&state.pool, user_id).await {
        Ok(b) => b,
        Err(e) => {
            log::error!("balance lookup error user_id={user_id}: {e}");
            return HttpResponse::InternalServerError().json(json!({ "error": "internal error" }));
        }
    };
    if balance.amount() <= 0 {
        return HttpResponse::PaymentRequired().json(json!({ "error": "insufficient credits" }));
    }

    let mut image_bytes: Vec<u8> = Vec::new();
    let mut filename = "image.png".to_string();
    let mut job_type = JobType::Generate;
    let mut project_id: Option<Uuid> = None;

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(f) => f,
            Err(_) => continue,
        };

        let name = field.name().to_string();
        match name.as_str() {
            "image" => {
                if let Some(fname) = field.content_disposition().get_filename() {
                    filename = sanitize_filename(fname);
                }
                while let Some(chunk) = field.next().await {
                    if let Ok(data) = chunk {
                        image_bytes.extend_from_slice(&data);
                    }
                }
            }
            "type" => {
                let text = field_text(&mut field).await;
                if text.is_empty() {
                    continue;
                }
                match JobType::parse(&text) {
                    Some(t) => job_type = t,
                    None => {
                        return HttpResponse::BadRequest()
                            .json(json!({ "error": "invalid job type" }));
                    }
                }
            }
            "project_id" => {
                let text = field_text(&mut field).await;
                if text.is_empty() {
                    continue;
                }
                match text.parse::<Uuid>() {
                    Ok(id) => project_id = Some(id),
                    Err(_) => {
                        return HttpResponse::BadRequest()
                            .json(json!({ "error": "invalid project_id" }));
                    }
                }
            }
            _ => {
                // Drain unknown fields.
                while field.next().await.is_some() {}
            }
        }
    }

    if image_bytes.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "error": "image file is required" }));
    }

    // Foreign-owned projects read as missing.
    if let Some(pid) = project_id {
        match db::project_owned_by(&state.pool, pid, user_id).await {
            Ok(true) => {}
            Ok(false) => {
                return HttpResponse::NotFound().json(json!({ "error": "project not found" }));
            }
            Err(e) => {
                log::error!("project lookup error project_id={pid}: {e}");
                return HttpResponse::InternalServerError()
                    .json(json!({ "error": "internal error" }));
            }
        }
    }

    let job_id = Uuid::new_v4();
    let ext = file_extension(&filename);
    let input_key = s3_utils::input_object_key(user_id, job_id, &ext);
    let result_key = s3_utils::result_object_key(user_id, job_id, "png");
    let mock_s3 = std::env::var("MOCK_S3").unwrap_or_default() == "true";

    let input_url = s3_utils::build_public_url(&state.s3_public_base_url, &state.s3_bucket, &input_key);

    if !mock_s3 {
        let stream = ByteStream::from(image_bytes.clone());
        if let Err(e) = state
            .s3_client
            .put_object()
            .bucket(&state.s3_bucket)
            .key(&input_key)
            .content_type("application/octet-stream")
            .body(stream)
            .send()
            .await
        {
            log::error!("input upload failed job_id={job_id}: {e}");
            return HttpResponse::InternalServerError()
                .json(json!({ "error": "failed to store upload" }));
        }
    }

    let new_job = db::NewJob {
        id: job_id,
        user_id,
        project_id,
        job_type,
        input_url: Some(input_url.clone()),
    };
    // Job creation failure means the worker is never contacted.
    if let Err(e) = db::insert_job(&state.pool, &new_job).await {
        log::error!("job insert error user_id={user_id}: {e}");
        return HttpResponse::InternalServerError().json(json!({ "error": "internal error" }));
    }

    let output_url =
        s3_utils::build_public_url(&state.s3_public_base_url, &state.s3_bucket, &result_key);
    let upload_url = if mock_s3 {
        output_url.clone()
    } else {
        match s3_utils::presign_result_upload(
            &state.s3_client,
            &state.s3_bucket,
            &result_key,
            "image/png",
        )
        .await
        {
            Ok(url) => url,
            Err(e) => {
                log::error!("presign failed job_id={job_id}: {e}");
                if let Err(e) =
                    db::mark_job_error(&state.pool, job_id, "failed to presign upload").await
                {
                    log::error!("failed to mark job error job_id={job_id}: {e}");
                }
                return HttpResponse::InternalServerError()
                    .json(json!({ "error": "internal error" }));
            }
        }
    };

    let callback_url = format!(
        "{}/webhooks/worker",
        state.callback_base_url.trim_end_matches('/')
    );
    let dispatch = DispatchRequest {
        job_id,
        user_id,
        job_type,
        input_url,
        upload_url,
        output_url,
        callback_url,
    };

    match worker_client::dispatch_job(&state.http, &state.worker_url, &dispatch, image_bytes, &filename).await
    {
        Ok(()) => HttpResponse::Ok().json(json!({ "job_id": job_id })),
        Err(e) => {
            log::error!("worker dispatch failed job_id={job_id}: {e}");
            if let Err(e) = db::mark_job_error(&state.pool, job_id, "worker dispatch failed").await
            {
                log::error!("failed to mark job error job_id={job_id}: {e}");
            }
            HttpResponse::BadGateway().json(json!({ "error": "worker dispatch failed" }))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    tag = "jobs",
    params(("id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Current job state", body = crate::models::Job),
        (status = 404, description = "Unknown job (or owned by someone else)")
    )
)]
#[get("/jobs/{id}")]
pub async fn get_job(
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
    user_id: ReqData<Uuid>,
) -> impl Responder {
    match db::get_job_for_user(&state.pool, path.into_inner(), *user_id).await {
        Ok(Some(job)) => HttpResponse::Ok().json(job),
        Ok(None) => HttpResponse::NotFound().json(json!({ "error": "not found" })),
        Err(e) => {
            log::error!("job fetch error: {e}");
            HttpResponse::InternalServerError().json(json!({ "error": "internal error" }))
        }
    }
}

async fn field_text(field: &mut actix_multipart::Field) -> String {
    let mut buf = Vec::new();
    while let Some(chunk) = field.next().await {
        if let Ok(data) = chunk {
            buf.extend_from_slice(&data);
        }
    }
    String::from_utf8_lossy(&buf).trim().to_string()
}

pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '.' || *c == '_' || *c == '-')
        .collect()
}

/// Extension of the uploaded file, restricted to formats the worker accepts.
pub fn file_extension(filename: &str) -> String {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" | "jpg" | "jpeg" | "webp" => ext,
        _ => "png".to_string(),
    }
}
