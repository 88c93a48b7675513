// src/api/projects.rs

use actix_web::web::ReqData;
use actix_web::{HttpResponse, Responder, get, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, db};

const DEFAULT_PAGE_SIZE: i64 = 12;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ProjectsQuery {
    pub limit: Option<i64>,
    /// `updated_at` of the last item on the previous page, RFC 3339.
    pub cursor: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "dashboard",
    params(
        ("limit" = Option<i64>, Query, description = "Page size, default 12"),
        ("cursor" = Option<String>, Query, description = "updated_at of the last item on the previous page")
    ),
    responses(
        (status = 200, description = "Page of projects, newest first, plus next_cursor"),
        (status = 400, description = "Malformed cursor")
    )
)]
#[get("/projects")]
pub async fn list_projects(
    query: web::Query<ProjectsQuery>,
    state: web::Data<AppState>,
    user_id: ReqData<Uuid>,
) -> impl Responder {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let cursor: Option<DateTime<Utc>> = match query.cursor.as_deref() {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(_) => {
                return HttpResponse::BadRequest().json(json!({ "error": "invalid cursor" }));
            }
        },
        None => None,
    };

    match db::list_projects_page(&state.pool, *user_id, limit, cursor).await {
        Ok(projects) => {
            let next_cursor = db::next_cursor(&projects, limit);
            HttpResponse::Ok().json(json!({
                "projects": projects,
                "next_cursor": next_cursor,
            }))
        }
        Err(e) => {
            log::error!("project list error user_id={}: {e}", *user_id);
            HttpResponse::InternalServerError().json(json!({ "error": "internal error" }))
        }
    }
}
