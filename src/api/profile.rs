// src/api/profile.rs

use actix_web::web::ReqData;
use actix_web::{HttpResponse, Responder, post, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::{self, OnboardingFields};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct OnboardingRequest {
    pub business_name: String,
    pub business_type: String,
    pub main_goal: String,
}

#[utoipa::path(
    post,
    path = "/api/profile/onboarding",
    tag = "profile",
    request_body = OnboardingRequest,
    responses(
        (status = 200, description = "Onboarding completed"),
        (status = 400, description = "Missing required field"),
        (status = 404, description = "Profile not provisioned")
    )
)]
#[post("/profile/onboarding")]
pub async fn save_onboarding(
    payload: web::Json<OnboardingRequest>,
    state: web::Data<AppState>,
    user_id: ReqData<Uuid>,
) -> impl Responder {
    let business_name = payload.business_name.trim();
    let business_type = payload.business_type.trim();
    let main_goal = payload.main_goal.trim();

    if business_name.is_empty() || business_type.is_empty() || main_goal.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "error": "all fields are required" }));
    }

    let fields = OnboardingFields {
        business_name,
        business_type,
        main_goal,
    };

    match db::complete_onboarding(&state.pool, *user_id, &fields).await {
        Ok(0) => HttpResponse::NotFound().json(json!({ "error": "profile not found" })),
        Ok(_) => HttpResponse::Ok().json(json!({ "ok": true })),
        Err(e) => {
            log::error!("onboarding save error user_id={}: {e}", *user_id);
            HttpResponse::InternalServerError().json(json!({ "error": "internal error" }))
        }
    }
}
