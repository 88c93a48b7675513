// src/main.rs
use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::Client as S3Client;
use dotenvy::dotenv;
use sqlx::PgPool;
use std::env;
use std::time::Duration;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use kitstudio::{AppState, api, docs};

async fn index() -> impl Responder {
    HttpResponse::Ok().body("KitStudio API ready")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let s3_bucket = env::var("S3_BUCKET").expect("S3_BUCKET required");
    let s3_endpoint = env::var("S3_ENDPOINT").ok();
    let s3_public_base_url = env::var("S3_PUBLIC_BASE_URL")
        .unwrap_or_else(|_| format!("https://{}.s3.amazonaws.com", s3_bucket));

    let worker_url = env::var("WORKER_WEBHOOK_URL").expect("WORKER_WEBHOOK_URL required");
    let worker_secret = env::var("WORKER_CALLBACK_SECRET").expect("WORKER_CALLBACK_SECRET required");
    let callback_base_url =
        env::var("CALLBACK_BASE_URL").unwrap_or_else(|_| "https://your-domain.com".to_string());
    let jwt_secret = env::var("AUTH_JWT_SECRET").expect("AUTH_JWT_SECRET required");

    let region_provider = RegionProviderChain::default_provider().or_else("us-east-1");
    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await;
    let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&aws_config);

    // Allow custom S3-compatible endpoints (e.g., MinIO)
    if let Some(endpoint) = s3_endpoint {
        s3_config_builder = s3_config_builder
            .endpoint_url(endpoint)
            .force_path_style(true);
    }

    let s3_client = S3Client::from_conf(s3_config_builder.build());

    // All outbound calls carry a bounded timeout; a stuck worker surfaces as
    // a dispatch failure instead of a hung request.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("reqwest client");

    let state = web::Data::new(AppState {
        pool,
        s3_client,
        s3_bucket,
        s3_public_base_url,
        http,
        worker_url,
        worker_secret,
        callback_base_url,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/", web::get().to(index))
            .service(
                SwaggerUi::new("/docs/{_:.*}")
                    .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
            )
            // Authenticated API
            .service(
                web::scope("/api")
                    .wrap(api::auth::JwtAuth::new(jwt_secret.clone()))
                    .service(api::jobs::submit_generation)
                    .service(api::jobs::get_job)
                    .service(api::dashboard::summary)
                    .service(api::projects::list_projects)
                    .service(api::assets::list_assets)
                    .service(api::credits::credit_balance)
                    .service(api::credits::credit_history)
                    .service(api::credits::initiate_topup)
                    .service(api::profile::save_onboarding),
            )
            // Webhooks (public, signature-authenticated)
            .service(api::webhooks::worker_callback)
    })
    .bind(("0.0.0.0", 8080))?
    .run()
    .await
}
