use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::jobs::submit_generation,
        crate::api::jobs::get_job,
        crate::api::webhooks::worker_callback,
        crate::api::dashboard::summary,
        crate::api::projects::list_projects,
        crate::api::assets::list_assets,
        crate::api::credits::credit_balance,
        crate::api::credits::credit_history,
        crate::api::credits::initiate_topup,
        crate::api::profile::save_onboarding
    ),
    components(
        schemas(
            crate::api::webhooks::WorkerCallback,
            crate::api::credits::TopupRequest,
            crate::api::profile::OnboardingRequest,
            crate::api::dashboard::SummaryResponse,
            crate::api::dashboard::WalletSummary,
            crate::models::Job,
            crate::models::Asset,
            crate::models::ProjectItem,
            crate::models::LedgerEntry,
            crate::models::Wallet,
            crate::models::JobStatus,
            crate::models::JobType,
            crate::models::LedgerReason,
            crate::models::PlanTier,
            crate::models::ProjectStatus
        )
    ),
    tags(
        (name = "jobs", description = "Generation job submission and polling"),
        (name = "webhooks", description = "Callbacks from the generation worker"),
        (name = "dashboard", description = "Dashboard read aggregations"),
        (name = "credits", description = "Credit wallet, ledger and top-ups"),
        (name = "profile", description = "Profile onboarding")
    )
)]
pub struct ApiDoc;
