pub mod assets;
pub mod auth;
pub mod credits;
pub mod dashboard;
pub mod jobs;
pub mod profile;
pub mod projects;
pub mod signing;
pub mod webhooks;
pub mod worker_client;
