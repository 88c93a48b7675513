use chrono::{Duration, Utc};
use uuid::Uuid;

use kitstudio::api::jobs::{file_extension, sanitize_filename};
use kitstudio::api::signing::{sign_hmac_sha256_hex, verify_hmac_sha256_hex};
use kitstudio::credits::credit_cost;
use kitstudio::db::next_cursor;
use kitstudio::models::{JobStatus, JobType, LedgerReason, ProjectItem, ProjectStatus};
use kitstudio::s3_utils::{build_public_url, input_object_key, result_object_key};

#[test]
fn credit_cost_uses_tokens_or_flat_rate() {
    assert_eq!(credit_cost(Some(2)), 2);
    assert_eq!(credit_cost(Some(1)), 1);
    // Zero, absent and nonsense usage all fall back to one credit.
    assert_eq!(credit_cost(Some(0)), 1);
    assert_eq!(credit_cost(None), 1);
    assert_eq!(credit_cost(Some(-5)), 1);
}

#[test]
fn signature_is_keyed_hex() {
    let sig = sign_hmac_sha256_hex("secret", b"{\"job_id\":\"x\"}");
    assert_eq!(sig.len(), 64);
    assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));

    // Deterministic for the same key, different for another key or body.
    assert_eq!(sig, sign_hmac_sha256_hex("secret", b"{\"job_id\":\"x\"}"));
    assert_ne!(sig, sign_hmac_sha256_hex("other", b"{\"job_id\":\"x\"}"));
    assert_ne!(sig, sign_hmac_sha256_hex("secret", b"{\"job_id\":\"y\"}"));
}

#[test]
fn verification_matches_signing() {
    let body = b"{\"job_id\":\"x\"}";
    let sig = sign_hmac_sha256_hex("secret", body);

    assert!(verify_hmac_sha256_hex("secret", body, &sig));
    assert!(!verify_hmac_sha256_hex("other", body, &sig));
    assert!(!verify_hmac_sha256_hex("secret", b"tampered", &sig));
    // Non-hex and wrong-length signatures are rejected, never panicked on.
    assert!(!verify_hmac_sha256_hex("secret", body, "zz-not-hex"));
    assert!(!verify_hmac_sha256_hex("secret", body, "deadbeef"));
    assert!(!verify_hmac_sha256_hex("secret", body, ""));
}

#[test]
fn object_keys_follow_path_convention() {
    let user = Uuid::new_v4();
    let job = Uuid::new_v4();
    assert_eq!(
        result_object_key(user, job, "png"),
        format!("results/{user}/{job}.png")
    );
    assert_eq!(
        input_object_key(user, job, "jpg"),
        format!("inputs/{user}/{job}.jpg")
    );
}

#[test]
fn public_url_handles_base_variants() {
    assert_eq!(
        build_public_url("https://cdn.example.com", "shots", "results/a/b.png"),
        "https://cdn.example.com/shots/results/a/b.png"
    );
    assert_eq!(
        build_public_url("https://shots.s3.amazonaws.com/", "shots", "results/a/b.png"),
        "https://shots.s3.amazonaws.com/results/a/b.png"
    );
    assert_eq!(
        build_public_url("https://host/{bucket}/x/{key}", "shots", "k.png"),
        "https://host/shots/x/k.png"
    );
}

#[test]
fn filenames_are_sanitized() {
    assert_eq!(sanitize_filename("my photo (1).png"), "myphoto1.png");
    assert_eq!(sanitize_filename("../../etc/passwd"), "....etcpasswd");
}

#[test]
fn extension_restricted_to_known_formats() {
    assert_eq!(file_extension("a.JPG"), "jpg");
    assert_eq!(file_extension("b.webp"), "webp");
    assert_eq!(file_extension("noext"), "png");
    assert_eq!(file_extension("weird.exe"), "png");
}

#[test]
fn job_type_parsing_and_reason_mapping() {
    assert_eq!(JobType::parse("generate"), Some(JobType::Generate));
    assert_eq!(JobType::parse("remove_bg"), Some(JobType::RemoveBg));
    assert_eq!(JobType::parse("template"), Some(JobType::Template));
    assert_eq!(JobType::parse("upscale"), None);

    // remove_bg has no ledger reason of its own; it debits as generate.
    assert_eq!(JobType::RemoveBg.ledger_reason(), LedgerReason::Generate);
    assert_eq!(JobType::Template.ledger_reason(), LedgerReason::Template);
}

#[test]
fn status_terminality() {
    assert!(JobStatus::Done.is_terminal());
    assert!(JobStatus::Error.is_terminal());
    assert!(!JobStatus::Queued.is_terminal());
    assert!(!JobStatus::Processing.is_terminal());

    // Wire format is snake_case; unknown statuses fail to parse.
    assert_eq!(
        serde_json::from_str::<JobStatus>("\"done\"").expect("parse done"),
        JobStatus::Done
    );
    assert!(serde_json::from_str::<JobStatus>("\"finished\"").is_err());
}

fn project(age_minutes: i64) -> ProjectItem {
    ProjectItem {
        id: Uuid::new_v4(),
        title: "p".to_string(),
        cover_url: None,
        status: ProjectStatus::Active,
        updated_at: Utc::now() - Duration::minutes(age_minutes),
    }
}

#[test]
fn cursor_only_on_full_pages() {
    let items: Vec<_> = (0..12).map(project).collect();
    let cursor = next_cursor(&items, 12).expect("full page has a cursor");
    assert_eq!(cursor, items.last().expect("non-empty").updated_at);

    assert!(next_cursor(&items, 20).is_none());
    assert!(next_cursor(&[], 12).is_none());
}
