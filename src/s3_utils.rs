// Object-storage path conventions and public/presigned URL helpers.

use std::time::Duration;

use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::presigning::PresigningConfig;
use uuid::Uuid;

/// Presigned upload URLs handed to the worker stay valid for 15 minutes.
pub const UPLOAD_URL_TTL: Duration = Duration::from_secs(15 * 60);

pub fn input_object_key(user_id: Uuid, job_id: Uuid, ext: &str) -> String {
    format!("inputs/{user_id}/{job_id}.{ext}")
}

pub fn result_object_key(user_id: Uuid, job_id: Uuid, ext: &str) -> String {
    format!("results/{user_id}/{job_id}.{ext}")
}

pub fn build_public_url(base: &str, bucket: &str, key: &str) -> String {
    let trimmed = base.trim_end_matches('/');

    // Simple templating: https://host/{bucket}/{key} or https://bucket.host/{key}
    if trimmed.contains("{bucket}") || trimmed.contains("{key}") {
        return trimmed.replace("{bucket}", bucket).replace("{key}", key);
    }

    // Base already carries the bucket (virtual-hosted style), append the key.
    if trimmed.contains(bucket) {
        format!("{}/{}", trimmed, key)
    } else {
        format!("{}/{}/{}", trimmed, bucket, key)
    }
}

/// Short-lived PUT URL the worker uses to write the generated image.
pub async fn presign_result_upload(
    client: &S3Client,
    bucket: &str,
    key: &str,
    content_type: &str,
) -> Result<String, String> {
    let config = PresigningConfig::expires_in(UPLOAD_URL_TTL).map_err(|e| e.to_string())?;

    let presigned = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .content_type(content_type)
        .presigned(config)
        .await
        .map_err(|e| e.to_string())?;

    Ok(presigned.uri().to_string())
}
