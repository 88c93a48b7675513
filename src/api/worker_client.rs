// src/api/worker_client.rs
//
// Client for the external generation worker. One multipart POST per job:
// the input image plus job metadata and upload instructions; the worker
// answers asynchronously via the signed callback webhook.

use std::fmt;

use uuid::Uuid;

use crate::models::JobType;

#[derive(Debug)]
pub enum WorkerError {
    Http(reqwest::Error),
    Api { status: u16, body: String },
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerError::Http(e) => write!(f, "http error: {e}"),
            WorkerError::Api { status, body } => {
                write!(f, "worker error status={status} body={body}")
            }
        }
    }
}

impl From<reqwest::Error> for WorkerError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

pub struct DispatchRequest {
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub job_type: JobType,
    pub input_url: String,
    /// Presigned PUT URL the worker writes the result to.
    pub upload_url: String,
    /// Stable public URL the result will be readable at.
    pub output_url: String,
    pub callback_url: String,
}

pub async fn dispatch_job(
    http: &reqwest::Client,
    worker_url: &str,
    req: &DispatchRequest,
    image: Vec<u8>,
    filename: &str,
) -> Result<(), WorkerError> {
    let form = reqwest::multipart::Form::new()
        .text("job_id", req.job_id.to_string())
        .text("user_id", req.user_id.to_string())
        .text("type", req.job_type.as_str())
        .text("input_url", req.input_url.clone())
        .text("upload_url", req.upload_url.clone())
        .text("output_url", req.output_url.clone())
        .text("callback_url", req.callback_url.clone())
        .part(
            "image",
            reqwest::multipart::Part::bytes(image).file_name(filename.to_string()),
        );

    let resp = http.post(worker_url).multipart(form).send().await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(WorkerError::Api {
            status: status.as_u16(),
            body,
        });
    }

    Ok(())
}
