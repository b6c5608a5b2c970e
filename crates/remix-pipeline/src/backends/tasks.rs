/// Signed-URL backend flow
///
/// Uploads go through `POST /upload/sign` followed by a raw `PUT` to the
/// signed storage URL; jobs live under `/tasks/*`. This is the flavor the
/// reference deployment speaks.
use super::{BackendKind, RemixBackend, RemixRequest};
use crate::asset::{RemoteAsset, UploadedAsset};
use crate::config::ClientConfig;
use crate::error::{RemixError, Result};
use crate::job::{JobId, JobStatus, JobUpdate};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Signed-URL flavor backend.
pub struct TasksBackend {
    api_url: String,
    client: reqwest::Client,
}

impl TasksBackend {
    /// Create a backend for the configured base URL.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            client: builder.build()?,
        })
    }

    /// Request a signed upload target for one file.
    async fn sign_upload(&self, filename: &str, content_type: &str) -> Result<SignUploadResponse> {
        let response = self
            .client
            .post(format!("{}/upload/sign", self.api_url))
            .json(&SignUploadRequest {
                filename,
                content_type,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemixError::UploadSigning(error_detail(response).await));
        }

        response
            .json()
            .await
            .map_err(|e| RemixError::UploadSigning(e.to_string()))
    }

    /// PUT raw file bytes to the signed URL with the server-supplied headers.
    async fn put_upload(
        &self,
        upload_url: &str,
        headers: &HashMap<String, String>,
        bytes: Vec<u8>,
    ) -> Result<()> {
        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| RemixError::UploadTransfer(e.to_string()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| RemixError::UploadTransfer(e.to_string()))?;
            header_map.insert(name, value);
        }

        let response = self
            .client
            .put(upload_url)
            .headers(header_map)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemixError::UploadTransfer(format!(
                "storage returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl RemixBackend for TasksBackend {
    fn name(&self) -> &str {
        "tasks"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Tasks
    }

    async fn is_available(&self) -> Result<bool> {
        match self
            .client
            .get(format!("{}/health", self.api_url))
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn upload(&self, asset: &UploadedAsset) -> Result<RemoteAsset> {
        if asset.filename.is_empty() {
            return Err(RemixError::InvalidInput("empty filename".to_string()));
        }

        let signed = self.sign_upload(&asset.filename, &asset.content_type).await?;
        let bytes = asset.read_bytes().await?;
        self.put_upload(&signed.upload_url, &signed.headers, bytes)
            .await?;

        Ok(RemoteAsset::Url(signed.file_url))
    }

    async fn submit(&self, request: &RemixRequest) -> Result<JobId> {
        let body = CreateTaskRequest {
            original_url: request.original.as_str(),
            reference_url: request.reference.as_ref().map(|r| r.as_str()),
            style_text: request.style_text.as_deref().unwrap_or(""),
            preset_style: request.preset.map(|p| p.id()),
            target_bpm: request.target_bpm,
            output_format: request.output_format.ext(),
            client_id: uuid::Uuid::new_v4().to_string(),
        };

        let response = self
            .client
            .post(format!("{}/tasks/create", self.api_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemixError::Submission(error_detail(response).await));
        }

        let created: CreateTaskResponse = response
            .json()
            .await
            .map_err(|e| RemixError::Submission(format!("malformed create response: {}", e)))?;

        Ok(JobId(created.task_id))
    }

    async fn status(&self, id: &JobId) -> Result<JobUpdate> {
        let response = self
            .client
            .get(format!("{}/tasks/status/{}", self.api_url, id))
            .send()
            .await
            .map_err(|e| RemixError::Status(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RemixError::Status(format!(
                "status endpoint returned {}",
                response.status()
            )));
        }

        let status: TaskStatusResponse = response
            .json()
            .await
            .map_err(|e| RemixError::Status(format!("malformed status response: {}", e)))?;

        Ok(JobUpdate {
            status: Some(JobStatus::from_wire(&status.status)),
            progress: status.progress,
            output: status.output_url,
            error: status.error,
            bpm: status.bpm,
            key: status.key,
            output_format: status.output_format,
        })
    }

    async fn download(&self, output: &str, dest: &Path) -> Result<PathBuf> {
        // Output references in this flavor are absolute URLs.
        let response = self.client.get(output).send().await?;

        if !response.status().is_success() {
            return Err(RemixError::Download(format!(
                "download returned {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        tokio::fs::write(dest, &bytes).await?;

        Ok(dest.to_path_buf())
    }
}

/// Extract the server's `detail` message from an error response, falling
/// back to the raw body or status line.
async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            if body.is_empty() {
                format!("server returned {}", status)
            } else {
                body
            }
        })
}

#[derive(Debug, Serialize)]
struct SignUploadRequest<'a> {
    filename: &'a str,
    content_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct SignUploadResponse {
    upload_url: String,
    file_url: String,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    #[allow(dead_code)]
    object_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateTaskRequest<'a> {
    original_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_url: Option<&'a str>,
    style_text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    preset_style: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_bpm: Option<u32>,
    output_format: &'a str,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateTaskResponse {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct TaskStatusResponse {
    status: String,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    output_url: Option<String>,
    #[serde(default)]
    output_format: Option<String>,
    #[serde(default)]
    bpm: Option<f64>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    error: Option<String>,
}
