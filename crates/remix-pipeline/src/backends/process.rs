/// Multipart backend flow
///
/// Uploads go straight to `POST /upload` as multipart form data and come
/// back as opaque file ids; jobs live under `/process/*` and outputs are
/// fetched by filename from `/download/{output_file}`.
use super::{BackendKind, RemixBackend, RemixRequest};
use crate::asset::{RemoteAsset, UploadedAsset};
use crate::config::ClientConfig;
use crate::error::{RemixError, Result};
use crate::job::{JobId, JobStatus, JobUpdate};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Multipart flavor backend.
pub struct ProcessBackend {
    api_url: String,
    client: reqwest::Client,
}

impl ProcessBackend {
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
}

#[async_trait::async_trait]
impl RemixBackend for ProcessBackend {
    fn name(&self) -> &str {
        "process"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Process
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

        let bytes = asset.read_bytes().await?;
        let part = Part::bytes(bytes)
            .file_name(asset.filename.clone())
            .mime_str(&asset.content_type)
            .map_err(|e| RemixError::InvalidInput(e.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/upload", self.api_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemixError::UploadTransfer(format!(
                "upload returned {}",
                response.status()
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| RemixError::UploadTransfer(format!("malformed upload response: {}", e)))?;

        Ok(RemoteAsset::Id(uploaded.file_id))
    }

    async fn submit(&self, request: &RemixRequest) -> Result<JobId> {
        let body = StartProcessRequest {
            file_id: request.original.as_str(),
            reference_file_id: request.reference.as_ref().map(|r| r.as_str()),
            style: request.preset.map(|p| p.id()),
            style_text: request.style_text.as_deref(),
            target_bpm: request.target_bpm,
            output_format: request.output_format.ext(),
        };

        let response = self
            .client
            .post(format!("{}/process/start", self.api_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemixError::Submission(format!(
                "start returned {}",
                response.status()
            )));
        }

        let started: StartProcessResponse = response
            .json()
            .await
            .map_err(|e| RemixError::Submission(format!("malformed start response: {}", e)))?;

        Ok(JobId(started.job_id))
    }

    async fn status(&self, id: &JobId) -> Result<JobUpdate> {
        let response = self
            .client
            .get(format!("{}/process/status/{}", self.api_url, id))
            .send()
            .await
            .map_err(|e| RemixError::Status(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RemixError::Status(format!(
                "status endpoint returned {}",
                response.status()
            )));
        }

        let status: ProcessStatusResponse = response
            .json()
            .await
            .map_err(|e| RemixError::Status(format!("malformed status response: {}", e)))?;

        Ok(JobUpdate {
            status: Some(JobStatus::from_wire(&status.status)),
            progress: status.progress,
            output: status.output_file,
            error: status.error,
            bpm: None,
            key: None,
            output_format: None,
        })
    }

    async fn download(&self, output: &str, dest: &Path) -> Result<PathBuf> {
        // Output references are filenames served by the backend itself;
        // absolute URLs are passed through untouched.
        let url = if output.starts_with("http://") || output.starts_with("https://") {
            output.to_string()
        } else {
            format!("{}/download/{}", self.api_url, output)
        };

        let response = self.client.get(url).send().await?;

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

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file_id: String,
}

#[derive(Debug, Serialize)]
struct StartProcessRequest<'a> {
    file_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_file_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    style_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_bpm: Option<u32>,
    output_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct StartProcessResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct ProcessStatusResponse {
    status: String,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    output_file: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{OutputFormat, StylePreset};

    #[test]
    fn test_start_request_serialization() {
        let body = StartProcessRequest {
            file_id: "f-123",
            reference_file_id: None,
            style: Some(StylePreset::Techno.id()),
            style_text: None,
            target_bpm: None,
            output_format: OutputFormat::Wav.ext(),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["file_id"], "f-123");
        assert_eq!(json["style"], "techno");
        assert_eq!(json["output_format"], "wav");
        assert!(json.get("style_text").is_none());
    }

    #[test]
    fn test_status_response_shape() {
        let status: ProcessStatusResponse = serde_json::from_str(
            r#"{"status":"running","progress":45,"output_file":null}"#,
        )
        .unwrap();
        assert_eq!(status.status, "running");
        assert_eq!(status.progress, Some(45.0));
    }
}
