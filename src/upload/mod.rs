// SPDX-License-Identifier: GPL-3.0-only

//! Upload pipeline to the skin-analysis backend
//!
//! Holds the "currently selected image" the rest of the app analyzes, and
//! speaks the backend's HTTP contracts: multipart upload for `/analyze`
//! and `/compare`, JSON for `/chat`, plain GETs for `/history` and the PDF
//! report download. Every request carries the per-client `session_id`
//! cookie the service uses to group anonymous reports.

pub mod models;

pub use models::{
    AnalyzeResponse, CompareResponse, ConditionReading, Recommendations, ReportSummary,
};

use crate::constants::{capture, upload as upload_consts};
use crate::errors::{AppError, UploadError};
use crate::sequencer::CapturedFrame;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// An image staged for upload
#[derive(Debug, Clone)]
pub struct SelectedImage {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl SelectedImage {
    /// Stage an image file from disk
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self {
            mime: guess_mime(path).to_string(),
            filename,
            bytes,
        })
    }

    /// Stage a captured webcam frame
    pub fn from_capture(frame: &CapturedFrame) -> Self {
        Self {
            filename: capture::CAPTURE_FILENAME.to_string(),
            mime: "image/jpeg".to_string(),
            bytes: frame.jpeg.to_vec(),
        }
    }
}

fn guess_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    reports: Vec<ReportSummary>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
}

/// HTTP client for the skin-analysis backend
pub struct UploadClient {
    http: reqwest::Client,
    base_url: String,
    session_id: Uuid,
    selected: Option<SelectedImage>,
}

impl UploadClient {
    pub fn new(base_url: &str) -> Result<Self, UploadError> {
        let http = reqwest::Client::builder()
            .timeout(upload_consts::REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_id: Uuid::new_v4(),
            selected: None,
        })
    }

    /// Stage an image as the current selection, replacing any prior one
    pub fn select_image(&mut self, image: SelectedImage) {
        debug!(
            filename = %image.filename,
            bytes = image.bytes.len(),
            "Image selected for upload"
        );
        self.selected = Some(image);
    }

    /// Stage a captured frame as the current selection
    pub fn select_capture(&mut self, frame: &CapturedFrame) {
        self.select_image(SelectedImage::from_capture(frame));
    }

    pub fn selected(&self) -> Option<&SelectedImage> {
        self.selected.as_ref()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn session_cookie(&self) -> String {
        format!("session_id={}", self.session_id)
    }

    fn image_part(image: &SelectedImage) -> Result<reqwest::multipart::Part, UploadError> {
        reqwest::multipart::Part::bytes(image.bytes.clone())
            .file_name(image.filename.clone())
            .mime_str(&image.mime)
            .map_err(UploadError::from)
    }

    /// Analyze the currently selected image (`POST /analyze`)
    pub async fn analyze(&self) -> Result<AnalyzeResponse, UploadError> {
        let image = self.selected.as_ref().ok_or(UploadError::NoImageSelected)?;

        info!(filename = %image.filename, "Uploading image for analysis");
        let form = reqwest::multipart::Form::new()
            .part(upload_consts::ANALYZE_FIELD, Self::image_part(image)?);

        let response = self
            .http
            .post(self.endpoint("/analyze"))
            .header(reqwest::header::COOKIE, self.session_cookie())
            .multipart(form)
            .send()
            .await?;
        parse_response(response).await
    }

    /// Compare two images (`POST /compare`)
    pub async fn compare(
        &self,
        before: &SelectedImage,
        after: &SelectedImage,
    ) -> Result<CompareResponse, UploadError> {
        info!(
            before = %before.filename,
            after = %after.filename,
            "Uploading before/after pair"
        );
        let form = reqwest::multipart::Form::new()
            .part(upload_consts::COMPARE_BEFORE_FIELD, Self::image_part(before)?)
            .part(upload_consts::COMPARE_AFTER_FIELD, Self::image_part(after)?);

        let response = self
            .http
            .post(self.endpoint("/compare"))
            .header(reqwest::header::COOKIE, self.session_cookie())
            .multipart(form)
            .send()
            .await?;
        parse_response(response).await
    }

    /// Fetch past analysis reports (`GET /history`)
    pub async fn history(&self) -> Result<Vec<ReportSummary>, UploadError> {
        let response = self
            .http
            .get(self.endpoint("/history"))
            .header(reqwest::header::COOKIE, self.session_cookie())
            .send()
            .await?;
        let history: HistoryResponse = parse_response(response).await?;
        Ok(history.reports)
    }

    /// Send one chat message (`POST /chat`) and return the reply
    pub async fn chat(&self, message: &str) -> Result<String, UploadError> {
        let response = self
            .http
            .post(self.endpoint("/chat"))
            .header(reqwest::header::COOKIE, self.session_cookie())
            .json(&serde_json::json!({ "message": message }))
            .send()
            .await?;
        let chat: ChatResponse = parse_response(response).await?;
        Ok(chat.response)
    }

    /// Download a PDF report (`GET /generate_pdf/:report_id`) into `dest_dir`
    pub async fn download_report_pdf(
        &self,
        report_id: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, AppError> {
        let response = self
            .http
            .get(self.endpoint(&format!("/generate_pdf/{}", report_id)))
            .header(reqwest::header::COOKIE, self.session_cookie())
            .send()
            .await
            .map_err(UploadError::from)?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        if !status.is_success() || is_json {
            // Error path: the backend answers with a JSON error body
            let body = response.text().await.map_err(UploadError::from)?;
            let envelope: models::ApiEnvelope = serde_json::from_str(&body)
                .map_err(|_| UploadError::Status(status.as_u16()))?;
            let message = envelope
                .error
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(UploadError::Backend(message).into());
        }

        let bytes = response.bytes().await.map_err(UploadError::from)?;
        std::fs::create_dir_all(dest_dir)?;
        let path = dest_dir.join(format!("report_{}.pdf", report_id));
        std::fs::write(&path, &bytes)?;
        info!(path = %path.display(), "Report PDF saved");
        Ok(path)
    }
}

/// Decode a JSON response, surfacing backend-reported errors.
///
/// The backend mixes two error shapes: `{"error": ...}` with a 4xx/5xx
/// status and `{"success": false, "error": ...}` with 200. Both are mapped
/// to [`UploadError::Backend`].
async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, UploadError> {
    let status = response.status();
    let body = response.text().await?;

    let value: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
        if status.is_success() {
            UploadError::Decode(e.to_string())
        } else {
            UploadError::Status(status.as_u16())
        }
    })?;

    if let Some(error) = value.get("error").and_then(|v| v.as_str()) {
        return Err(UploadError::Backend(error.to_string()));
    }
    if !status.is_success() {
        return Err(UploadError::Status(status.as_u16()));
    }

    serde_json::from_value(value).map_err(|e| UploadError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = UploadClient::new("http://localhost:5000/").unwrap();
        assert_eq!(client.endpoint("/analyze"), "http://localhost:5000/analyze");
    }

    #[test]
    fn test_selection_is_replaced() {
        let mut client = UploadClient::new("http://localhost:5000").unwrap();
        assert!(client.selected().is_none());

        client.select_image(SelectedImage {
            filename: "first.jpg".to_string(),
            mime: "image/jpeg".to_string(),
            bytes: vec![1],
        });
        let frame = CapturedFrame {
            jpeg: Arc::from(vec![2, 3].into_boxed_slice()),
            width: 640,
            height: 480,
            mirrored: true,
        };
        client.select_capture(&frame);

        let selected = client.selected().unwrap();
        assert_eq!(selected.filename, capture::CAPTURE_FILENAME);
        assert_eq!(selected.bytes, vec![2, 3]);
    }

    #[test]
    fn test_mime_guess_from_extension() {
        assert_eq!(guess_mime(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(guess_mime(Path::new("a.png")), "image/png");
        assert_eq!(guess_mime(Path::new("a.bin")), "application/octet-stream");
    }
}
