#![cfg(feature = "web")]

use crate::config::Config;
use axum::http::StatusCode;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use log::{info, warn};
use reqwest::header::CONTENT_TYPE;
use serde_json::{Value, json};
use thiserror::Error;

const DEFAULT_IMAGE_TYPE: &str = "image/png";

/// Failure talking to one of the automation webhooks
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Webhook responded with {status} {text}")]
    Status { status: u16, text: String },
    #[error("Webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("The {0} webhook is not configured")]
    NotConfigured(&'static str),
    #[error("{0}")]
    Empty(&'static str),
}

impl WebhookError {
    /// Status the dashboard API answers with for this failure
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::Status { .. } | WebhookError::Transport(_) => StatusCode::BAD_GATEWAY,
            WebhookError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            WebhookError::Empty(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Image returned by the prompt-to-image webhook
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Image uploaded by the user for description
#[derive(Clone, Debug, PartialEq)]
pub struct ImageUpload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// JSON body sent to the description webhook
    pub fn request_body(&self) -> Value {
        json!({
            "image": STANDARD.encode(&self.bytes),
            "filename": self.filename,
            "mimeType": self.mime_type,
        })
    }
}

/// Client for the dataset, image generation and image description webhooks
///
/// Calls are not retried. A non-2xx answer becomes [`WebhookError::Status`].
#[derive(Clone, Debug)]
pub struct WebhookClient {
    http: reqwest::Client,
    dataset_url: Option<String>,
    image_url: Option<String>,
    describe_url: Option<String>,
}

impl WebhookClient {
    pub fn new(config: &Config) -> Result<Self, WebhookError> {
        let http = reqwest::Client::builder()
            .timeout(config.webhook_timeout)
            .build()?;
        Ok(Self {
            http,
            dataset_url: config.dataset_url.clone(),
            image_url: config.image_url.clone(),
            describe_url: config.describe_url.clone(),
        })
    }

    async fn post(
        &self,
        url: &Option<String>,
        name: &'static str,
        body: &Value,
    ) -> Result<reqwest::Response, WebhookError> {
        let url = url.as_deref().ok_or(WebhookError::NotConfigured(name))?;
        info!("calling {} webhook", name);
        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("{} webhook answered {}", name, status);
            return Err(WebhookError::Status {
                status: status.as_u16(),
                text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }
        Ok(response)
    }

    /// Fetches the dataset to chart
    ///
    /// The body is parsed as JSON when possible, otherwise returned as a JSON
    /// string holding the raw text.
    pub async fn fetch_dataset(&self) -> Result<Value, WebhookError> {
        let response = self.post(&self.dataset_url, "dataset", &json!({})).await?;
        let text = response.text().await?;
        Ok(crate::normalizer::parse_body(&text))
    }

    /// Sends a prompt and returns the generated image bytes
    pub async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, WebhookError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(WebhookError::Empty("Prompt must not be empty"));
        }
        let response = self
            .post(&self.image_url, "image", &json!({ "prompt": prompt }))
            .await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_IMAGE_TYPE)
            .to_string();
        let bytes = response.bytes().await?.to_vec();
        Ok(GeneratedImage {
            bytes,
            content_type,
        })
    }

    /// Sends an uploaded image and returns the textual description
    pub async fn describe_image(&self, upload: &ImageUpload) -> Result<String, WebhookError> {
        if upload.bytes.is_empty() {
            return Err(WebhookError::Empty("Image must not be empty"));
        }
        let response = self
            .post(&self.describe_url, "describe", &upload.request_body())
            .await?;
        Ok(response.text().await?)
    }
}
