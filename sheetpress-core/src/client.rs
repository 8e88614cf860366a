//! Client for the remote conversion/publishing backend
//!
//! Both operations are multipart POSTs to a single endpoint, told apart by an
//! `action` field. Failures are reported once; nothing is retried.

use log::info;
use reqwest::blocking::{Client, multipart};
use serde::Deserialize;
use std::time::Duration;

use crate::config::BackendConfig;
use crate::error::TransportError;
use crate::reader::SPREADSHEET_MIME;

/// Backend operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Convert,
    Publish,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Convert => "convert",
            Action::Publish => "publish",
        }
    }

    /// Message shown when the server gave no reason of its own
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Action::Convert => "Failed to convert file. Please try again.",
            Action::Publish => "Failed to publish page. Please try again.",
        }
    }
}

/// Success payload shared by both actions
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendResponse {
    #[serde(default)]
    pub default_title: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    /// Published page address (publish only)
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: Option<String>,
}

/// A file ready for upload
#[derive(Debug, Clone)]
pub struct Upload<'a> {
    pub file_name: &'a str,
    pub bytes: &'a [u8],
}

pub struct BackendClient {
    endpoint: String,
    http: Client,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            http,
        })
    }

    pub fn convert(&self, upload: Upload<'_>) -> Result<BackendResponse, TransportError> {
        self.send(Action::Convert, upload, None)
    }

    pub fn publish(&self, upload: Upload<'_>, title: &str) -> Result<BackendResponse, TransportError> {
        self.send(Action::Publish, upload, Some(title))
    }

    fn send(
        &self,
        action: Action,
        upload: Upload<'_>,
        title: Option<&str>,
    ) -> Result<BackendResponse, TransportError> {
        let file_part = multipart::Part::bytes(upload.bytes.to_vec())
            .file_name(upload.file_name.to_string())
            .mime_str(SPREADSHEET_MIME)?;

        let mut form = multipart::Form::new()
            .text("action", action.as_str())
            .part("file", file_part);
        if let Some(title) = title {
            form = form.text("title", title.to_string());
        }

        info!(
            "{} '{}' via {}",
            action.as_str(),
            upload.file_name,
            self.endpoint
        );
        let response = self.http.post(&self.endpoint).multipart(form).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        interpret_response(status, &body)
    }
}

/// Turn a raw status and body into the success payload or a transport error
pub fn interpret_response(status: u16, body: &str) -> Result<BackendResponse, TransportError> {
    if (200..300).contains(&status) {
        if body.trim().is_empty() {
            return Ok(BackendResponse::default());
        }
        return Ok(serde_json::from_str(body)?);
    }

    let message = serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .and_then(|payload| payload.error)
        .filter(|m| !m.is_empty());
    Err(TransportError::Status { status, message })
}

impl TransportError {
    /// Server message verbatim when present, otherwise the action's fallback
    pub fn user_message(&self, action: Action) -> String {
        match self {
            TransportError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            _ => action.fallback_message().to_string(),
        }
    }
}
