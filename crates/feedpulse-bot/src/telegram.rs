//! Telegram Bot API delivery through a single `sendPhoto` call.

use async_trait::async_trait;
use feedpulse_common::{ChatId, ReportError, Result};
use feedpulse_config::TelegramConfig;
use feedpulse_graphs::TrendChart;
use feedpulse_pipeline::{Publisher, ReportMessage};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info, instrument};

/// Longest caption Telegram accepts on a photo.
pub const MAX_CAPTION_CHARS: usize = 1024;

/// Largest photo upload Telegram accepts.
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
pub struct TelegramResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<u16>,
}

/// The part of a sent message we log.
#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
}

/// Publishes reports as a photo with an HTML caption.
pub struct TelegramPublisher {
    client: reqwest::Client,
    api_url: String,
    token: String,
    chat_id: ChatId,
}

impl std::fmt::Debug for TelegramPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramPublisher")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl TelegramPublisher {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ReportError::config_with_source("Failed to build HTTP client", e))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            chat_id: config.chat_id,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// Rejects payloads Telegram would refuse, before any request is made.
    pub fn check_payload(message: &ReportMessage, chart: &TrendChart) -> Result<()> {
        let caption_chars = message.char_count();
        if caption_chars > MAX_CAPTION_CHARS {
            return Err(ReportError::delivery(format!(
                "caption has {} characters, limit is {}",
                caption_chars, MAX_CAPTION_CHARS
            )));
        }
        if chart.is_empty() {
            return Err(ReportError::delivery("chart image is empty"));
        }
        if chart.len() > MAX_PHOTO_BYTES {
            return Err(ReportError::delivery(format!(
                "chart image is {} bytes, limit is {}",
                chart.len(),
                MAX_PHOTO_BYTES
            )));
        }
        Ok(())
    }

    /// Uploads a photo with caption to the configured chat.
    #[instrument(skip(self, caption, photo), fields(chat_id = %self.chat_id, bytes = photo.len()))]
    pub async fn send_photo(
        &self,
        caption: &str,
        file_name: &str,
        photo: Vec<u8>,
    ) -> Result<SentMessage> {
        let part = Part::bytes(photo)
            .file_name(file_name.to_string())
            .mime_str("image/png")?;
        let form = Form::new()
            .text("chat_id", self.chat_id.to_string())
            .text("caption", caption.to_string())
            .text("parse_mode", "HTML")
            .part("photo", part);

        debug!("Sending photo");
        let response = self
            .client
            .post(self.method_url("sendPhoto"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ReportError::from(e.without_url()))?;

        let status = response.status();
        let body: TelegramResponse<SentMessage> = response.json().await.map_err(|e| {
            ReportError::delivery_with_source(
                format!("Invalid Telegram response (HTTP {})", status.as_u16()),
                e.without_url(),
            )
        })?;

        if !body.ok {
            let description = body
                .description
                .unwrap_or_else(|| "sendPhoto was rejected".to_string());
            return Err(ReportError::delivery_with_code(
                description,
                body.error_code.unwrap_or_else(|| status.as_u16()),
            ));
        }

        body.result
            .ok_or_else(|| ReportError::delivery("Telegram response is missing the sent message"))
    }
}

#[async_trait]
impl Publisher for TelegramPublisher {
    async fn publish(&self, message: &ReportMessage, chart: &TrendChart) -> Result<()> {
        Self::check_payload(message, chart)?;

        let sent = self
            .send_photo(message.as_str(), &chart.file_name, chart.bytes().to_vec())
            .await?;

        info!(
            message_id = sent.message_id,
            file_name = %chart.file_name,
            "Report delivered to Telegram"
        );
        Ok(())
    }
}
