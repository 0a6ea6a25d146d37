use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, error, warn};

use super::types::{ApiResponse, FileInfo, GetFileRequest, InlineKeyboard, SendMessageRequest};
use super::Messenger;
use crate::config::TelegramConfig;
use crate::error::DeliveryError;

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    api_url: String,
    file_url: String,
}

impl TelegramClient {
    pub fn new(cfg: &TelegramConfig) -> Self {
        let base = cfg.api_base.trim_end_matches('/');
        Self {
            client: Client::new(),
            api_url: format!("{}/bot{}", base, cfg.bot_token),
            file_url: format!("{}/file/bot{}", base, cfg.bot_token),
        }
    }

    async fn try_send(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), DeliveryError> {
        let payload = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "Markdown",
            reply_markup: keyboard,
        };
        let res = self
            .client
            .post(format!("{}/sendMessage", self.api_url))
            .json(&payload)
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body: res.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    async fn try_download(&self, file_id: &str) -> Result<Bytes, DeliveryError> {
        let res = self
            .client
            .post(format!("{}/getFile", self.api_url))
            .json(&GetFileRequest { file_id })
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body: res.text().await.unwrap_or_default(),
            });
        }

        let info: ApiResponse<FileInfo> = res.json().await?;
        if !info.ok {
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body: info.description.unwrap_or_default(),
            });
        }
        let file_path = info
            .result
            .and_then(|r| r.file_path)
            .ok_or(DeliveryError::MissingField("result.file_path"))?;

        let res = self
            .client
            .get(format!("{}/{}", self.file_url, file_path))
            .send()
            .await?
            .error_for_status()?;
        Ok(res.bytes().await?)
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str, keyboard: Option<&InlineKeyboard>) {
        match self.try_send(chat_id, text, keyboard).await {
            Ok(()) => debug!(chat_id, "message sent"),
            Err(e) => error!(error = %e, chat_id, "send_message failed"),
        }
    }

    async fn download_file(&self, file_id: &str) -> Option<Bytes> {
        match self.try_download(file_id).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(error = %e, file_id, "download_file failed");
                None
            }
        }
    }
}
