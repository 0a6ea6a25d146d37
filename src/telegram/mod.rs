pub mod client;
pub mod types;

use async_trait::async_trait;
use bytes::Bytes;

pub use client::TelegramClient;
pub use types::{Event, InlineButton, InlineKeyboard, MessageContent, Update};

/// Best-effort delivery channel to the chat platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Failures are logged, never returned.
    async fn send_message(&self, chat_id: i64, text: &str, keyboard: Option<&InlineKeyboard>);

    /// Resolve a file id and fetch its bytes. `None` on any failure.
    async fn download_file(&self, file_id: &str) -> Option<Bytes>;
}
