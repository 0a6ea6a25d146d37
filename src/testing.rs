//! Test doubles for the chat platform and the extraction service.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::gemini::{ExtractionFailure, Extractor, Intent, QueryParams, ReceiptData};
use crate::telegram::{InlineKeyboard, Messenger};
use crate::transactions::{MonthlySpending, NewTransaction};

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
}

#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<SentMessage>>,
    /// Bytes served for every download, `None` simulates a failed download.
    pub file: Option<Bytes>,
}

impl RecordingMessenger {
    pub fn with_file(bytes: &'static [u8]) -> Self {
        Self {
            file: Some(Bytes::from_static(bytes)),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.text).collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(&self, chat_id: i64, text: &str, keyboard: Option<&InlineKeyboard>) {
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
    }

    async fn download_file(&self, _file_id: &str) -> Option<Bytes> {
        self.file.clone()
    }
}

/// Returns canned results and records the inputs it was asked about.
pub struct ScriptedExtractor {
    pub intent: Intent,
    pub transaction: Result<NewTransaction, ExtractionFailure>,
    pub query: Result<QueryParams, ExtractionFailure>,
    pub receipt: Result<ReceiptData, ExtractionFailure>,
    pub insight: Option<String>,
    pub prompts: Mutex<Vec<String>>,
    pub summaries: Mutex<Vec<MonthlySpending>>,
}

impl Default for ScriptedExtractor {
    fn default() -> Self {
        Self {
            intent: Intent::Unknown,
            transaction: Err(ExtractionFailure::new("scripted")),
            query: Err(ExtractionFailure::new("scripted")),
            receipt: Err(ExtractionFailure::new("scripted")),
            insight: None,
            prompts: Mutex::default(),
            summaries: Mutex::default(),
        }
    }
}

impl ScriptedExtractor {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn record(&self, text: &str) {
        self.prompts.lock().unwrap().push(text.to_string());
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn classify_intent(&self, text: &str) -> Intent {
        self.record(text);
        self.intent
    }

    async fn extract_transaction_from_text(
        &self,
        text: &str,
    ) -> Result<NewTransaction, ExtractionFailure> {
        self.record(text);
        self.transaction.clone()
    }

    async fn extract_query_params(&self, text: &str) -> Result<QueryParams, ExtractionFailure> {
        self.record(text);
        self.query.clone()
    }

    async fn extract_transaction_from_image(
        &self,
        _image: &[u8],
    ) -> Result<ReceiptData, ExtractionFailure> {
        self.receipt.clone()
    }

    async fn generate_insight(&self, summary: &MonthlySpending) -> Option<String> {
        self.summaries.lock().unwrap().push(summary.clone());
        self.insight.clone()
    }
}
