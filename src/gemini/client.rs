use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use tracing::{debug, warn};

use super::parsing::{parse_insight, parse_intent, parse_query_params, parse_receipt, parse_transaction};
use super::prompts;
use super::types::{
    Content, ExtractionFailure, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    InlineData, Intent, Part, QueryParams, ReceiptData,
};
use super::Extractor;
use crate::clock::Clock;
use crate::config::GeminiConfig;
use crate::error::ExtractionError;
use crate::transactions::{MonthlySpending, NewTransaction};

const JSON_MIME: &str = "application/json";
const RECEIPT_MIME: &str = "image/jpeg";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    insight_model: String,
    clock: Arc<dyn Clock>,
}

impl GeminiClient {
    pub fn new(cfg: &GeminiConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            client: Client::new(),
            api_key: cfg.api_key.clone(),
            base_url: cfg.api_base.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            insight_model: cfg.insight_model.clone(),
            clock,
        }
    }

    async fn generate_content(
        &self,
        model: &str,
        parts: Vec<Part>,
        json_reply: bool,
    ) -> Result<String, ExtractionError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let payload = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: json_reply.then(|| GenerationConfig {
                response_mime_type: JSON_MIME.to_string(),
            }),
        };

        let res = self.client.post(&url).json(&payload).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ExtractionError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body: GenerateContentResponse = res.json().await?;
        let text = body.first_text().ok_or(ExtractionError::EmptyResponse)?;
        debug!(model, chars = text.len(), "gemini reply received");
        Ok(text)
    }

    async fn ask_json(&self, prompt: String) -> Result<String, ExtractionError> {
        self.generate_content(&self.model, vec![Part::Text { text: prompt }], true)
            .await
    }
}

#[async_trait]
impl Extractor for GeminiClient {
    async fn classify_intent(&self, text: &str) -> Intent {
        match self.ask_json(prompts::classify_intent(text)).await {
            Ok(raw) => parse_intent(&raw),
            Err(e) => {
                warn!(error = %e, "classify_intent failed");
                Intent::Unknown
            }
        }
    }

    async fn extract_transaction_from_text(
        &self,
        text: &str,
    ) -> Result<NewTransaction, ExtractionFailure> {
        let raw = self
            .ask_json(prompts::extract_transaction(text, self.clock.today()))
            .await
            .map_err(|e| {
                warn!(error = %e, "extract_transaction_from_text failed");
                ExtractionFailure::new(e.to_string())
            })?;
        parse_transaction(&raw)
    }

    async fn extract_query_params(&self, text: &str) -> Result<QueryParams, ExtractionFailure> {
        let raw = self
            .ask_json(prompts::extract_query_params(text, self.clock.today()))
            .await
            .map_err(|e| {
                warn!(error = %e, "extract_query_params failed");
                ExtractionFailure::new(e.to_string())
            })?;
        parse_query_params(&raw)
    }

    async fn extract_transaction_from_image(
        &self,
        image: &[u8],
    ) -> Result<ReceiptData, ExtractionFailure> {
        let today = self.clock.today();
        let parts = vec![
            Part::Text {
                text: prompts::extract_receipt(today),
            },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: RECEIPT_MIME.to_string(),
                    data: STANDARD.encode(image),
                },
            },
        ];
        let raw = self
            .generate_content(&self.model, parts, true)
            .await
            .map_err(|e| {
                warn!(error = %e, bytes = image.len(), "extract_transaction_from_image failed");
                ExtractionFailure::new(e.to_string())
            })?;
        parse_receipt(&raw, today)
    }

    async fn generate_insight(&self, summary: &MonthlySpending) -> Option<String> {
        let reply = async {
            let prompt = prompts::spending_insight(summary)?;
            let raw = self
                .generate_content(&self.insight_model, vec![Part::Text { text: prompt }], false)
                .await?;
            Ok::<String, ExtractionError>(raw)
        };
        match reply.await {
            Ok(raw) => parse_insight(&raw),
            Err(e) => {
                warn!(error = %e, months = summary.len(), "generate_insight failed");
                None
            }
        }
    }
}
