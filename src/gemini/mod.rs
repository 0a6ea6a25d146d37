pub mod client;
pub mod parsing;
pub mod prompts;
pub mod types;

use async_trait::async_trait;

use crate::transactions::{MonthlySpending, NewTransaction};

pub use client::GeminiClient;
pub use types::{ExtractionFailure, Intent, QueryParams, ReceiptData};

/// Language-understanding service. Every operation degrades instead of
/// failing: `Unknown`, an `ExtractionFailure`, or `None`.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn classify_intent(&self, text: &str) -> Intent;

    async fn extract_transaction_from_text(
        &self,
        text: &str,
    ) -> Result<NewTransaction, ExtractionFailure>;

    async fn extract_query_params(&self, text: &str) -> Result<QueryParams, ExtractionFailure>;

    async fn extract_transaction_from_image(
        &self,
        image: &[u8],
    ) -> Result<ReceiptData, ExtractionFailure>;

    /// A short user-facing message, or `None` when nothing is notable.
    async fn generate_insight(&self, summary: &MonthlySpending) -> Option<String>;
}
