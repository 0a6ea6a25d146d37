use serde::{Deserialize, Serialize};
use time::Date;

use crate::transactions::{NewTransaction, TransactionKind};

/// Purpose of a free-text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    LogTransaction,
    QuerySpending,
    QueryBalance,
    DeleteTransaction,
    ResetData,
    Greeting,
    Unknown,
}

impl Intent {
    pub fn parse(label: &str) -> Self {
        match label.trim() {
            "log_transaction" => Intent::LogTransaction,
            "query_spending" => Intent::QuerySpending,
            "query_balance" => Intent::QueryBalance,
            "delete_transaction" => Intent::DeleteTransaction,
            "reset_data" => Intent::ResetData,
            "greeting" => Intent::Greeting,
            _ => Intent::Unknown,
        }
    }
}

/// Resolved parameters of a spending question. The range is inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    pub category: Option<String>,
    pub start_date: Date,
    pub end_date: Date,
}

/// Fields read from a receipt photo. Receipts are always expenses.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptData {
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub date: Date,
}

impl From<ReceiptData> for NewTransaction {
    fn from(r: ReceiptData) -> Self {
        Self {
            description: r.description,
            amount: r.amount,
            kind: TransactionKind::Expense,
            category: r.category,
            transaction_date: r.date,
        }
    }
}

/// An extraction that could not produce a usable result. Carries whatever
/// fields the service did manage to read, for recovery hints.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractionFailure {
    pub reason: String,
    pub partial_amount: Option<f64>,
    pub partial_description: Option<String>,
}

impl ExtractionFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            ..Default::default()
        }
    }
}

// --- wire types for models/{model}:generateContent ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub response_mime_type: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidateContent {
    pub parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponsePart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, if any.
    pub fn first_text(self) -> Option<String> {
        self.candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|p| p.into_iter().find_map(|p| p.text))
    }
}
