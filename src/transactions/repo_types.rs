use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

use crate::error::StorageError;

/// Fallback label when a category cannot be determined.
pub const DEFAULT_CATEGORY: &str = "Outros";

/// Suggested categories offered to the extraction service. Storage accepts any label.
pub const CATEGORIES: [&str; 9] = [
    "Alimentação",
    "Transporte",
    "Moradia",
    "Lazer",
    "Saúde",
    "Educação",
    "Trabalho",
    "Compras",
    DEFAULT_CATEGORY,
];

/// Direction of a transaction. The amount is always stored as a magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    #[serde(alias = "despesa")]
    Expense,
    #[serde(alias = "receita")]
    Income,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Expense => "expense",
            TransactionKind::Income => "income",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "expense" | "despesa" => Some(TransactionKind::Expense),
            "income" | "receita" => Some(TransactionKind::Income),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields of a transaction about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub description: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category: String,
    pub transaction_date: Date,
}

#[derive(Debug, FromRow)]
pub struct TransactionRow {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    pub amount: f64,
    pub kind: String,
    pub category: String,
    pub transaction_date: Date,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category: String,
    pub transaction_date: Date,
    pub created_at: OffsetDateTime,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = StorageError;

    fn try_from(r: TransactionRow) -> Result<Self, Self::Error> {
        let kind = TransactionKind::parse(&r.kind).ok_or_else(|| StorageError::InvalidRow {
            id: r.id,
            reason: format!("unknown kind {:?}", r.kind),
        })?;
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            description: r.description,
            amount: r.amount,
            kind,
            category: r.category,
            transaction_date: r.transaction_date,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Balance {
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

/// Expense totals keyed by `YYYY-MM`, months ascending, categories ascending within a month.
pub type MonthlySpending = BTreeMap<String, Vec<CategoryTotal>>;
