//! Mapping of raw model replies onto typed extraction results.
//!
//! Replies are expected to be JSON objects. Keys follow the Portuguese names
//! used in the prompts, English aliases are accepted as well.

use serde::Deserialize;
use serde_json::Value;
use time::{macros::format_description, Date};

use super::prompts::NO_INSIGHT;
use super::types::{ExtractionFailure, Intent, QueryParams, ReceiptData};
use crate::transactions::{NewTransaction, TransactionKind, DEFAULT_CATEGORY};

const DEFAULT_DESCRIPTION: &str = "Sem descrição";
const RECEIPT_DESCRIPTION: &str = "Compra de comprovante";

/// Remove markdown code fences models sometimes wrap around JSON.
pub fn strip_code_fences(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

fn parse_object(raw: &str) -> Result<serde_json::Map<String, Value>, ExtractionFailure> {
    match serde_json::from_str::<Value>(strip_code_fences(raw)) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ExtractionFailure::new("reply is not a json object")),
        Err(e) => Err(ExtractionFailure::new(format!("malformed json: {}", e))),
    }
}

pub fn parse_date(s: &str) -> Option<Date> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// Amounts arrive as numbers or as strings such as "50,00" or "R$ 12.5".
fn amount_from_value(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_start_matches("R$")
                .trim()
                .replace(',', ".");
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
struct RawTransaction {
    #[serde(default, alias = "type", alias = "kind")]
    tipo: Option<String>,
    #[serde(default, alias = "amount", alias = "value")]
    valor: Option<Value>,
    #[serde(default, alias = "description")]
    descricao: Option<String>,
    #[serde(default, alias = "category")]
    categoria: Option<String>,
    #[serde(default, alias = "date")]
    data: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

impl RawTransaction {
    fn from_map(map: serde_json::Map<String, Value>) -> Result<Self, ExtractionFailure> {
        serde_json::from_value(Value::Object(map))
            .map_err(|e| ExtractionFailure::new(format!("unexpected reply shape: {}", e)))
    }

    fn failure(&self, reason: impl Into<String>) -> ExtractionFailure {
        ExtractionFailure {
            reason: reason.into(),
            partial_amount: self.valor.as_ref().and_then(amount_from_value),
            partial_description: non_empty(self.descricao.clone()),
        }
    }

    fn error_reason(&self) -> Option<String> {
        self.error.as_ref().map(|e| match e {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    fn amount(&self) -> Result<f64, ExtractionFailure> {
        let value = self.valor.as_ref().ok_or_else(|| self.failure("missing valor"))?;
        let amount = amount_from_value(value).ok_or_else(|| self.failure("invalid valor"))?;
        Ok(amount.abs())
    }
}

pub fn parse_intent(raw: &str) -> Intent {
    match parse_object(raw) {
        Ok(map) => map
            .get("intent")
            .and_then(Value::as_str)
            .map(Intent::parse)
            .unwrap_or(Intent::Unknown),
        Err(_) => Intent::Unknown,
    }
}

pub fn parse_transaction(raw: &str) -> Result<NewTransaction, ExtractionFailure> {
    let tx = RawTransaction::from_map(parse_object(raw)?)?;
    if let Some(reason) = tx.error_reason() {
        return Err(tx.failure(reason));
    }

    let amount = tx.amount()?;
    let kind = match tx.tipo.as_deref() {
        None => TransactionKind::Expense,
        Some(t) => TransactionKind::parse(t)
            .ok_or_else(|| tx.failure(format!("unknown tipo {:?}", t)))?,
    };
    let date = tx
        .data
        .as_deref()
        .ok_or_else(|| tx.failure("missing data"))
        .and_then(|d| parse_date(d).ok_or_else(|| tx.failure(format!("invalid data {:?}", d))))?;

    Ok(NewTransaction {
        description: non_empty(tx.descricao).unwrap_or_else(|| DEFAULT_DESCRIPTION.into()),
        amount,
        kind,
        category: non_empty(tx.categoria).unwrap_or_else(|| DEFAULT_CATEGORY.into()),
        transaction_date: date,
    })
}

pub fn parse_receipt(raw: &str, today: Date) -> Result<ReceiptData, ExtractionFailure> {
    let tx = RawTransaction::from_map(parse_object(raw)?)?;
    if let Some(reason) = tx.error_reason() {
        return Err(tx.failure(reason));
    }

    let amount = tx.amount()?;
    let date = match tx.data.as_deref() {
        None => today,
        Some(d) => parse_date(d).ok_or_else(|| tx.failure(format!("invalid data {:?}", d)))?,
    };

    Ok(ReceiptData {
        description: non_empty(tx.descricao).unwrap_or_else(|| RECEIPT_DESCRIPTION.into()),
        amount,
        category: non_empty(tx.categoria).unwrap_or_else(|| DEFAULT_CATEGORY.into()),
        date,
    })
}

#[derive(Debug, Deserialize)]
struct RawQuery {
    #[serde(default, alias = "categoria")]
    category: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

pub fn parse_query_params(raw: &str) -> Result<QueryParams, ExtractionFailure> {
    let q: RawQuery = serde_json::from_value(Value::Object(parse_object(raw)?))
        .map_err(|e| ExtractionFailure::new(format!("unexpected reply shape: {}", e)))?;
    if q.error.is_some() {
        return Err(ExtractionFailure::new("service reported an error"));
    }

    let start = q
        .start_date
        .as_deref()
        .and_then(parse_date)
        .ok_or_else(|| ExtractionFailure::new("missing or invalid start_date"))?;
    let end = q
        .end_date
        .as_deref()
        .and_then(parse_date)
        .ok_or_else(|| ExtractionFailure::new("missing or invalid end_date"))?;
    if start > end {
        return Err(ExtractionFailure::new("start_date after end_date"));
    }

    Ok(QueryParams {
        category: non_empty(q.category),
        start_date: start,
        end_date: end,
    })
}

pub fn parse_insight(raw: &str) -> Option<String> {
    let insight = raw.trim();
    if insight.is_empty() || insight.contains(NO_INSIGHT) {
        return None;
    }
    Some(insight.to_string())
}
