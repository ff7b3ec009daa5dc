//! Interpretation of processing-service responses.
//!
//! The service answers with loosely shaped JSON. Field names vary between snake_case and
//! camelCase, and a 2xx body may still carry an application error.

use super::transport::RawResponse;
use super::SubmissionError;
use crate::model::SubmissionResult;
use serde_json::{Map, Value};

const ROWS_KEYS: [&str; 2] = ["total_linhas", "totalLinhas"];
const COLUMNS_KEYS: [&str; 2] = ["total_colunas", "totalColunas"];
const CONTRACTS_KEYS: [&str; 2] = ["total_contratos", "totalContratos"];

/// Keys checked, in order, for a human-readable message on a failed request.
const HTTP_ERROR_KEYS: [&str; 3] = ["detail", "erro", "error"];

/// Keys that flag an application failure inside a 2xx body.
const APP_ERROR_KEYS: [&str; 2] = ["erro", "error"];

/// Keys holding the text inside a structured error value.
const MESSAGE_KEYS: [&str; 3] = ["msg", "detail", "message"];

pub const GENERIC_HTTP_ERROR: &str = "Erro ao processar arquivo";
pub const MALFORMED_BODY: &str = "Resposta inválida do servidor";

/// Turn a completed exchange into a result or a typed error.
pub fn interpret_response(resp: &RawResponse) -> Result<SubmissionResult, SubmissionError> {
    if !resp.status.is_success() {
        return Err(http_error(resp));
    }

    let obj = match serde_json::from_slice::<Value>(&resp.body) {
        Ok(Value::Object(obj)) => obj,
        Ok(other) => {
            tracing::warn!(kind = json_kind(&other), "2xx body is not a JSON object");
            return Err(SubmissionError::Application(MALFORMED_BODY.to_string()));
        }
        Err(e) => {
            tracing::warn!(error = %e, "2xx body is not JSON");
            return Err(SubmissionError::Application(MALFORMED_BODY.to_string()));
        }
    };

    if let Some(flag) = APP_ERROR_KEYS
        .iter()
        .find_map(|k| obj.get(*k).filter(|v| is_set(v)))
    {
        let message = message_of(flag).unwrap_or_else(|| GENERIC_HTTP_ERROR.to_string());
        return Err(SubmissionError::Application(message));
    }

    Ok(extract_result(&obj))
}

fn http_error(resp: &RawResponse) -> SubmissionError {
    let status = resp.status.as_u16();
    let message = match serde_json::from_slice::<Value>(&resp.body) {
        Ok(Value::Object(obj)) => HTTP_ERROR_KEYS
            .iter()
            .find_map(|k| obj.get(*k).and_then(message_of))
            .unwrap_or_else(|| GENERIC_HTTP_ERROR.to_string()),
        // Parsed, but not an object: nothing to pull a message from.
        Ok(_) => GENERIC_HTTP_ERROR.to_string(),
        Err(_) => format!(
            "Erro {}: {}",
            status,
            resp.status.canonical_reason().unwrap_or("")
        )
        .trim_end()
        .to_string(),
    };
    SubmissionError::Http { status, message }
}

/// Pull the three counts out of a success payload and ignore everything else.
pub fn extract_result(obj: &Map<String, Value>) -> SubmissionResult {
    SubmissionResult {
        total_rows: first_count(obj, &ROWS_KEYS),
        total_columns: first_count(obj, &COLUMNS_KEYS),
        total_contracts: first_count(obj, &CONTRACTS_KEYS),
    }
}

fn first_count(obj: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|k| obj.get(*k).and_then(as_count))
}

fn as_count(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Whether an error flag is raised: `null`, `false`, `0` and `""` mean no error.
fn is_set(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text carried by an error value. Objects are searched for `msg`, `detail` or `message`;
/// arrays (FastAPI validation lists) use their first item.
fn message_of(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(obj) => MESSAGE_KEYS
            .iter()
            .find_map(|k| obj.get(*k).and_then(message_of)),
        Value::Array(items) => items.first().and_then(message_of),
        _ => None,
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
