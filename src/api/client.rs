use std::sync::Arc;

use serde_json::Value;

use crate::api::transport::{ApiReply, Method, Transport};
use crate::api::types::{Scenario, ScenarioSubmission, TableSummary};
use crate::error::AppError;

const SUBMIT_FALLBACK: &str = "Submission failed";
const TRIGGER_FALLBACK: &str = "Job trigger failed";
const SCENARIO_NOT_FOUND: &str = "Scenario not found";

// ============================================================================
// Helpers
// ============================================================================

/// JS-style truthiness for picking a message field: missing, null, false,
/// empty string and zero do not count.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// First truthy field of `body` among `fields`, else `fallback`.
fn pick_message(body: &Value, fields: &[&str], fallback: &str) -> Value {
    fields
        .iter()
        .filter_map(|f| body.get(*f))
        .find(|v| truthy(v))
        .cloned()
        .unwrap_or_else(|| Value::String(fallback.to_string()))
}

fn rejected(reply: &ApiReply, fields: &[&str], fallback: &str) -> AppError {
    AppError::Rejected {
        status: reply.status,
        detail: pick_message(&reply.body, fields, fallback),
    }
}

/// Read an identifier that may arrive as a JSON string or number.
fn id_field(body: &Value, field: &str) -> Option<String> {
    match body.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ============================================================================
// ScenarioClient
// ============================================================================

/// Typed wrapper over every backend call the wizard makes.
#[derive(Clone)]
pub struct ScenarioClient {
    transport: Arc<dyn Transport>,
}

impl ScenarioClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// `GET /available-tables`. Any failure yields an empty list.
    pub async fn available_tables(&self) -> Vec<String> {
        let reply = match self.transport.send(Method::Get, "/available-tables", None).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Failed to fetch available tables: {}", e);
                return Vec::new();
            }
        };
        if !reply.is_success() {
            tracing::warn!(status = reply.status, "Available tables request rejected");
            return Vec::new();
        }
        match reply.body.get("tables") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// `POST /submit`. Returns the new `scenario_id`.
    pub async fn submit(&self, submission: &ScenarioSubmission) -> Result<String, AppError> {
        let body = serde_json::to_value(submission)?;
        let reply = self.transport.send(Method::Post, "/submit", Some(body)).await?;
        if !reply.is_success() {
            return Err(rejected(&reply, &["detail", "message"], SUBMIT_FALLBACK));
        }
        id_field(&reply.body, "scenario_id").ok_or_else(|| {
            AppError::UnexpectedResponse("submit response has no scenario_id".into())
        })
    }

    /// `POST /trigger-job/{scenario_id}` with no body. Returns the `job_run_id`.
    pub async fn trigger_job(&self, scenario_id: &str) -> Result<String, AppError> {
        let path = format!("/trigger-job/{}", urlencoding::encode(scenario_id));
        let reply = self.transport.send(Method::Post, &path, None).await?;
        if !reply.is_success() {
            return Err(rejected(&reply, &["detail"], TRIGGER_FALLBACK));
        }
        id_field(&reply.body, "job_run_id").ok_or_else(|| {
            AppError::UnexpectedResponse("trigger-job response has no job_run_id".into())
        })
    }

    /// `GET /runs`. A `runs` field that is not an array yields an empty list;
    /// entries that do not decode as scenarios are skipped.
    pub async fn runs(&self) -> Result<Vec<Scenario>, AppError> {
        let reply = self.transport.send(Method::Get, "/runs", None).await?;
        if !reply.is_success() {
            return Err(rejected(&reply, &["detail", "message"], "Failed to fetch runs"));
        }
        let items = match reply.body.get("runs") {
            Some(Value::Array(items)) => items.clone(),
            other => {
                if other.is_some_and(|v| !v.is_null()) {
                    tracing::warn!("runs field is not an array; showing no runs");
                }
                return Ok(Vec::new());
            }
        };

        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Scenario>(item) {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::warn!("Skipping undecodable run entry: {}", e);
                    None
                }
            })
            .collect())
    }

    /// `GET /scenario/{scenario_id}`. Any non-2xx status is "Scenario not found".
    pub async fn scenario(&self, scenario_id: &str) -> Result<Scenario, AppError> {
        let path = format!("/scenario/{}", urlencoding::encode(scenario_id));
        let reply = self.transport.send(Method::Get, &path, None).await?;
        if !reply.is_success() {
            tracing::debug!(status = reply.status, scenario_id, "Scenario lookup rejected");
            return Err(AppError::NotFound(SCENARIO_NOT_FOUND.into()));
        }
        Ok(serde_json::from_value(reply.body)?)
    }

    /// `GET /table-summary/{table}`. A 2xx body carrying `error` is a failure.
    pub async fn table_summary(&self, table: &str) -> Result<TableSummary, AppError> {
        let path = format!("/table-summary/{}", urlencoding::encode(table));
        let reply = self.transport.send(Method::Get, &path, None).await?;
        if !reply.is_success() {
            let fallback = format!("Summary request failed (HTTP {})", reply.status);
            return Err(rejected(&reply, &["detail", "error"], &fallback));
        }
        if let Some(err) = reply.body.get("error").filter(|v| truthy(v)) {
            return Err(AppError::Rejected {
                status: reply.status,
                detail: err.clone(),
            });
        }
        Ok(serde_json::from_value(reply.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pick_message_prefers_detail() {
        let body = json!({ "detail": "bad table", "message": "other" });
        assert_eq!(pick_message(&body, &["detail", "message"], "x"), json!("bad table"));
    }

    #[test]
    fn test_pick_message_skips_empty_detail() {
        let body = json!({ "detail": "", "message": "Scenario rejected" });
        assert_eq!(
            pick_message(&body, &["detail", "message"], "x"),
            json!("Scenario rejected")
        );
    }

    #[test]
    fn test_pick_message_fallback_on_non_object() {
        assert_eq!(
            pick_message(&Value::Null, &["detail"], TRIGGER_FALLBACK),
            json!("Job trigger failed")
        );
        assert_eq!(
            pick_message(&json!("plain"), &["detail"], SUBMIT_FALLBACK),
            json!("Submission failed")
        );
    }

    #[test]
    fn test_id_field_accepts_numbers() {
        assert_eq!(id_field(&json!({ "job_run_id": 42 }), "job_run_id").as_deref(), Some("42"));
        assert_eq!(id_field(&json!({ "job_run_id": "" }), "job_run_id"), None);
        assert_eq!(id_field(&json!({}), "job_run_id"), None);
    }
}
