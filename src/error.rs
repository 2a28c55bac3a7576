use serde::Serialize;

/// App-wide error type. Every fallible function returns `Result<T, AppError>`.
/// Serializes as `{ error, kind }`; the shell logs failed commands in that shape.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status. `detail` is the message the
    /// backend supplied (or a fallback), kept as JSON because it is not always a string.
    #[error("Backend rejected request ({status}): {detail}")]
    Rejected {
        status: u16,
        detail: serde_json::Value,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Message shown on the wizard's error page for this failure.
    ///
    /// Backend rejections surface their `detail` untouched; other variants
    /// surface their inner text without the variant prefix.
    pub fn page_message(&self) -> serde_json::Value {
        match self {
            AppError::Rejected { detail, .. } => detail.clone(),
            AppError::Network(msg)
            | AppError::NotFound(msg)
            | AppError::UnexpectedResponse(msg)
            | AppError::Validation(msg)
            | AppError::Internal(msg) => serde_json::Value::String(msg.clone()),
            other => serde_json::Value::String(other.to_string()),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Network(_) => "network",
            AppError::Rejected { .. } => "rejected",
            AppError::NotFound(_) => "not_found",
            AppError::UnexpectedResponse(_) => "unexpected_response",
            AppError::Validation(_) => "validation",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Serde(_) => "serde",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Network(e.to_string())
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("AppError", 2)?;
        s.serialize_field("error", &self.to_string())?;
        s.serialize_field("kind", self.kind())?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejected_page_message_is_raw_detail() {
        let err = AppError::Rejected {
            status: 400,
            detail: json!("bad table"),
        };
        assert_eq!(err.page_message(), json!("bad table"));
    }

    #[test]
    fn test_structured_detail_survives() {
        let detail = json!([{ "loc": ["body", "param1"], "msg": "value is not a valid float" }]);
        let err = AppError::Rejected {
            status: 422,
            detail: detail.clone(),
        };
        assert_eq!(err.page_message(), detail);
    }

    #[test]
    fn test_page_message_strips_prefix() {
        let err = AppError::NotFound("Scenario not found".into());
        assert_eq!(err.page_message(), json!("Scenario not found"));
        assert_eq!(err.to_string(), "Not found: Scenario not found");
    }

    #[test]
    fn test_serialize_shape() {
        let err = AppError::Validation("Description cannot be empty".into());
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["kind"], "validation");
        assert_eq!(value["error"], "Validation error: Description cannot be empty");
    }
}
