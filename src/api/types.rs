use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============================================================================
// Input slots
// ============================================================================

/// One of the three fixed input roles of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InputSlot {
    Input1,
    Input2,
    Input3,
}

impl InputSlot {
    pub const ALL: [InputSlot; 3] = [InputSlot::Input1, InputSlot::Input2, InputSlot::Input3];

    /// Wire key: `input1`, `input2`, `input3`.
    pub fn key(self) -> &'static str {
        match self {
            InputSlot::Input1 => "input1",
            InputSlot::Input2 => "input2",
            InputSlot::Input3 => "input3",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InputSlot::Input1 => "Historical Load",
            InputSlot::Input2 => "Weather Data",
            InputSlot::Input3 => "Sensor Data",
        }
    }

    pub fn index(self) -> usize {
        match self {
            InputSlot::Input1 => 0,
            InputSlot::Input2 => 1,
            InputSlot::Input3 => 2,
        }
    }

    /// 1-based slot number as typed by users.
    pub fn from_number(n: usize) -> Option<Self> {
        InputSlot::ALL.get(n.checked_sub(1)?).copied()
    }
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InputDetail {
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub table: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub comment: String,
}

/// Body of `POST /submit`.
///
/// Non-finite params serialize as `null`; rejecting them is the backend's job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSubmission {
    pub input1: String,
    pub input2: String,
    pub input3: String,
    pub param1: f64,
    pub param2: f64,
    pub description: String,
    pub keep_inputs: bool,
    pub input_comments: BTreeMap<String, InputDetail>,
}

// ============================================================================
// Response types
// ============================================================================

/// Per-slot table/comment pairs of a stored scenario.
///
/// Canonical shape is an object keyed by slot. Older rows store it as a
/// JSON-encoded string, which is decoded here; anything undecodable is empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct InputComments(pub BTreeMap<String, InputDetail>);

impl InputComments {
    pub fn get(&self, slot: InputSlot) -> Option<&InputDetail> {
        self.0.get(slot.key())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_value(value: Value) -> Self {
        let value = match value {
            Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(decoded) => decoded,
                Err(e) => {
                    tracing::debug!("inputComments string is not JSON: {}", e);
                    return Self::default();
                }
            },
            other => other,
        };

        match value {
            Value::Object(map) => Self(
                map.into_iter()
                    .filter_map(|(key, detail)| {
                        serde_json::from_value::<InputDetail>(detail)
                            .ok()
                            .map(|d| (key, d))
                    })
                    .collect(),
            ),
            _ => Self::default(),
        }
    }
}

impl<'de> Deserialize<'de> for InputComments {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_value(Value::deserialize(deserializer)?))
    }
}

/// A server-confirmed scenario, as returned by `/runs` and `/scenario/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(deserialize_with = "lenient::string")]
    pub scenario_id: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub job_run_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub scenario_description: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub inputs_kept: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub param1: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub param2: Option<f64>,
    #[serde(default)]
    pub input1: Option<String>,
    #[serde(default)]
    pub input2: Option<String>,
    #[serde(default)]
    pub input3: Option<String>,
    #[serde(default, rename = "inputComments")]
    pub input_comments: InputComments,
}

impl Scenario {
    pub fn flat_table(&self, slot: InputSlot) -> Option<&str> {
        match slot {
            InputSlot::Input1 => self.input1.as_deref(),
            InputSlot::Input2 => self.input2.as_deref(),
            InputSlot::Input3 => self.input3.as_deref(),
        }
    }

    /// Table name for a slot: the comment entry's table if set, else the flat column.
    pub fn table_for(&self, slot: InputSlot) -> Option<&str> {
        self.input_comments
            .get(slot)
            .map(|d| d.table.as_str())
            .filter(|t| !t.is_empty())
            .or_else(|| self.flat_table(slot).filter(|t| !t.is_empty()))
    }

    pub fn comment_for(&self, slot: InputSlot) -> &str {
        self.input_comments
            .get(slot)
            .map(|d| d.comment.as_str())
            .unwrap_or("")
    }

    /// `created_at` parsed for display. Accepts RFC 3339 and naive ISO timestamps.
    pub fn created_at_parsed(&self) -> Option<chrono::NaiveDateTime> {
        let raw = self.created_at.as_deref()?.trim();
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
            return Some(dt.naive_utc());
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(raw, fmt).ok())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: String,
}

/// Per-column aggregates. Which fields are present depends on the column type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ColumnStats {
    #[serde(default)]
    pub min: Option<Value>,
    #[serde(default)]
    pub max: Option<Value>,
    #[serde(default)]
    pub avg: Option<Value>,
    #[serde(default)]
    pub distinct_count: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TableSummary {
    #[serde(default)]
    pub row_count: Option<i64>,
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub stats: BTreeMap<String, ColumnStats>,
    #[serde(default)]
    pub preview: Option<Vec<serde_json::Map<String, Value>>>,
}

// ============================================================================
// Lenient field decoding
// ============================================================================

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn scalar_to_string(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        scalar_to_string(Value::deserialize(d)?)
            .ok_or_else(|| serde::de::Error::custom("expected a string or number"))
    }

    pub fn string_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(scalar_to_string(Value::deserialize(d)?).unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(scalar_to_string(Value::deserialize(d)?))
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn opt_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => Some(b),
            Value::Number(n) => n.as_i64().map(|v| v != 0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slot_numbers() {
        assert_eq!(InputSlot::from_number(1), Some(InputSlot::Input1));
        assert_eq!(InputSlot::from_number(3), Some(InputSlot::Input3));
        assert_eq!(InputSlot::from_number(0), None);
        assert_eq!(InputSlot::from_number(4), None);
    }

    #[test]
    fn test_input_comments_from_encoded_string() {
        let raw = json!({
            "scenario_id": "s-1",
            "inputComments": "{\"input1\": {\"table\": \"hist\", \"comment\": \"2023 only\"}}"
        });
        let scenario: Scenario = serde_json::from_value(raw).unwrap();
        assert_eq!(scenario.table_for(InputSlot::Input1), Some("hist"));
        assert_eq!(scenario.comment_for(InputSlot::Input1), "2023 only");
    }

    #[test]
    fn test_malformed_input_comments_is_empty() {
        let raw = json!({ "scenario_id": "s-1", "inputComments": "{not json" });
        let scenario: Scenario = serde_json::from_value(raw).unwrap();
        assert!(scenario.input_comments.is_empty());
        assert_eq!(scenario.comment_for(InputSlot::Input2), "");
    }

    #[test]
    fn test_table_falls_back_to_flat_column() {
        let raw = json!({
            "scenario_id": "s-1",
            "input2": "weather_2024",
            "inputComments": { "input2": { "table": "", "comment": "x" } }
        });
        let scenario: Scenario = serde_json::from_value(raw).unwrap();
        assert_eq!(scenario.table_for(InputSlot::Input2), Some("weather_2024"));
        assert_eq!(scenario.table_for(InputSlot::Input3), None);
    }

    #[test]
    fn test_numeric_ids_and_lenient_fields() {
        let raw = json!({
            "scenario_id": "s-1",
            "job_run_id": 887766,
            "param1": "24",
            "param2": 1.5,
            "inputs_kept": 1,
            "created_at": "2025-06-01T12:30:00"
        });
        let scenario: Scenario = serde_json::from_value(raw).unwrap();
        assert_eq!(scenario.job_run_id.as_deref(), Some("887766"));
        assert_eq!(scenario.param1, Some(24.0));
        assert_eq!(scenario.param2, Some(1.5));
        assert_eq!(scenario.inputs_kept, Some(true));
        assert!(scenario.created_at_parsed().is_some());
    }

    #[test]
    fn test_submission_nan_is_null() {
        let submission = ScenarioSubmission {
            input1: "A".into(),
            input2: "B".into(),
            input3: "C".into(),
            param1: f64::NAN,
            param2: 1.0,
            description: String::new(),
            keep_inputs: true,
            input_comments: BTreeMap::new(),
        };
        let body = serde_json::to_value(&submission).unwrap();
        assert!(body["param1"].is_null());
        assert_eq!(body["param2"], json!(1.0));
        assert_eq!(body["keepInputs"], json!(true));
    }

    #[test]
    fn test_summary_preserves_preview_column_order() {
        let raw = r#"{"row_count": 2, "columns": [{"name": "ts", "type": "timestamp"}],
            "stats": {"ts": {"min": "2024-01-01", "max": "2024-12-31"}},
            "preview": [{"zeta": 1, "alpha": 2}]}"#;
        let summary: TableSummary = serde_json::from_str(raw).unwrap();
        let keys: Vec<_> = summary.preview.unwrap()[0].keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(summary.stats["ts"].avg, None);
    }
}
