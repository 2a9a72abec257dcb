//! Metrics record model

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Fields required in strict-schema mode, in prediction log column order
pub const EXPECTED_FIELDS: [&str; 13] = [
    "Claimed_Hours",
    "Active_Hours",
    "Claimed_Minus_Active",
    "Utilization_Rate",
    "Commits",
    "PRs_Opened",
    "Tasks_Done",
    "Performance_Score",
    "Meetings_Hours",
    "Recent_HR_Flag",
    "Project_Type",
    "Role_Level",
    "Team_ID",
];

/// Single field value. Categorical columns may arrive as text.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Best-effort numeric cast; anything unparseable is 0
    pub fn as_f64(&self) -> f64 {
        let value = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        };
        if value.is_finite() { value } else { 0.0 }
    }

    /// Render for the CSV prediction log
    pub fn to_csv_cell(&self) -> String {
        match self {
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(s) => {
                if s.contains([',', '"', '\n', '\r']) {
                    format!("\"{}\"", s.replace('"', "\"\""))
                } else {
                    s.clone()
                }
            }
        }
    }
}

/// Raised when a payload cannot be treated as a flat record at all
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("field `{0}` is not a scalar value")]
pub struct NotFlatError(pub String);

/// One employee-period of metrics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl MetricsRecord {
    /// Build a record from a JSON object.
    ///
    /// Scalars are coerced permissively: numbers are kept, strings are kept
    /// as text, booleans become 1/0 and nulls are dropped (read back as 0).
    /// Nested arrays or objects make the whole record invalid.
    pub fn from_json(object: &Map<String, Value>) -> Result<Self, NotFlatError> {
        let mut fields = BTreeMap::new();

        for (key, value) in object {
            let field = match value {
                Value::Null => continue,
                Value::Bool(b) => FieldValue::Number(if *b { 1.0 } else { 0.0 }),
                Value::Number(n) => FieldValue::Number(n.as_f64().unwrap_or(0.0)),
                Value::String(s) => FieldValue::Text(s.clone()),
                Value::Array(_) | Value::Object(_) => return Err(NotFlatError(key.clone())),
            };
            fields.insert(key.clone(), field);
        }

        Ok(Self { fields })
    }

    /// Canonical record substituted when the payload is not a flat record
    pub fn canonical_default() -> Self {
        let values = [
            8.0, 7.5, 0.5, 92.0, 5.0, 2.0, 6.0, 12.0, 1.5, 0.0, 0.0, 1.0, 2.0,
        ];
        let fields = EXPECTED_FIELDS
            .iter()
            .zip(values)
            .map(|(name, v)| (name.to_string(), FieldValue::Number(v)))
            .collect();
        Self { fields }
    }

    /// Set a field, replacing any previous value
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Numeric read; missing or invalid fields are 0
    pub fn number(&self, name: &str) -> f64 {
        self.fields.get(name).map(FieldValue::as_f64).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

/// Expected fields absent from a raw payload, in schema order
pub fn missing_fields(object: &Map<String, Value>) -> Vec<String> {
    EXPECTED_FIELDS
        .iter()
        .filter(|f| !object.contains_key(**f))
        .map(|f| f.to_string())
        .collect()
}
