use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names that may carry a record's postal code, in lookup order.
pub const REGION_ID_FIELDS: &[&str] = &["_zip", "Zip", "ZIP"];
/// Field names that may carry a record's numeric score, in lookup order.
pub const SCORE_FIELDS: &[&str] = &["_score", "score", "Score"];
/// Date fields whose presence marks a record as recent.
pub const RECENCY_DATE_FIELDS: &[&str] = &["Record Date", "Date Filed"];

pub const PERIOD_TAG_FIELD: &str = "_type";
pub const RECENT_PERIOD_TAG: &str = "Last 90 Days";

/// A caller-supplied business record. Any JSON object is accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Map<String, Value>);

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl Record {
    /// First alias whose value is present and non-blank.
    ///
    /// Null, `false`, `0` and the empty string count as blank, so a blank
    /// value under an earlier alias falls through to the next one.
    pub fn field(&self, aliases: &[&str]) -> Option<&Value> {
        aliases
            .iter()
            .filter_map(|key| self.0.get(*key))
            .find(|value| is_present(value))
    }

    /// Postal code of the region this record belongs to.
    pub fn region_id(&self) -> Option<Cow<'_, str>> {
        match self.field(REGION_ID_FIELDS)? {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then_some(Cow::Borrowed(trimmed))
            }
            Value::Number(n) => {
                if let Some(v) = n.as_u64() {
                    Some(Cow::Owned(v.to_string()))
                } else {
                    n.as_i64().map(|v| Cow::Owned(v.to_string()))
                }
            }
            _ => None,
        }
    }

    /// Numeric score, 0 when absent or not a number.
    pub fn score(&self) -> f64 {
        let value = match self.field(SCORE_FIELDS) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|v| v.is_finite()).unwrap_or(0.0)
    }

    /// Recent-period tag, or either recency date field present.
    pub fn is_recent(&self) -> bool {
        let tagged = self.0.get(PERIOD_TAG_FIELD).and_then(Value::as_str) == Some(RECENT_PERIOD_TAG);
        tagged || self.field(RECENCY_DATE_FIELDS).is_some()
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
