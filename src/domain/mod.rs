//! Canonical record shapes shared by the processors, the registry and the load stage.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::fmt;

use crate::constants::TIMESTAMP_FORMAT;

/// Untyped record exactly as returned by the data source
pub type RawRecord = serde_json::Value;

/// Source identifier, passed through exactly as the source sent it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(Number),
    Text(String),
}

impl RecordId {
    /// Numbers and strings are identifiers; any other JSON value counts as missing
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(RecordId::Number(n.clone())),
            Value::String(s) => Some(RecordId::Text(s.clone())),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RecordId::Number(n) => n.as_i64(),
            RecordId::Text(_) => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            RecordId::Number(n) if n.is_i64() => 0,
            RecordId::Number(_) => 1,
            RecordId::Text(_) => 2,
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Number(id.into())
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::Text(id.to_string())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// Processing order of identifiers: integers ascending, then other numbers,
/// then strings, with missing identifiers last.
pub fn compare_ids(a: Option<&RecordId>, b: Option<&RecordId>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.rank().cmp(&b.rank()).then_with(|| match (a, b) {
            (RecordId::Number(x), RecordId::Number(y)) => match (x.as_i64(), y.as_i64()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => {
                    let x = x.as_f64().unwrap_or(f64::NAN);
                    let y = y.as_f64().unwrap_or(f64::NAN);
                    x.total_cmp(&y)
                }
            },
            (RecordId::Text(x), RecordId::Text(y)) => x.cmp(y),
            _ => Ordering::Equal,
        }),
    }
}

/// Reason a record was routed to the rejected partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    InvalidEmail,
    DuplicateMerged,
    OrphanUser,
    DependencyUnavailable,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::InvalidEmail => "invalid_email",
            ReasonCode::DuplicateMerged => "duplicate_merged",
            ReasonCode::OrphanUser => "orphan_user",
            ReasonCode::DependencyUnavailable => "dependency_unavailable",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome attached to every processed record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Accepted,
    Rejected(ReasonCode),
}

/// A normalized user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub external_id: Option<RecordId>,
    /// Raw display name; kept only on rejected records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    #[serde(rename = "phoneE164")]
    pub phone_e164: Option<String>,
    pub address: Option<String>,
    pub company: Option<String>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// A normalized todo. Records rejected for an unavailable dependency carry identifiers only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoRecord {
    pub external_id: Option<RecordId>,
    pub client_external_id: Option<RecordId>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TodoStatus>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_optional_timestamp"
    )]
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Completed,
    Open,
}

/// Output record of any kind; serializes as a flat field mapping
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CanonicalRecord {
    User(UserRecord),
    Todo(TodoRecord),
}

impl CanonicalRecord {
    pub fn external_id(&self) -> Option<&RecordId> {
        match self {
            CanonicalRecord::User(u) => u.external_id.as_ref(),
            CanonicalRecord::Todo(t) => t.external_id.as_ref(),
        }
    }

    /// Identifier for human-facing output, `-` when the record has none
    pub fn display_id(&self) -> String {
        self.external_id()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string())
    }

    /// Render the record as a JSON object for the sinks
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// A record in the rejected partition, flattened with its `reason` on output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRecord {
    #[serde(flatten)]
    pub record: CanonicalRecord,
    pub reason: ReasonCode,
}

/// Accepted and rejected partitions of one stage, each in processing order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageResult {
    pub accepted: Vec<CanonicalRecord>,
    pub rejected: Vec<RejectedRecord>,
}

impl StageResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a classified record to its partition
    pub fn push(&mut self, record: CanonicalRecord, disposition: Disposition) {
        match disposition {
            Disposition::Accepted => self.accepted.push(record),
            Disposition::Rejected(reason) => self.rejected.push(RejectedRecord { record, reason }),
        }
    }

    /// Total number of classified records
    pub fn len(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}

fn serialize_optional_timestamp<S: Serializer>(
    ts: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => serializer.serialize_str(&format_timestamp(ts)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn id(n: i64) -> Option<RecordId> {
        Some(RecordId::from(n))
    }

    fn sample_user() -> UserRecord {
        UserRecord {
            external_id: id(7),
            name: Some("Mr. Kurtis Weissnat".to_string()),
            first_name: "Kurtis".to_string(),
            last_name: "Weissnat".to_string(),
            email: Some("telly.hoeger@billy.biz".to_string()),
            phone_e164: None,
            address: None,
            company: Some("Johns Group".to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_timestamp_has_millis_and_z_suffix() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(format_timestamp(&ts), "2024-03-01T12:00:00.042Z");
    }

    #[test]
    fn test_rejected_record_serializes_flat_with_reason() {
        let rejected = RejectedRecord {
            record: CanonicalRecord::User(sample_user()),
            reason: ReasonCode::DuplicateMerged,
        };

        let value = serde_json::to_value(&rejected).unwrap();
        assert_eq!(value["externalId"], json!(7));
        assert_eq!(value["name"], json!("Mr. Kurtis Weissnat"));
        assert_eq!(value["phoneE164"], json!(null));
        assert_eq!(value["createdAt"], json!("2024-03-01T12:00:00.000Z"));
        assert_eq!(value["reason"], json!("duplicate_merged"));
    }

    #[test]
    fn test_accepted_user_omits_display_name() {
        let mut user = sample_user();
        user.name = None;
        let value = CanonicalRecord::User(user).to_value().unwrap();
        assert!(value.get("name").is_none());
        assert_eq!(value["firstName"], json!("Kurtis"));
    }

    #[test]
    fn test_identifier_only_todo_omits_business_fields() {
        let todo = TodoRecord {
            external_id: id(3),
            client_external_id: id(1),
            kind: "todo",
            title: None,
            status: None,
            occurred_at: None,
        };
        let value = CanonicalRecord::Todo(todo).to_value().unwrap();
        assert_eq!(value, json!({"externalId": 3, "clientExternalId": 1, "type": "todo"}));
    }

    #[test]
    fn test_record_id_passes_source_value_through() {
        assert_eq!(RecordId::from_value(&json!(7)), id(7));
        assert_eq!(RecordId::from_value(&json!("u-17")), Some(RecordId::from("u-17")));
        assert_eq!(RecordId::from_value(&json!(null)), None);
        assert_eq!(RecordId::from_value(&json!(true)), None);

        let big = RecordId::from_value(&json!(u64::MAX)).unwrap();
        assert_eq!(serde_json::to_value(&big).unwrap(), json!(u64::MAX));
        assert_eq!(big.as_i64(), None);
        assert_eq!(serde_json::to_value(RecordId::from("u-17")).unwrap(), json!("u-17"));
        assert_eq!(RecordId::from("u-17").to_string(), "u-17");
        assert_eq!(RecordId::from(42i64).to_string(), "42");
    }

    #[test]
    fn test_display_id() {
        let mut user = sample_user();
        assert_eq!(CanonicalRecord::User(user.clone()).display_id(), "7");
        user.external_id = Some(RecordId::from("u-17"));
        assert_eq!(CanonicalRecord::User(user.clone()).display_id(), "u-17");
        user.external_id = None;
        assert_eq!(CanonicalRecord::User(user).display_id(), "-");
    }

    #[test]
    fn test_compare_ids_orders_integers_then_others_then_missing() {
        let mut ids = vec![
            None,
            Some(RecordId::from("b")),
            id(10),
            RecordId::from_value(&json!(2.5)),
            Some(RecordId::from("a")),
            id(-3),
        ];
        ids.sort_by(|a, b| compare_ids(a.as_ref(), b.as_ref()));
        let rendered: Vec<_> = ids
            .iter()
            .map(|id| id.as_ref().map(ToString::to_string).unwrap_or_default())
            .collect();
        assert_eq!(rendered, vec!["-3", "10", "2.5", "a", "b", ""]);
    }

    #[test]
    fn test_stage_result_push_routes_by_disposition() {
        let mut result = StageResult::new();
        result.push(CanonicalRecord::User(sample_user()), Disposition::Accepted);
        result.push(
            CanonicalRecord::User(sample_user()),
            Disposition::Rejected(ReasonCode::InvalidEmail),
        );

        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.rejected[0].reason, ReasonCode::InvalidEmail);
        assert_eq!(result.len(), 2);
    }
}
