use serde_json::Value;
use tracing::{debug, info, instrument};

use super::{system_clock, Clock, Dependencies, ProcessorKind, RecordProcessor};
use crate::constants::USERS_RESOURCE;
use crate::domain::{
    compare_ids, CanonicalRecord, Disposition, RawRecord, ReasonCode, RecordId, StageResult,
    UserRecord,
};
use crate::pipeline::processing::dedup::DedupTracker;
use crate::pipeline::processing::normalize::{
    compose_address, extract_company, field_id, field_str, normalize_email, normalize_phone,
    split_name,
};

/// Primary-entity processor: normalizes users and merges duplicates
pub struct UserProcessor {
    clock: Clock,
}

impl Default for UserProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl UserProcessor {
    pub fn new() -> Self {
        Self::with_clock(system_clock)
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self { clock }
    }

    /// Normalize one raw user and decide its disposition against the tracker.
    ///
    /// Priority: invalid email, then email, phone and name-pair collisions.
    /// Accepted users are registered with the tracker and lose their raw display name.
    fn classify(&self, raw: &Value, tracker: &mut DedupTracker) -> (UserRecord, Disposition) {
        let display_name = field_str(raw, "name");
        let name = split_name(display_name);
        let email = normalize_email(field_str(raw, "email"));
        let phone = normalize_phone(field_str(raw, "phone"));

        let mut record = UserRecord {
            external_id: field_id(raw, "id"),
            name: Some(display_name.to_string()),
            first_name: name.first.clone(),
            last_name: name.last.clone(),
            email: email.clone(),
            phone_e164: phone.clone(),
            address: raw.get("address").and_then(compose_address),
            company: raw.get("company").and_then(extract_company),
            created_at: (self.clock)(),
        };

        let Some(email) = email else {
            return (record, Disposition::Rejected(ReasonCode::InvalidEmail));
        };

        if tracker.is_duplicate(&email, phone.as_deref(), &name) {
            return (record, Disposition::Rejected(ReasonCode::DuplicateMerged));
        }

        tracker.register(&email, phone.as_deref(), &name);
        record.name = None;
        (record, Disposition::Accepted)
    }
}

impl RecordProcessor for UserProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Users
    }

    fn resource(&self) -> &'static str {
        USERS_RESOURCE
    }

    #[instrument(skip_all, fields(records = raw.len()))]
    fn process(&self, mut raw: Vec<RawRecord>, _dependencies: &Dependencies) -> StageResult {
        info!("Processing users");

        // Ascending by id, records without an id last; stable for ties
        raw.sort_by(|a, b| compare_ids(field_id(a, "id").as_ref(), field_id(b, "id").as_ref()));

        let mut tracker = DedupTracker::new();
        let mut result = StageResult::new();

        for user in &raw {
            let (record, disposition) = self.classify(user, &mut tracker);
            debug!(
                external_id = record.external_id.as_ref().map(RecordId::to_string),
                ?disposition,
                "Classified user"
            );
            result.push(CanonicalRecord::User(record), disposition);
        }

        info!(
            accepted = result.accepted.len(),
            rejected = result.rejected.len(),
            "Users processed"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn ids<'a>(records: impl Iterator<Item = &'a CanonicalRecord>) -> Vec<Option<i64>> {
        records.map(|r| r.external_id().and_then(RecordId::as_i64)).collect()
    }

    fn process(users: Vec<Value>) -> StageResult {
        UserProcessor::with_clock(fixed_clock).process(users, &Dependencies::new())
    }

    fn user(result: &CanonicalRecord) -> &UserRecord {
        match result {
            CanonicalRecord::User(u) => u,
            other => panic!("expected a user record, got {:?}", other),
        }
    }

    #[test]
    fn test_user_transformation_and_email_validation() {
        let result = process(vec![
            json!({
                "id": 1, "name": "Leanne Graham", "username": "Bret", "email": "Sincere@april.biz",
                "address": {"street": "Kulas Light", "suite": "Apt. 556", "city": "Gwenborough", "zipcode": "92998-3874"},
                "phone": "1-770-736-8031 x56442",
                "company": {"name": "Romaguera-Crona"}
            }),
            json!({
                "id": 2, "name": "Ervin Howell", "email": "invalid-email",
                "phone": "010-692-6593 x09125"
            }),
        ]);

        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.rejected.len(), 1);

        let accepted = user(&result.accepted[0]);
        assert_eq!(accepted.external_id, Some(RecordId::from(1i64)));
        assert_eq!(accepted.first_name, "Leanne");
        assert_eq!(accepted.last_name, "Graham");
        assert_eq!(accepted.email.as_deref(), Some("sincere@april.biz"));
        assert_eq!(accepted.phone_e164.as_deref(), Some("+17707368031"));
        assert_eq!(accepted.address.as_deref(), Some("Kulas Light, Apt. 556, Gwenborough, 92998-3874"));
        assert_eq!(accepted.company.as_deref(), Some("Romaguera-Crona"));
        assert_eq!(accepted.name, None);
        assert_eq!(accepted.created_at, fixed_clock());

        let rejected = &result.rejected[0];
        assert_eq!(rejected.reason, ReasonCode::InvalidEmail);
        let rejected_user = user(&rejected.record);
        assert_eq!(rejected_user.external_id, Some(RecordId::from(2i64)));
        assert_eq!(rejected_user.name.as_deref(), Some("Ervin Howell"));
        assert_eq!(rejected_user.email, None);
    }

    #[test]
    fn test_duplicate_email_first_wins() {
        let result = process(vec![
            json!({"id": 3, "name": "Jane Doe", "email": "jane.doe@example.com", "phone": "1-555-111-2222"}),
            json!({"id": 1, "name": "Jane Doe", "email": "JANE.DOE@example.com", "phone": "1-555-123-4567"}),
        ]);

        assert_eq!(result.accepted.len(), 1);
        assert_eq!(ids(result.accepted.iter()), vec![Some(1)]);
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(ids(result.rejected.iter().map(|r| &r.record)), vec![Some(3)]);
        assert_eq!(result.rejected[0].reason, ReasonCode::DuplicateMerged);
    }

    #[test]
    fn test_duplicate_phone_and_name_pair() {
        let result = process(vec![
            json!({"id": 1, "name": "Jane Doe", "email": "jane@example.com", "phone": "555-123-4567"}),
            json!({"id": 2, "name": "John Roe", "email": "john@example.com", "phone": "555.123.4567"}),
            json!({"id": 3, "name": "Jane Doe", "email": "other@example.com", "phone": ""}),
            json!({"id": 4, "name": "Ann Poe", "email": "ann@example.com", "phone": ""}),
            json!({"id": 5, "name": "Bob Moe", "email": "bob@example.com"}),
        ]);

        assert_eq!(ids(result.accepted.iter()), vec![Some(1), Some(4), Some(5)]);
        let rejected: Vec<_> = result
            .rejected
            .iter()
            .map(|r| (r.record.external_id().and_then(RecordId::as_i64), r.reason))
            .collect();
        assert_eq!(
            rejected,
            vec![(Some(2), ReasonCode::DuplicateMerged), (Some(3), ReasonCode::DuplicateMerged)]
        );
    }

    #[test]
    fn test_rejected_duplicates_do_not_register_keys() {
        // id 2 collides on email and is rejected; its phone must stay free for id 3
        let result = process(vec![
            json!({"id": 1, "name": "Jane Doe", "email": "jane@example.com"}),
            json!({"id": 2, "name": "Jim Beam", "email": "jane@example.com", "phone": "555-000-1111"}),
            json!({"id": 3, "name": "Kim Lee", "email": "kim@example.com", "phone": "555-000-1111"}),
        ]);

        assert_eq!(ids(result.accepted.iter()), vec![Some(1), Some(3)]);
    }

    #[test]
    fn test_sorted_by_id_with_missing_ids_last() {
        let result = process(vec![
            json!({"name": "No Id", "email": "noid@example.com"}),
            json!({"id": 9, "name": "Nine Nine", "email": "nine@example.com"}),
            json!({"id": 2, "name": "Two Two", "email": "two@example.com"}),
        ]);

        assert_eq!(ids(result.accepted.iter()), vec![Some(2), Some(9), None]);
    }

    #[test]
    fn test_string_ids_pass_through_and_sort_after_integers() {
        let result = process(vec![
            json!({"id": "u-17", "name": "Jane Doe", "email": "jane@x.io"}),
            json!({"name": "No Id", "email": "noid@example.com"}),
            json!({"id": 4, "name": "Four Four", "email": "four@example.com"}),
        ]);

        let accepted: Vec<_> = result.accepted.iter().map(|r| r.external_id().cloned()).collect();
        assert_eq!(
            accepted,
            vec![Some(RecordId::from(4i64)), Some(RecordId::from("u-17")), None]
        );

        let value = result.accepted[1].to_value().unwrap();
        assert_eq!(value["externalId"], json!("u-17"));
    }

    #[test]
    fn test_single_token_names_collide_as_unknown_user() {
        let result = process(vec![
            json!({"id": 1, "name": "Cher", "email": "cher@example.com"}),
            json!({"id": 2, "name": "Madonna", "email": "madonna@example.com"}),
        ]);

        assert_eq!(result.accepted.len(), 1);
        assert_eq!(user(&result.accepted[0]).first_name, "Unknown");
        assert_eq!(result.rejected[0].reason, ReasonCode::DuplicateMerged);
    }

    #[test]
    fn test_every_record_is_classified() {
        let users: Vec<Value> = (0..20)
            .map(|i| json!({"id": i, "name": format!("User {}", i % 7), "email": format!("u{}@example.com", i % 5)}))
            .collect();
        let result = process(users);
        assert_eq!(result.len(), 20);
    }

    #[test]
    fn test_empty_batch() {
        let result = process(Vec::new());
        assert!(result.is_empty());
    }
}
