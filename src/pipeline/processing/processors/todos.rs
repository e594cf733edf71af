use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{info, instrument, warn};

use super::{system_clock, Clock, Dependencies, ProcessorKind, RecordProcessor};
use crate::constants::{TODOS_RESOURCE, USERS_STAGE};
use crate::domain::{
    CanonicalRecord, Disposition, RawRecord, ReasonCode, RecordId, StageResult, TodoRecord,
    TodoStatus,
};
use crate::pipeline::processing::normalize::{field_flag, field_id, field_str};

const TODO_KIND: &str = "todo";

/// Local name of the dependency carrying accepted users
const USERS_DEPENDENCY: &str = USERS_STAGE;

/// Dependent-entity processor: todos must reference an accepted user
pub struct TodoProcessor {
    clock: Clock,
}

impl Default for TodoProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoProcessor {
    pub fn new() -> Self {
        Self::with_clock(system_clock)
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self { clock }
    }

    /// Identifiers of accepted users, or `None` when the dependency is absent or empty
    fn valid_user_ids(dependencies: &Dependencies) -> Option<HashSet<RecordId>> {
        let users = dependencies.get(USERS_DEPENDENCY)?;
        if users.is_empty() {
            return None;
        }
        Some(users.iter().filter_map(|u| u.external_id().cloned()).collect())
    }

    /// Synthetic ordering timestamp: now shifted forward by the todo's id in minutes.
    /// Ids that are not integers get no offset.
    fn occurred_at(&self, id: Option<&RecordId>) -> DateTime<Utc> {
        let now = (self.clock)();
        id.and_then(RecordId::as_i64)
            .and_then(Duration::try_minutes)
            .and_then(|offset| now.checked_add_signed(offset))
            .unwrap_or(now)
    }

    fn normalize(&self, raw: &Value) -> TodoRecord {
        let id = field_id(raw, "id");
        let completed = field_flag(raw, "completed");
        let occurred_at = self.occurred_at(id.as_ref());
        TodoRecord {
            external_id: id,
            client_external_id: field_id(raw, "userId"),
            kind: TODO_KIND,
            title: Some(field_str(raw, "title").to_string()),
            status: Some(if completed { TodoStatus::Completed } else { TodoStatus::Open }),
            occurred_at: Some(occurred_at),
        }
    }

    fn identifiers_only(raw: &Value) -> TodoRecord {
        TodoRecord {
            external_id: field_id(raw, "id"),
            client_external_id: field_id(raw, "userId"),
            kind: TODO_KIND,
            title: None,
            status: None,
            occurred_at: None,
        }
    }
}

impl RecordProcessor for TodoProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Todos
    }

    fn resource(&self) -> &'static str {
        TODOS_RESOURCE
    }

    #[instrument(skip_all, fields(records = raw.len()))]
    fn process(&self, raw: Vec<RawRecord>, dependencies: &Dependencies) -> StageResult {
        info!("Processing and validating todos");
        let mut result = StageResult::new();

        let Some(valid_user_ids) = Self::valid_user_ids(dependencies) else {
            warn!("User data not available, rejecting every todo");
            for todo in &raw {
                result.push(
                    CanonicalRecord::Todo(Self::identifiers_only(todo)),
                    Disposition::Rejected(ReasonCode::DependencyUnavailable),
                );
            }
            return result;
        };

        for todo in &raw {
            let record = self.normalize(todo);
            let disposition = match &record.client_external_id {
                Some(user_id) if valid_user_ids.contains(user_id) => Disposition::Accepted,
                _ => Disposition::Rejected(ReasonCode::OrphanUser),
            };
            result.push(CanonicalRecord::Todo(record), disposition);
        }

        info!(
            accepted = result.accepted.len(),
            rejected = result.rejected.len(),
            "Todos processed"
        );
        result
    }
}
