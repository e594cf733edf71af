//! Record processors, one per record kind.

pub mod todos;
pub mod users;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

use crate::constants::USERS_STAGE;
use crate::domain::{CanonicalRecord, RawRecord, StageResult};

pub use todos::TodoProcessor;
pub use users::UserProcessor;

/// Source of the "now" instant stamped onto generated records
pub type Clock = fn() -> DateTime<Utc>;

pub fn system_clock() -> DateTime<Utc> {
    Utc::now()
}

/// Record kinds the pipeline knows how to process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorKind {
    Users,
    Todos,
}

impl ProcessorKind {
    /// Local dependency names the processor reads; a stage of this kind must bind each one
    pub fn required_dependencies(&self) -> &'static [&'static str] {
        match self {
            ProcessorKind::Users => &[],
            ProcessorKind::Todos => &[USERS_STAGE],
        }
    }
}

impl fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessorKind::Users => f.write_str("users"),
            ProcessorKind::Todos => f.write_str("todos"),
        }
    }
}

/// Accepted outputs of earlier stages, keyed by the local dependency name
#[derive(Debug, Clone, Default)]
pub struct Dependencies {
    bindings: HashMap<String, Vec<CanonicalRecord>>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, local_name: impl Into<String>, records: Vec<CanonicalRecord>) {
        self.bindings.insert(local_name.into(), records);
    }

    pub fn get(&self, local_name: &str) -> Option<&[CanonicalRecord]> {
        self.bindings.get(local_name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Classifies one raw batch into accepted and rejected partitions.
///
/// Every input record lands in exactly one partition.
pub trait RecordProcessor: Send + Sync {
    fn kind(&self) -> ProcessorKind;

    /// Resource name fetched from the data source for this processor
    fn resource(&self) -> &'static str;

    fn process(&self, raw: Vec<RawRecord>, dependencies: &Dependencies) -> StageResult;
}

/// Build the processor for a record kind
pub fn create_processor(kind: ProcessorKind, clock: Clock) -> Box<dyn RecordProcessor> {
    match kind {
        ProcessorKind::Users => Box::new(UserProcessor::with_clock(clock)),
        ProcessorKind::Todos => Box::new(TodoProcessor::with_clock(clock)),
    }
}
