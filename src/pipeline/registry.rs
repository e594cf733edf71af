use std::collections::HashMap;

use crate::domain::StageResult;
use crate::error::{EtlError, Result};

/// Append-only store of stage results for one pipeline run.
///
/// Entries are written once per stage name and iterate in insertion order.
#[derive(Debug, Default)]
pub struct Registry {
    results: HashMap<String, StageResult>,
    order: Vec<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit a stage result. Writing the same stage twice is an error.
    pub fn insert(&mut self, stage: &str, result: StageResult) -> Result<()> {
        if self.results.contains_key(stage) {
            return Err(EtlError::DuplicateStage(stage.to_string()));
        }
        self.order.push(stage.to_string());
        self.results.insert(stage.to_string(), result);
        Ok(())
    }

    pub fn get(&self, stage: &str) -> Option<&StageResult> {
        self.results.get(stage)
    }

    pub fn contains(&self, stage: &str) -> bool {
        self.results.contains_key(stage)
    }

    /// Stage names and results in the order they were committed
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StageResult)> {
        self.order
            .iter()
            .filter_map(|name| self.results.get(name).map(|r| (name.as_str(), r)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
