use serde_json::Value;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::app::ports::RecordSinkPort;
use crate::constants::{
    TODOS_ACCEPTED_OUTPUT, TODOS_REJECTED_OUTPUT, TODOS_STAGE, USERS_ACCEPTED_OUTPUT,
    USERS_REJECTED_OUTPUT, USERS_STAGE,
};
use crate::domain::StageResult;
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::Registry;

/// Which side of a stage result an output reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    Structured,
    /// Tabular output; an empty column list writes every field of the first record
    Tabular { columns: Vec<(String, String)> },
}

impl OutputFormat {
    fn label(&self) -> &'static str {
        match self {
            OutputFormat::Structured => "json",
            OutputFormat::Tabular { .. } => "csv",
        }
    }
}

/// One file written by the load stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    pub stage: String,
    pub partition: Partition,
    pub name: String,
    pub format: OutputFormat,
}

impl OutputSpec {
    pub fn structured(stage: &str, partition: Partition, name: &str) -> Self {
        Self {
            stage: stage.to_string(),
            partition,
            name: name.to_string(),
            format: OutputFormat::Structured,
        }
    }

    pub fn tabular(stage: &str, partition: Partition, name: &str, columns: &[(&str, &str)]) -> Self {
        Self {
            stage: stage.to_string(),
            partition,
            name: name.to_string(),
            format: OutputFormat::Tabular {
                columns: columns
                    .iter()
                    .map(|(header, field)| (header.to_string(), field.to_string()))
                    .collect(),
            },
        }
    }
}

/// Outputs of the standard run: todos first, then users
pub fn default_load_plan() -> Vec<OutputSpec> {
    vec![
        OutputSpec::structured(TODOS_STAGE, Partition::Accepted, TODOS_ACCEPTED_OUTPUT),
        OutputSpec::tabular(
            TODOS_STAGE,
            Partition::Rejected,
            TODOS_REJECTED_OUTPUT,
            &[
                ("source_todo_id", "externalId"),
                ("Motivo", "reason"),
                ("source_user_id", "clientExternalId"),
                ("title", "title"),
            ],
        ),
        OutputSpec::structured(USERS_STAGE, Partition::Accepted, USERS_ACCEPTED_OUTPUT),
        OutputSpec::tabular(
            USERS_STAGE,
            Partition::Rejected,
            USERS_REJECTED_OUTPUT,
            &[
                ("source_user_id", "externalId"),
                ("reason", "reason"),
                ("email", "email"),
                ("phone", "phoneE164"),
                ("name", "name"),
                ("address", "address"),
            ],
        ),
    ]
}

/// What the load stage did with each planned output
#[derive(Debug, Default)]
pub struct LoadSummary {
    pub written: Vec<PathBuf>,
    /// Outputs with no stage entry or an empty partition
    pub skipped: Vec<String>,
    /// Outputs whose write failed, with the error message
    pub failed: Vec<(String, String)>,
}

/// Writes registry partitions to the sink according to a load plan.
///
/// A failing write is logged and recorded; it never stops the remaining writes.
pub struct LoadUseCase {
    sink: Box<dyn RecordSinkPort>,
    plan: Vec<OutputSpec>,
}

impl LoadUseCase {
    pub fn new(sink: Box<dyn RecordSinkPort>, plan: Vec<OutputSpec>) -> Self {
        Self { sink, plan }
    }

    pub fn with_default_plan(sink: Box<dyn RecordSinkPort>) -> Self {
        Self::new(sink, default_load_plan())
    }

    pub async fn load(&self, registry: &Registry) -> LoadSummary {
        info!("Starting load");
        let mut summary = LoadSummary::default();

        for spec in &self.plan {
            let Some(result) = registry.get(&spec.stage) else {
                warn!(stage = %spec.stage, output = %spec.name, "Stage has no results, skipping output");
                summary.skipped.push(spec.name.clone());
                continue;
            };

            let records = match partition_values(result, spec.partition) {
                Ok(records) => records,
                Err(e) => {
                    error!(output = %spec.name, error = %e, "Could not render records");
                    summary.failed.push((spec.name.clone(), e.to_string()));
                    continue;
                }
            };
            if records.is_empty() {
                summary.skipped.push(spec.name.clone());
                continue;
            }

            match self.write(spec, &records).await {
                Ok(path) => {
                    metrics::sink::write_success(spec.format.label());
                    summary.written.push(path);
                }
                Err(e) => {
                    metrics::sink::write_skipped(spec.format.label());
                    error!(output = %spec.name, error = %e, "Write skipped");
                    summary.failed.push((spec.name.clone(), e.to_string()));
                }
            }
        }

        info!(
            written = summary.written.len(),
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            "Load finished"
        );
        summary
    }

    async fn write(&self, spec: &OutputSpec, records: &[Value]) -> Result<PathBuf> {
        match &spec.format {
            OutputFormat::Structured => self.sink.write_structured(records, &spec.name).await,
            OutputFormat::Tabular { columns } => {
                let map: Vec<(&str, &str)> = columns
                    .iter()
                    .map(|(header, field)| (header.as_str(), field.as_str()))
                    .collect();
                let columns = if map.is_empty() { None } else { Some(map.as_slice()) };
                self.sink.write_tabular(records, &spec.name, columns).await
            }
        }
    }
}

/// Render one partition as flat JSON objects
fn partition_values(result: &StageResult, partition: Partition) -> Result<Vec<Value>> {
    let values = match partition {
        Partition::Accepted => result
            .accepted
            .iter()
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<_>>>()?,
        Partition::Rejected => result
            .rejected
            .iter()
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<_>>>()?,
    };
    Ok(values)
}
