use std::collections::HashSet;
use tracing::{info, info_span, warn, Instrument};

use super::registry::Registry;
use crate::app::ports::DataSourcePort;
use crate::constants::{TODOS_STAGE, USERS_STAGE};
use crate::domain::RawRecord;
use crate::error::{EtlError, Result};
use crate::observability::metrics;
use crate::pipeline::processing::processors::{
    create_processor, system_clock, Clock, Dependencies, ProcessorKind,
};

/// One named step of the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDeclaration {
    pub name: String,
    pub kind: ProcessorKind,
    /// (local dependency name, earlier stage name)
    pub dependencies: Vec<(String, String)>,
}

impl StageDeclaration {
    pub fn new(name: impl Into<String>, kind: ProcessorKind) -> Self {
        Self {
            name: name.into(),
            kind,
            dependencies: Vec::new(),
        }
    }

    /// Bind the accepted output of `stage` under `local_name`
    pub fn depends_on(mut self, local_name: impl Into<String>, stage: impl Into<String>) -> Self {
        self.dependencies.push((local_name.into(), stage.into()));
        self
    }
}

/// Stage list of the standard run: users, then todos referencing accepted users
pub fn default_stages() -> Vec<StageDeclaration> {
    vec![
        StageDeclaration::new(USERS_STAGE, ProcessorKind::Users),
        StageDeclaration::new(TODOS_STAGE, ProcessorKind::Todos).depends_on(USERS_STAGE, USERS_STAGE),
    ]
}

/// Runs declared stages in order, feeding each the accepted output of earlier ones
#[derive(Debug)]
pub struct Pipeline {
    stages: Vec<StageDeclaration>,
    clock: Clock,
}

impl Pipeline {
    /// Validate the declarations and build the pipeline.
    ///
    /// Stage names must be unique, every dependency must name an earlier stage,
    /// and every local name the stage's processor reads must be bound.
    pub fn new(stages: Vec<StageDeclaration>) -> Result<Self> {
        let mut declared: HashSet<&str> = HashSet::new();
        for stage in &stages {
            for (local_name, dependency) in &stage.dependencies {
                if !declared.contains(dependency.as_str()) {
                    return Err(EtlError::Config(format!(
                        "stage '{}' binds '{}' to '{}', which is not declared before it",
                        stage.name, local_name, dependency
                    )));
                }
            }
            for required in stage.kind.required_dependencies() {
                if !stage.dependencies.iter().any(|(local_name, _)| local_name == required) {
                    return Err(EtlError::Config(format!(
                        "stage '{}' ({}) requires a dependency bound as '{}'",
                        stage.name, stage.kind, required
                    )));
                }
            }
            if !declared.insert(stage.name.as_str()) {
                return Err(EtlError::DuplicateStage(stage.name.clone()));
            }
        }
        Ok(Self {
            stages,
            clock: system_clock,
        })
    }

    /// Pipeline over [`default_stages`]
    pub fn standard() -> Result<Self> {
        Self::new(default_stages())
    }

    /// Override the instant stamped onto generated records
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn stages(&self) -> &[StageDeclaration] {
        &self.stages
    }

    /// Run every stage in declaration order and return the completed registry
    pub async fn run(&self, source: &dyn DataSourcePort) -> Result<Registry> {
        info!(stages = self.stages.len(), "Starting extract and transform");
        let mut registry = Registry::new();

        for stage in &self.stages {
            let span = info_span!("stage", name = %stage.name, kind = %stage.kind);
            async {
                let dependencies = resolve_dependencies(stage, &registry)?;
                let processor = create_processor(stage.kind, self.clock);
                let raw = fetch_batch(source, processor.resource()).await;
                let fetched = raw.len();

                let result = processor.process(raw, &dependencies);
                debug_assert_eq!(result.len(), fetched);
                metrics::stage::completed(&stage.name, &result);
                info!(
                    fetched,
                    accepted = result.accepted.len(),
                    rejected = result.rejected.len(),
                    "Finished stage"
                );

                registry.insert(&stage.name, result)?;
                Ok::<(), EtlError>(())
            }
            .instrument(span)
            .await?;
        }

        info!("Extract and transform finished");
        Ok(registry)
    }
}

/// Read the accepted partitions a stage depends on. A missing entry is fatal.
fn resolve_dependencies(stage: &StageDeclaration, registry: &Registry) -> Result<Dependencies> {
    let mut dependencies = Dependencies::new();
    for (local_name, dependency) in &stage.dependencies {
        let result = registry
            .get(dependency)
            .ok_or_else(|| EtlError::UnresolvedDependency {
                stage: stage.name.clone(),
                dependency: dependency.clone(),
            })?;
        dependencies.bind(local_name.clone(), result.accepted.clone());
    }
    Ok(dependencies)
}

/// Fetch one resource, substituting an empty batch when the source fails
async fn fetch_batch(source: &dyn DataSourcePort, resource: &str) -> Vec<RawRecord> {
    match source.fetch(resource).await {
        Ok(records) => {
            metrics::source::fetch_success(resource, records.len());
            records
        }
        Err(e) => {
            metrics::source::fetch_error(resource);
            warn!(resource, error = %e, "Fetch failed, continuing with an empty batch");
            Vec::new()
        }
    }
}
