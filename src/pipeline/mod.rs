// Extract-transform pipeline: stage orchestration, registry and record processing

pub mod orchestrator;
pub mod processing;
pub mod registry;

pub use orchestrator::{default_stages, Pipeline, StageDeclaration};
pub use registry::Registry;
