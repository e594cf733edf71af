pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod observability;
pub mod pipeline;

// Application use cases and their ports, with infrastructure adapters behind them
pub mod app;
pub mod infra;

pub use domain::{CanonicalRecord, Disposition, ReasonCode, RecordId, RejectedRecord, StageResult};
pub use error::{EtlError, Result};
pub use pipeline::{Pipeline, Registry, StageDeclaration};
