// Pipeline processing: field normalization, deduplication and per-kind record processors

pub mod dedup;
pub mod normalize;
pub mod processors;

pub use processors::{create_processor, Dependencies, ProcessorKind, RecordProcessor};
