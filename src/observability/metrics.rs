//! Metrics for the extract-transform-load run.
//!
//! Recording goes through the `metrics` facade; nothing is exported unless
//! the embedding program installs a recorder.

use std::fmt;

/// All metric names used in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Source metrics
    SourceFetchSuccess,
    SourceFetchError,
    SourceRecordsFetched,

    // Stage metrics
    StageRecordsAccepted,
    StageRecordsRejected,
    StageRunsCompleted,

    // Sink metrics
    SinkWritesSuccess,
    SinkWritesSkipped,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::SourceFetchSuccess => "etl_source_fetch_success_total",
            MetricName::SourceFetchError => "etl_source_fetch_error_total",
            MetricName::SourceRecordsFetched => "etl_source_records_fetched_total",
            MetricName::StageRecordsAccepted => "etl_stage_records_accepted_total",
            MetricName::StageRecordsRejected => "etl_stage_records_rejected_total",
            MetricName::StageRunsCompleted => "etl_stage_runs_completed_total",
            MetricName::SinkWritesSuccess => "etl_sink_writes_success_total",
            MetricName::SinkWritesSkipped => "etl_sink_writes_skipped_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub mod source {
    use super::MetricName;

    pub fn fetch_success(resource: &str, records: usize) {
        ::metrics::counter!(MetricName::SourceFetchSuccess.as_str(), "resource" => resource.to_string())
            .increment(1);
        ::metrics::counter!(MetricName::SourceRecordsFetched.as_str(), "resource" => resource.to_string())
            .increment(records as u64);
    }

    pub fn fetch_error(resource: &str) {
        ::metrics::counter!(MetricName::SourceFetchError.as_str(), "resource" => resource.to_string())
            .increment(1);
    }
}

pub mod stage {
    use super::MetricName;
    use crate::domain::StageResult;

    /// Record the outcome of one completed stage, rejected records broken down by reason
    pub fn completed(stage: &str, result: &StageResult) {
        ::metrics::counter!(MetricName::StageRecordsAccepted.as_str(), "stage" => stage.to_string())
            .increment(result.accepted.len() as u64);
        for rejected in &result.rejected {
            ::metrics::counter!(
                MetricName::StageRecordsRejected.as_str(),
                "stage" => stage.to_string(),
                "reason" => rejected.reason.as_str()
            )
            .increment(1);
        }
        ::metrics::counter!(MetricName::StageRunsCompleted.as_str(), "stage" => stage.to_string())
            .increment(1);
    }
}

pub mod sink {
    use super::MetricName;

    pub fn write_success(format: &'static str) {
        ::metrics::counter!(MetricName::SinkWritesSuccess.as_str(), "format" => format).increment(1);
    }

    pub fn write_skipped(format: &'static str) {
        ::metrics::counter!(MetricName::SinkWritesSkipped.as_str(), "format" => format).increment(1);
    }
}
