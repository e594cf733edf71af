use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;

use crate::domain::RawRecord;
use crate::error::Result;

/// Ordered mapping of output column header to source field name
pub type ColumnMap<'a> = &'a [(&'a str, &'a str)];

/// Remote source of raw records, addressed by resource name
#[async_trait]
pub trait DataSourcePort: Send + Sync {
    async fn fetch(&self, resource: &str) -> Result<Vec<RawRecord>>;
}

/// Durable writer for one batch of flat records
#[async_trait]
pub trait RecordSinkPort: Send + Sync {
    /// Write the whole batch as one structured document named `name`
    async fn write_structured(&self, records: &[Value], name: &str) -> Result<PathBuf>;

    /// Write the batch as a table named `name`.
    ///
    /// With a column map only the listed columns are written, in order.
    async fn write_tabular(
        &self,
        records: &[Value],
        name: &str,
        columns: Option<ColumnMap<'_>>,
    ) -> Result<PathBuf>;
}
