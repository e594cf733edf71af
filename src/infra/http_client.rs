use crate::app::ports::DataSourcePort;
use crate::domain::RawRecord;
use crate::error::{EtlError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

/// REST data source: `GET {base_url}/{resource}` returning a JSON array
pub struct ReqwestDataSource {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestDataSource {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource.trim_start_matches('/'))
    }
}

#[async_trait]
impl DataSourcePort for ReqwestDataSource {
    #[instrument(skip(self))]
    async fn fetch(&self, resource: &str) -> Result<Vec<RawRecord>> {
        let url = self.url_for(resource);
        let resp = self.client.get(&url).send().await?.error_for_status()?;
        let body: Value = resp.json().await?;

        let records = records_from_body(resource, body)?;
        debug!(url = %url, records = records.len(), "Fetched resource");
        Ok(records)
    }
}

/// A resource body must be a JSON array of records
fn records_from_body(resource: &str, body: Value) -> Result<Vec<RawRecord>> {
    match body {
        Value::Array(records) => Ok(records),
        other => Err(EtlError::Fetch {
            resource: resource.to_string(),
            message: format!("expected a JSON array, got {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
