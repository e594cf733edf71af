use crate::app::ports::{ColumnMap, RecordSinkPort};
use crate::error::{EtlError, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes record batches as `<name>.json` and `<name>.csv` under one directory
pub struct FileRecordSink {
    output_dir: PathBuf,
}

impl FileRecordSink {
    /// Create the sink, creating `output_dir` if it does not exist
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl RecordSinkPort for FileRecordSink {
    async fn write_structured(&self, records: &[Value], name: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(format!("{}.json", name));
        let mut writer = BufWriter::new(File::create(&path)?);

        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
        records.serialize(&mut ser)?;
        writer.flush()?;

        info!("Data saved to {}", path.display());
        Ok(path)
    }

    async fn write_tabular(
        &self,
        records: &[Value],
        name: &str,
        columns: Option<ColumnMap<'_>>,
    ) -> Result<PathBuf> {
        let rows = flat_rows(records, name)?;
        let path = self.output_dir.join(format!("{}.csv", name));

        // (header, source field) pairs; without a map the first row's keys are used as-is
        let layout: Vec<(&str, &str)> = match columns {
            Some(map) => map.to_vec(),
            None => rows[0].keys().map(|k| (k.as_str(), k.as_str())).collect(),
        };

        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_path(&path)?;
        writer.write_record(layout.iter().map(|(header, _)| *header))?;
        for row in &rows {
            writer.write_record(layout.iter().map(|(_, field)| render_cell(row.get(*field))))?;
        }
        writer.flush()?;

        info!("Data saved to {}", path.display());
        Ok(path)
    }
}

/// Tabular output needs a non-empty batch of JSON objects
fn flat_rows<'a>(records: &'a [Value], name: &str) -> Result<Vec<&'a Map<String, Value>>> {
    if records.is_empty() {
        return Err(EtlError::MalformedSinkInput {
            name: name.to_string(),
            message: "no records to write".into(),
        });
    }
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            record.as_object().ok_or_else(|| EtlError::MalformedSinkInput {
                name: name.to_string(),
                message: format!("record {} is not a field mapping", i),
            })
        })
        .collect()
}

fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(nested) => nested.to_string(),
    }
}
