//! Export pipeline: sanitized snapshot to a dated JSON artifact
//!
//! The artifact is written through a scoped temp-file handle: acquire the
//! temp file, write, persist by rename. The handle's Drop removes the temp
//! file on every non-persisted exit path, so a failed export never leaves
//! debris behind.

use crate::sanitize::RecordValue;
use crate::state::FieldValue;
use chrono::Local;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export blocked by a security restriction: {0}")]
    PermissionDenied(io::Error),
    #[error("export failed: storage quota exhausted: {0}")]
    StorageFull(io::Error),
    #[error("export serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("export failed: {0}")]
    Io(io::Error),
}

impl ExportError {
    fn classify(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => ExportError::PermissionDenied(err),
            io::ErrorKind::StorageFull | io::ErrorKind::QuotaExceeded => {
                ExportError::StorageFull(err)
            }
            _ => ExportError::Io(err),
        }
    }

    /// Distinct user-facing message per failure class. All export failures
    /// are recoverable; the user may retry.
    pub fn user_message(&self) -> &'static str {
        match self {
            ExportError::PermissionDenied(_) => {
                "Export was blocked by a security restriction. Check permissions on the export directory and retry."
            }
            ExportError::StorageFull(_) => {
                "Export failed because storage is full. Free up space and retry."
            }
            ExportError::Serialize(_) | ExportError::Io(_) => {
                "Export failed unexpectedly. The record was not saved; please retry."
            }
        }
    }
}

/// Assemble the export object from validated form values. Field names
/// follow the exported document contract; optional fields are omitted
/// when empty.
pub fn build_export_record(values: &HashMap<String, FieldValue>) -> RecordValue {
    let mut record = RecordValue::object();

    if let Some(v) = values.get("employerName") {
        record.insert("employerName".into(), RecordValue::Text(v.as_text().into()));
    }
    if let Some(v) = values.get("currency") {
        record.insert("currency".into(), RecordValue::Text(v.as_text().into()));
    }
    if let Some(v) = values.get("annualGrossIncome") {
        // Whole currency units: an integer leaf keeps the JSON number
        // integral (50000, not 50000.0).
        record.insert(
            "annualGrossIncome".into(),
            RecordValue::Integer(v.as_currency()),
        );
    }
    if let Some(date) = values.get("employmentStartDate").and_then(|v| v.as_date()) {
        record.insert("employmentStartDate".into(), RecordValue::Date(date));
    }
    if let Some(date) = values.get("employmentEndDate").and_then(|v| v.as_date()) {
        record.insert("employmentEndDate".into(), RecordValue::Date(date));
    }
    if let Some(v) = values.get("notes") {
        if !v.as_text().is_empty() {
            record.insert("notes".into(), RecordValue::Text(v.as_text().into()));
        }
    }

    RecordValue::Object(record)
}

/// Filename for an export performed today: `employment-form-YYYY-MM-DD.json`.
pub fn export_filename() -> String {
    format!("employment-form-{}.json", Local::now().format("%Y-%m-%d"))
}

/// Serialize a sanitized record to `<export_dir>/<filename>`. Any failure
/// is classified and logged; the temp handle is released on every path.
pub fn write_export(
    record: &RecordValue,
    export_dir: &Path,
    filename: &str,
) -> Result<PathBuf, ExportError> {
    let json = serde_json::to_string_pretty(record)?;

    let result = (|| {
        fs::create_dir_all(export_dir)?;
        let final_path = export_dir.join(filename);
        let mut handle = ArtifactHandle::acquire(export_dir, filename)?;
        handle.write(json.as_bytes())?;
        handle.persist(&final_path)
    })();

    result.map_err(|err| {
        let classified = ExportError::classify(err);
        tracing::error!(error = %classified, "export failed");
        classified
    })
}

/// Export a sanitized record under today's dated filename.
pub fn export_record(record: &RecordValue, export_dir: &Path) -> Result<PathBuf, ExportError> {
    write_export(record, export_dir, &export_filename())
}

/// Scoped handle for the artifact being produced. Dropped without
/// `persist`, it removes its temp file.
struct ArtifactHandle {
    tmp_path: PathBuf,
    persisted: bool,
}

impl ArtifactHandle {
    fn acquire(dir: &Path, filename: &str) -> io::Result<Self> {
        let tmp_path = dir.join(format!("{filename}.tmp"));
        // Truncate any leftover from an interrupted earlier attempt.
        fs::write(&tmp_path, b"")?;
        Ok(Self {
            tmp_path,
            persisted: false,
        })
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        fs::write(&self.tmp_path, bytes)
    }

    fn persist(mut self, final_path: &Path) -> io::Result<PathBuf> {
        fs::rename(&self.tmp_path, final_path)?;
        self.persisted = true;
        Ok(final_path.to_path_buf())
    }
}

impl Drop for ArtifactHandle {
    fn drop(&mut self) {
        if !self.persisted {
            let _ = fs::remove_file(&self.tmp_path);
        }
    }
}
