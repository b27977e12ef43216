//! CSV export of every stored reading.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use uvmap_core::error::AppError;

use crate::record::{format_timestamp, StoredReading};
use crate::store::{CacheStore, StoreError};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Io(e) => AppError::Io(e),
            ExportError::Store(e) => e.into(),
            ExportError::Csv(e) => AppError::Service(e.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Latitude")]
    lat: f64,
    #[serde(rename = "Longitude")]
    lng: f64,
    #[serde(rename = "UV Level")]
    uv: f64,
    #[serde(rename = "Comment")]
    comment: &'a str,
    #[serde(rename = "Query Time")]
    query_time: String,
}

impl<'a> From<&'a StoredReading> for ExportRow<'a> {
    fn from(stored: &'a StoredReading) -> Self {
        let record = &stored.record;
        Self {
            lat: record.lat,
            lng: record.lng,
            uv: record.uv,
            comment: record.comment.as_deref().unwrap_or(""),
            query_time: format_timestamp(record.captured_at_ms),
        }
    }
}

/// Write readings as CSV, header row first.
pub fn write_csv<W: Write>(readings: &[StoredReading], writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    if readings.is_empty() {
        wtr.write_record(["Latitude", "Longitude", "UV Level", "Comment", "Query Time"])?;
    }
    for stored in readings {
        wtr.serialize(ExportRow::from(stored))?;
    }
    wtr.flush()?;
    Ok(())
}

/// List the whole store and write it to `path`. Returns the row count.
pub async fn export_store(store: &dyn CacheStore, path: &Path) -> Result<usize, ExportError> {
    let readings = store.list_all().await?;
    let file = std::fs::File::create(path)?;
    write_csv(&readings, file)?;
    tracing::info!("Exported {} readings to {}", readings.len(), path.display());
    Ok(readings.len())
}
