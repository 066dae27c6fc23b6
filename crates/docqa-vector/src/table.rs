//! LanceDB connection helpers and typed column access for result batches.

use anyhow::{anyhow, Result};
use arrow_array::{Array, Float32Array, Int32Array, RecordBatch, StringArray};
use lancedb::{connect, Connection};
use std::path::Path;

pub async fn open_db(path: &Path) -> Result<Connection> {
    Ok(connect(path.to_string_lossy().as_ref()).execute().await?)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await?;
    Ok(names.iter().any(|n| n == name))
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| anyhow!("{} column missing or mistyped", name))
}

pub fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    column::<StringArray>(batch, name)
}

pub fn int32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array> {
    column::<Int32Array>(batch, name)
}

pub fn float32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float32Array> {
    column::<Float32Array>(batch, name)
}
