use anyhow::{anyhow, Context, Result};
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use std::path::PathBuf;
use std::sync::Arc;

use docqa_core::error::Error;
use docqa_core::traits::Embedder;
use docqa_core::types::Chunk;

use crate::schema::chunk_schema;
use crate::table::open_db;

/// Writes the single on-disk index. Every build replaces the previous one.
pub struct IndexBuilder {
	index_dir: PathBuf,
	table_name: String,
}

impl IndexBuilder {
	pub fn new(index_dir: impl Into<PathBuf>, table_name: &str) -> Self {
		Self { index_dir: index_dir.into(), table_name: table_name.to_string() }
	}

	/// Delete any existing index, embed all chunks in one call and write a
	/// fresh table. If embedding fails the old index is already gone.
	pub async fn build(&self, chunks: &[Chunk], embedder: Arc<dyn Embedder>) -> Result<usize> {
		if chunks.is_empty() {
			return Err(Error::NoExtractableText.into());
		}
		if self.index_dir.exists() {
			tracing::info!(index_dir = %self.index_dir.display(), "removing previous index");
			tokio::fs::remove_dir_all(&self.index_dir)
				.await
				.with_context(|| format!("removing {}", self.index_dir.display()))?;
		}

		let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
		let dim = embedder.dim();
		let embeddings = tokio::task::spawn_blocking(move || embedder.embed_batch(&texts))
			.await
			.map_err(|e| anyhow!("embedding task failed: {e}"))?
			.context("embedding chunks")?;
		if embeddings.len() != chunks.len() {
			return Err(anyhow!("embedder returned {} vectors for {} chunks", embeddings.len(), chunks.len()));
		}

		tokio::fs::create_dir_all(&self.index_dir)
			.await
			.with_context(|| format!("creating {}", self.index_dir.display()))?;
		let batch = chunks_to_record_batch(chunks, &embeddings, dim)?;
		let schema = batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
		let db = open_db(&self.index_dir).await?;
		db.create_table(&self.table_name, reader).execute().await?;
		tracing::info!(
			rows = chunks.len(),
			table = %self.table_name,
			index_dir = %self.index_dir.display(),
			"index written"
		);
		Ok(chunks.len())
	}
}

fn chunks_to_record_batch(chunks: &[Chunk], embeddings: &[Vec<f32>], dim: usize) -> Result<RecordBatch> {
	let dim_i32 = i32::try_from(dim).map_err(|_| anyhow!("embedding dim {dim} too large"))?;
	let mut contents = Vec::with_capacity(chunks.len());
	let mut sources = Vec::with_capacity(chunks.len());
	let mut chunk_indices = Vec::with_capacity(chunks.len());
	let mut total_chunks = Vec::with_capacity(chunks.len());
	let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(chunks.len());
	for (chunk, vector) in chunks.iter().zip(embeddings) {
		if vector.len() != dim {
			return Err(anyhow!("vector for chunk {} has {} dims, expected {dim}", chunk.chunk_index, vector.len()));
		}
		contents.push(chunk.content.as_str());
		sources.push(chunk.source.as_str());
		chunk_indices.push(i32::try_from(chunk.chunk_index)?);
		total_chunks.push(i32::try_from(chunk.total_chunks)?);
		vectors.push(Some(vector.iter().copied().map(Some).collect()));
	}
	let batch = RecordBatch::try_new(chunk_schema(dim_i32), vec![
		Arc::new(StringArray::from(contents)),
		Arc::new(StringArray::from(sources)),
		Arc::new(Int32Array::from(chunk_indices)),
		Arc::new(Int32Array::from(total_chunks)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, dim_i32)),
	])?;
	Ok(batch)
}
