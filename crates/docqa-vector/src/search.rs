use anyhow::{anyhow, Context, Result};
use arrow_array::RecordBatch;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};
use std::path::Path;
use std::sync::Arc;

use docqa_core::error::Error;
use docqa_core::traits::Embedder;
use docqa_core::types::{Chunk, ScoredChunk};

use crate::schema::{CHUNK_INDEX, CONTENT, DISTANCE, SOURCE, TOTAL_CHUNKS};
use crate::table::{float32_column, int32_column, open_db, string_column, table_exists};

/// Read side of the persisted index. Open one per request.
pub struct IndexQuery {
	table: Table,
	embedder: Arc<dyn Embedder>,
}

impl IndexQuery {
	/// Fails with [`Error::IndexNotFound`] when nothing has been indexed yet.
	pub async fn open(index_dir: &Path, table_name: &str, embedder: Arc<dyn Embedder>) -> Result<Self> {
		if !index_dir.is_dir() {
			return Err(Error::IndexNotFound(index_dir.to_path_buf()).into());
		}
		let db = open_db(index_dir).await?;
		if !table_exists(&db, table_name).await? {
			return Err(Error::IndexNotFound(index_dir.to_path_buf()).into());
		}
		let table = db.open_table(table_name).execute().await?;
		Ok(Self { table, embedder })
	}

	/// The `k` nearest chunks to `query` by cosine distance, closest first.
	pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
		let embedder = Arc::clone(&self.embedder);
		let texts = vec![query.to_string()];
		let query_vec = tokio::task::spawn_blocking(move || embedder.embed_batch(&texts))
			.await
			.map_err(|e| anyhow!("embedding task failed: {e}"))?
			.context("embedding query")?
			.into_iter()
			.next()
			.ok_or_else(|| anyhow!("embedder returned no vector for the query"))?;

		let batches: Vec<RecordBatch> = self
			.table
			.vector_search(query_vec)?
			.distance_type(DistanceType::Cosine)
			.limit(k)
			.execute()
			.await?
			.try_collect()
			.await?;

		let mut hits = Vec::new();
		for batch in &batches {
			hits.extend(batch_to_hits(batch)?);
		}
		hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
		hits.truncate(k);
		Ok(hits)
	}
}

fn batch_to_hits(batch: &RecordBatch) -> Result<Vec<ScoredChunk>> {
	let contents = string_column(batch, CONTENT)?;
	let sources = string_column(batch, SOURCE)?;
	let chunk_indices = int32_column(batch, CHUNK_INDEX)?;
	let totals = int32_column(batch, TOTAL_CHUNKS)?;
	let distances = float32_column(batch, DISTANCE)?;
	(0..batch.num_rows())
		.map(|i| {
			Ok(ScoredChunk {
				chunk: Chunk {
					content: contents.value(i).to_string(),
					source: sources.value(i).to_string(),
					chunk_index: usize::try_from(chunk_indices.value(i))?,
					total_chunks: usize::try_from(totals.value(i))?,
				},
				distance: distances.value(i),
			})
		})
		.collect()
}
