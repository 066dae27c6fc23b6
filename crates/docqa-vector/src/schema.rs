use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const CONTENT: &str = "content";
pub const SOURCE: &str = "source";
pub const CHUNK_INDEX: &str = "chunk_index";
pub const TOTAL_CHUNKS: &str = "total_chunks";
pub const VECTOR: &str = "vector";
/// Column LanceDB appends to vector search results.
pub const DISTANCE: &str = "_distance";

pub fn chunk_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new(CONTENT, DataType::Utf8, false),
		Field::new(SOURCE, DataType::Utf8, false),
		Field::new(CHUNK_INDEX, DataType::Int32, false),
		Field::new(TOTAL_CHUNKS, DataType::Int32, false),
		Field::new(VECTOR, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
