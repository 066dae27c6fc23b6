//! docqa-vector
//!
//! The persisted similarity index: [`IndexBuilder`] replaces it wholesale,
//! [`IndexQuery`] reloads it and runs nearest-neighbor searches.

pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use search::IndexQuery;
pub use writer::IndexBuilder;
