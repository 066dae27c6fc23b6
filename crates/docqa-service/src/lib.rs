//! docqa-service
//!
//! The five document operations (embed, summarize, ask, generate questions,
//! evaluate) behind [`DocQa`], plus the HTTP surface that exposes them.

#![deny(warnings)]
#![deny(unused_imports)]

pub mod handlers;
pub mod http;
pub mod responses;
pub mod telemetry;
pub mod uploads;

pub use handlers::{DocQa, DocumentSource};
pub use http::{bind_listener, router, serve};
pub use uploads::UploadStore;
