//! Tenant corpora and settings.
//!
//! [`store::CorpusStore`] is the entry point. The other modules hold the
//! pieces it is assembled from: value types, the synchronous SQL and the
//! whole-database maintenance and statistics queries.

pub mod maintenance;
pub mod queries;
pub mod stats;
pub mod store;
pub mod types;
