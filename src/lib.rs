//! Per-tenant Markov chatter.
//!
//! babble keeps a bounded, ordered corpus of text fragments for every tenant
//! (a chat room, a guild) in SQLite, and generates replies from it with a
//! word-level Markov chain built fresh for each reply.
//!
//! # Architecture
//!
//! - **Storage**: SQLite in WAL mode behind an r2d2 connection pool,
//!   with a short-lived read cache and retry on transient lock errors
//! - **Generation**: weighted random walk over a transition graph of lower-cased
//!   tokens, with optional sentence capitalisation
//!
//! # Modules
//!
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`db`]: connection setup, schema, migrations, pool and retry executor
//! - [`corpus`]: the tenant-facing [`corpus::store::CorpusStore`] and its SQL
//! - [`markov`]: transition graph and text generation
//! - [`error`]: the store's error type

pub mod config;
pub mod corpus;
pub mod db;
pub mod error;
pub mod markov;

pub use corpus::store::{CorpusStore, StoreOptions};
pub use error::{ErrorKind, StoreError};
pub use markov::Markov;
