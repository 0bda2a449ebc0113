//! Fetch documentation symbol inventories and repository listings into
//! uniform tables, with a per-subject offline cache.

pub mod cache;
pub mod config;
pub mod docs;
pub mod error;
pub mod github;
pub mod models;
pub mod output;
pub mod retrieval;
pub mod table;
pub mod tree;

pub use config::Config;
pub use error::{Error, Result};
pub use retrieval::{Origin, RemoteSource, RetrieveOptions, Retriever, Snapshot};
pub use table::{Record, Table};
