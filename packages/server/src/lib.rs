// Task tracker scrape pipeline - core library
//
// Asynchronous scrape-dispatch-callback service: an HTTP dispatch endpoint
// enqueues scrape jobs into a Postgres-backed queue, worker processes
// extract incident records from cloud status pages and deliver them to a
// caller-supplied callback, and the ingestion endpoint persists each
// record as a task row.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
