//! Job infrastructure for background scrape execution.
//!
//! This module provides the kernel-level infrastructure for job execution:
//! - [`PostgresJobQueue`] - Database-backed job queue
//! - [`JobRegistry`] - Maps job type strings to handlers
//! - [`JobRunner`] - Long-running service that polls and executes jobs
//! - [`Job`] - Job row model
//!
//! # Architecture
//!
//! ```text
//! Dispatch endpoint calls queue.enqueue(cmd)
//!     │
//!     └─► Insert to DB, return job id
//!
//! JobRunner (worker process)
//!     │
//!     ├─► Claim jobs (FOR UPDATE SKIP LOCKED)
//!     ├─► Deserialize command from JSON (JobRegistry)
//!     ├─► Execute handler
//!     └─► Mark succeeded with result / failed (retry policy in queue)
//! ```
//!
//! Domain-specific commands and handlers live in their domains; this
//! module only provides the infrastructure.

mod job;
mod queue;
mod registry;
mod runner;
pub mod testing;

pub use job::{ErrorKind, Job, JobPriority, JobStatus};
pub use queue::{ClaimedJob, CommandMeta, JobQueue, JobQueueExt, PostgresJobQueue};
pub use registry::{JobRegistry, SharedJobRegistry};
pub use runner::{JobRunner, JobRunnerConfig};
