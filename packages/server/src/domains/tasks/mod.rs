//! Tasks domain - the rows scraped incidents turn into.

pub mod models;
pub mod testing;

pub use models::{NewTask, PostgresTaskStore, Task, TaskStore};
