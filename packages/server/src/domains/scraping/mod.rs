//! Scraping domain - sources, extraction, assignment and the scrape job.

pub mod assign;
pub mod extractor;
pub mod handlers;
pub mod jobs;
pub mod records;
pub mod sites;
pub mod testing;

pub use assign::{AssignmentStrategy, FixedAssigner, RandomAssigner, DEFAULT_ASSIGNEE_POOL};
pub use extractor::{parse_incidents, ExtractionOutcome, IncidentExtractor, PageExtractor};
pub use handlers::{handle_scrape_incidents, register_scraping_jobs, MAX_RECORDS_PER_RUN};
pub use jobs::ScrapeIncidentsJob;
pub use records::{IncidentRecord, Priority, TaskStatus, DESCRIPTION_FALLBACK};
pub use sites::SourceSite;
