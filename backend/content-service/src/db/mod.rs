//! Repositories over the hosted database service.

pub mod engagement_repo;
pub mod summary_repo;

pub use engagement_repo::EngagementRepo;
pub use summary_repo::SummaryRepo;

/// The one content table everything hangs off.
pub const CONTENT_TABLE: &str = "book_summaries";
