//! Outbound proxy logic: mail API, enhancement model, PDF renderer.

pub mod enhance;
pub mod newsletter;
pub mod preview;

pub use enhance::EnhanceService;
pub use newsletter::{NewsletterService, SubscribeOutcome};
pub use preview::PreviewService;
