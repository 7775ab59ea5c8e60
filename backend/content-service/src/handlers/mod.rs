//! HTTP request handlers.

pub mod enhance;
pub mod engagement;
pub mod feed;
pub mod newsletter;
pub mod preview;
pub mod summaries;

pub use enhance::enhance_description;
pub use engagement::{
    add_comment, delete_comment, get_comments, get_my_engagement, like_summary, rate_summary,
    record_view, unlike_summary,
};
pub use feed::{explore, get_block, get_home, get_placeholder, FeedHandlerState};
pub use newsletter::subscribe;
pub use preview::generate_preview;
pub use summaries::{create_summary, get_recommended, get_stats, get_summary, update_summary};
