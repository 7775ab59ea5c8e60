//! Content Service Library
//!
//! HTTP API for the book-summary platform: summary pages, feed and
//! explore projections, engagement (likes, ratings, comments, views),
//! and the thin proxies the web client needs (newsletter subscription,
//! AI description enhancement, PDF preview rendering).
//!
//! # Modules
//!
//! - `handlers`: HTTP request handlers
//! - `models`: request/response data structures
//! - `services`: outbound proxy logic (mail, model API, renderer)
//! - `db`: repositories over the hosted database service
//! - `middleware`: bearer-session authentication
//! - `error`: error types and HTTP mapping
//! - `config`: configuration management
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
