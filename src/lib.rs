//! Summary Feed - a polling feed of summarized news articles
//!
//! This crate keeps a de-duplicated, newest-first feed of articles fetched
//! from a summary backend, persists it locally, and serves it as JSON.

pub mod article;
pub mod config;
pub mod fetcher;
pub mod highlight;
pub mod merge;
pub mod routes;
pub mod session;
pub mod store;
pub mod trends;
