//! Aggregates Jira defect counts for a small dashboard.
//!
//! Every number comes from Jira's approximate-count search endpoint: one JQL
//! query per status (and per day for the trend), issued concurrently and
//! folded into a summary.

pub mod auth;
pub mod cli;
pub mod config;
pub mod defects;
pub mod error;
pub mod fallback;
pub mod models;
pub mod providers;
pub mod server;
