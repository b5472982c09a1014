//! # Campground Scan
//!
//! Core library for finding available campsites on recreation.gov. It
//! turns the API's raw per-site, per-date status maps into a yes/no
//! answer about whether a stay's worth of consecutive nights is free,
//! and keeps asking until the answer is yes.

/// Types for scan requests, outcomes, and errors
mod scan_types;
pub use scan_types::*;

/// Consecutive-night availability resolver
mod availability;
pub use availability::*;

/// Transport configuration for the recreation.gov client
mod session;
pub use session::*;

/// Client for the recreation.gov availability API
mod rec_gov_client;
pub use rec_gov_client::*;

/// Reporting sinks for scan summaries
mod report;
pub use report::*;

/// One full pass over a list of parks
mod scanner;
pub use scanner::*;

/// Retry/poll loop around the scanner
mod poller;
pub use poller::*;
