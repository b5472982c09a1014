//! # Notification Services
//!
//! This crate tells the user that a campsite was found: it opens
//! reservation pages in a browser and plays an audible alert. Both are
//! thin wrappers over host programs, behind a trait so the finder can
//! be tested without side effects.

/// Notifier trait and error type
mod service;
pub use service::*;

/// Opens reservation pages for qualifying sites
mod browser;
pub use browser::*;

/// Plays an audible success alert
mod sound;
pub use sound::*;
