use std::collections::BTreeSet;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use tracing::debug;
use validator::Validate;

/// Date format accepted for check-in / check-out input
pub const INPUT_DATE_FORMAT: &str = "%Y-%m-%d";

/// A check-in / check-out pair. The stay's nights are the dates in
/// `[start, end)`; the check-out date itself is not a night.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// Check-in date
    pub start: NaiveDate,
    /// Check-out date
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting check-out on or before check-in.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ScanError> {
        if end <= start {
            return Err(ScanError::InvalidDateRange);
        }
        Ok(Self { start, end })
    }

    /// Parses `YYYY-MM-DD` strings. Fails before any network activity.
    pub fn parse(start: &str, end: &str) -> Result<Self, ScanError> {
        let start = parse_input_date(start)?;
        let end = parse_input_date(end)?;
        Self::new(start, end)
    }

    /// Number of nights spanned by the full range.
    pub fn span_nights(&self) -> u32 {
        (self.end - self.start).num_days() as u32
    }

    /// Whether `date` is one of the stay's nights.
    pub fn covers_night(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    /// The stay's nights, ascending.
    pub fn night_dates(&self) -> BTreeSet<NaiveDate> {
        self.start.iter_days().take_while(|d| *d < self.end).collect()
    }

    /// First-of-month for every calendar month touched by the range,
    /// ascending and without duplicates. The availability endpoint only
    /// accepts whole-month queries, so a range crossing a month boundary
    /// needs one query per entry.
    pub fn month_starts(&self) -> Vec<NaiveDate> {
        let mut months = Vec::new();
        let mut cursor = NaiveDate::from_ymd_opt(self.start.year(), self.start.month(), 1)
            .expect("first of month is a valid date");
        while cursor <= self.end {
            months.push(cursor);
            match cursor.checked_add_months(Months::new(1)) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        months
    }
}

fn parse_input_date(raw: &str) -> Result<NaiveDate, ScanError> {
    NaiveDate::parse_from_str(raw, INPUT_DATE_FORMAT)
        .map_err(|_| ScanError::InvalidDate(raw.to_string()))
}

/// How to treat a requested-nights value outside `[1, span]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NightsPolicy {
    /// Widen the value to the full span
    #[default]
    Clamp,
    /// Reject the request instead
    Strict,
}

/// One scan's worth of user intent: which parks, which window, and how
/// many consecutive nights are needed.
#[derive(Debug, Clone, Validate)]
pub struct ScanRequest {
    /// recreation.gov campground ids to check
    #[validate(length(min = 1, message = "At least one park id is required"))]
    pub parks: Vec<String>,

    /// Check-in / check-out window
    pub range: DateRange,

    /// Only count sites whose declared type matches exactly, e.g.
    /// "STANDARD NONELECTRIC". `None` (or empty) counts every site.
    pub site_type: Option<String>,

    /// Consecutive nights needed. Defaults to the full window length.
    pub required_nights: Option<u32>,

    /// What to do when `required_nights` falls outside the window.
    pub nights_policy: NightsPolicy,
}

impl ScanRequest {
    /// A request for the full window at the given parks.
    pub fn new(parks: Vec<String>, range: DateRange) -> Self {
        Self {
            parks,
            range,
            site_type: None,
            required_nights: None,
            nights_policy: NightsPolicy::default(),
        }
    }

    /// The site-type filter, with an empty string treated as no filter.
    pub fn site_type_filter(&self) -> Option<&str> {
        self.site_type.as_deref().filter(|s| !s.is_empty())
    }

    /// The consecutive-nights threshold actually used for the scan.
    ///
    /// A requested value outside `[1, span]` can never be satisfied by
    /// the window, so under [`NightsPolicy::Clamp`] it is widened to the
    /// span instead of producing guaranteed misses.
    pub fn effective_nights(&self) -> Result<u32, ScanError> {
        let span = self.range.span_nights();
        let requested = self.required_nights.unwrap_or(span);
        if (1..=span).contains(&requested) {
            return Ok(requested);
        }
        match self.nights_policy {
            NightsPolicy::Clamp => {
                debug!("Setting number of nights to {}", span);
                Ok(span)
            }
            NightsPolicy::Strict => Err(ScanError::InvalidNights { requested, span }),
        }
    }
}

/// Availability summary for one park in one scan pass.
#[derive(Debug, Clone, Serialize)]
pub struct ParkResult {
    /// recreation.gov campground id
    pub park_id: String,
    /// Human-readable facility name
    pub name: String,
    /// Sites with a long-enough consecutive run in the window
    pub available: usize,
    /// Sites with any availability at all in the queried months
    pub total: usize,
}

impl ParkResult {
    /// Whether at least one site in this park qualifies.
    pub fn has_availability(&self) -> bool {
        self.available > 0
    }
}

/// Result of one full pass over the requested parks. Built fresh per
/// scan and discarded once the poll loop has consumed it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanOutcome {
    /// True if any park has a qualifying site
    pub any_available: bool,
    /// Qualifying site ids across all parks, ordered by site id
    pub available_sites: BTreeSet<String>,
    /// Per-park summaries, in request order
    pub parks: Vec<ParkResult>,
}

impl ScanOutcome {
    /// The first `limit` qualifying site ids, in site-id order.
    pub fn first_sites(&self, limit: usize) -> impl Iterator<Item = &str> {
        self.available_sites.iter().take(limit).map(String::as_str)
    }
}

/// Error type for scan operations.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Date input that does not parse as `YYYY-MM-DD`
    #[error("Not a valid date: '{0}'")]
    InvalidDate(String),

    /// Check-out on or before check-in
    #[error("Invalid date range: check-out date must be after check-in date")]
    InvalidDateRange,

    /// Requested nights outside the window, under [`NightsPolicy::Strict`]
    #[error("Invalid number of nights: {requested} is outside 1..={span}")]
    InvalidNights {
        /// The requested value
        requested: u32,
        /// The window length in nights
        span: u32,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Non-200 response from the API, with status and body
    #[error("Request failed with status {status}: {body}")]
    RequestFailed {
        /// HTTP status code
        status: u16,
        /// Response body, as returned
        body: String,
    },

    /// Rate limited by the remote API
    #[error("Rate limited by recreation.gov")]
    RateLimited,

    /// Authentication failed with the remote API
    #[error("Authentication failed with recreation.gov")]
    AuthenticationFailed,

    /// Campground not found
    #[error("Campground not found")]
    NotFound,

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Data format error
    #[error("Data format error: {0}")]
    DataFormat(String),
}

impl ScanError {
    /// Whether the poll loop should retry after this error. Network
    /// failures, rate limiting and server-side errors pass; everything
    /// else aborts the loop.
    pub fn is_transient(&self) -> bool {
        match self {
            ScanError::Network(_) | ScanError::RateLimited => true,
            ScanError::RequestFailed { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
