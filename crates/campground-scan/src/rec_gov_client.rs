use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, cookie::Jar};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::scan_types::ScanError;
use crate::session::TransportConfig;

/// Path of the month-granularity availability endpoint
pub const AVAILABILITY_ENDPOINT: &str = "/api/camps/availability/campground";

/// Path of the campground metadata endpoint
pub const CAMPGROUND_ENDPOINT: &str = "/api/camps/campgrounds";

/// Path of the human-facing reservation page for a campsite
pub const WEB_ENDPOINT: &str = "/camping/campsites";

/// Status string marking a date as bookable; anything else is treated as
/// unavailable
pub const AVAILABLE_STATUS: &str = "Available";

/// `start_date` format the availability endpoint expects
const REQUEST_DATE_FORMAT: &str = "%Y-%m-%dT00:00:00.000Z";

/// Remote source of per-site availability data. The scanner only talks
/// to this trait, so tests can feed it canned months.
#[async_trait]
pub trait AvailabilityApi: Send + Sync {
    /// One whole month of per-site availability for a campground.
    /// `month_start` must be the first of the month.
    async fn month_availability(
        &self,
        park_id: &str,
        month_start: NaiveDate,
    ) -> Result<MonthAvailability, ScanError>;

    /// Human-readable facility name for a campground.
    async fn campground_name(&self, park_id: &str) -> Result<String, ScanError>;
}

/// Response from the month availability endpoint
#[derive(Debug, Deserialize)]
pub struct MonthAvailability {
    /// Per-campsite data, keyed by campsite id
    pub campsites: HashMap<String, CampsiteMonth>,
}

/// One campsite's slice of a month availability response
#[derive(Debug, Deserialize)]
pub struct CampsiteMonth {
    /// Declared site type, e.g. "STANDARD NONELECTRIC"
    #[serde(default)]
    pub campsite_type: Option<String>,

    /// Date string → status string, dates in `%Y-%m-%dT00:00:00Z`
    pub availabilities: HashMap<String, String>,
}

/// Response from the campground metadata endpoint
#[derive(Debug, Deserialize)]
struct CampgroundResponse {
    campground: CampgroundDetails,
}

#[derive(Debug, Deserialize)]
struct CampgroundDetails {
    facility_name: String,
}

/// Parses a response date key ("2021-03-06T00:00:00Z") into a calendar
/// date. Returns `None` for keys that do not start with `YYYY-MM-DD`.
pub fn parse_response_date(raw: &str) -> Option<NaiveDate> {
    let prefix = raw.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Client for the recreation.gov availability API
pub struct RecGovClient {
    client: Client,
    base_url: String,
}

impl RecGovClient {
    /// Builds a client from an already-resolved transport configuration.
    pub fn new(config: &TransportConfig) -> Result<Self, ScanError> {
        let user_agent = config
            .choose_user_agent()
            .ok_or_else(|| ScanError::ConfigError("No user agents configured".to_string()))?;

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(user_agent)
            .cookie_provider(jar)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScanError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, ScanError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| ScanError::Network(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            warn!("API request failed with status {}: {}", status, body);

            return Err(match status.as_u16() {
                429 => ScanError::RateLimited,
                401 | 403 => ScanError::AuthenticationFailed,
                404 => ScanError::NotFound,
                code => ScanError::RequestFailed { status: code, body },
            });
        }

        response
            .json()
            .await
            .map_err(|e| ScanError::DataFormat(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl AvailabilityApi for RecGovClient {
    async fn month_availability(
        &self,
        park_id: &str,
        month_start: NaiveDate,
    ) -> Result<MonthAvailability, ScanError> {
        let url = format!("{}{}/{}/month", self.base_url, AVAILABILITY_ENDPOINT, park_id);
        let start_date = month_start.format(REQUEST_DATE_FORMAT).to_string();
        debug!("Querying {} for availability starting {}", park_id, start_date);

        self.get_json(&url, &[("start_date", start_date)]).await
    }

    async fn campground_name(&self, park_id: &str) -> Result<String, ScanError> {
        let url = format!("{}{}/{}", self.base_url, CAMPGROUND_ENDPOINT, park_id);
        let response: CampgroundResponse = self.get_json(&url, &[]).await?;
        Ok(response.campground.facility_name)
    }
}
