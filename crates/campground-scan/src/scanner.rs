use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::NaiveDate;
use futures_util::future::try_join_all;
use tracing::{debug, warn};
use validator::Validate;

use crate::availability::has_consecutive_run;
use crate::rec_gov_client::{AVAILABLE_STATUS, AvailabilityApi, parse_response_date};
use crate::report::ScanReporter;
use crate::scan_types::{ParkResult, ScanError, ScanOutcome, ScanRequest};

/// Everything collected for one park before resolving, so a failed
/// month query never commits a partial park to the outcome.
struct ParkData {
    park_id: String,
    name: String,
    /// Site id → dates marked available across all queried months
    sites: BTreeMap<String, BTreeSet<NaiveDate>>,
}

/// Runs one full pass over a list of parks: month-by-month availability
/// queries, normalization, and the consecutive-run decision per site.
pub struct CampgroundScanner {
    api: Arc<dyn AvailabilityApi>,
    reporter: Arc<dyn ScanReporter>,
}

impl CampgroundScanner {
    /// Creates a scanner over the given API and reporting sink.
    pub fn new(api: Arc<dyn AvailabilityApi>, reporter: Arc<dyn ScanReporter>) -> Self {
        Self { api, reporter }
    }

    /// Checks every requested park and reports a summary line per park
    /// plus an overall verdict. Any query error fails the whole pass.
    pub async fn scan(&self, request: &ScanRequest) -> Result<ScanOutcome, ScanError> {
        request
            .validate()
            .map_err(|e| ScanError::ConfigError(e.to_string()))?;
        let nights = request.effective_nights()?;

        // Parks are independent and read-only, so they fan out
        // concurrently; each park's merge happens inside its own future.
        let parks = try_join_all(
            request
                .parks
                .iter()
                .map(|park_id| self.collect_park(park_id, request)),
        )
        .await?;

        let mut outcome = ScanOutcome::default();
        for park in parks {
            let total = park.sites.len();
            let mut available = 0usize;

            for (site_id, dates) in &park.sites {
                let in_window: BTreeSet<NaiveDate> = dates
                    .iter()
                    .copied()
                    .filter(|date| request.range.covers_night(*date))
                    .collect();

                if !in_window.is_empty() && has_consecutive_run(&in_window, nights) {
                    available += 1;
                    debug!("Available site {}: {}", available, site_id);
                    outcome.available_sites.insert(site_id.clone());
                }
            }

            let result = ParkResult {
                park_id: park.park_id,
                name: park.name,
                available,
                total,
            };
            if result.has_availability() {
                outcome.any_available = true;
            }
            self.reporter.park_summary(&result);
            outcome.parks.push(result);
        }

        self.reporter.overall(outcome.any_available, &request.range);
        Ok(outcome)
    }

    /// Fetches and merges every month touched by the request for one
    /// park. Only dates with status "Available" survive, and only for
    /// sites passing the type filter.
    async fn collect_park(
        &self,
        park_id: &str,
        request: &ScanRequest,
    ) -> Result<ParkData, ScanError> {
        let name = self.api.campground_name(park_id).await?;
        let mut sites: BTreeMap<String, BTreeSet<NaiveDate>> = BTreeMap::new();

        for month_start in request.range.month_starts() {
            let month = self.api.month_availability(park_id, month_start).await?;

            for (site_id, campsite) in month.campsites {
                if let Some(filter) = request.site_type_filter() {
                    if campsite.campsite_type.as_deref() != Some(filter) {
                        continue;
                    }
                }

                for (raw_date, status) in &campsite.availabilities {
                    if status != AVAILABLE_STATUS {
                        continue;
                    }
                    let Some(date) = parse_response_date(raw_date) else {
                        warn!("Failed to parse date: {}", raw_date);
                        continue;
                    };
                    sites.entry(site_id.clone()).or_default().insert(date);
                }
            }
        }

        debug!(
            "Park {} has {} site(s) with some availability",
            park_id,
            sites.len()
        );
        Ok(ParkData {
            park_id: park_id.to_string(),
            name,
            sites,
        })
    }
}
