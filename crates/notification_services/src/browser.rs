use async_trait::async_trait;
use campground_scan::{DateRange, ScanOutcome, WEB_ENDPOINT};
use tracing::info;

use crate::service::{Notifier, NotifyError, run_command};

/// At most this many reservation pages are opened per success.
pub const RESERVATION_PAGE_LIMIT: usize = 5;

#[cfg(target_os = "macos")]
const DEFAULT_OPENER: &str = "open";
#[cfg(not(target_os = "macos"))]
const DEFAULT_OPENER: &str = "xdg-open";

/// Opens the reservation page for the first qualifying sites, in
/// site-id order, via the platform's URL opener.
pub struct BrowserNotifier {
    base_url: String,
    opener: String,
    limit: usize,
}

impl BrowserNotifier {
    /// Creates a notifier opening pages under `base_url` with the
    /// platform default opener.
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            opener: DEFAULT_OPENER.to_string(),
            limit: RESERVATION_PAGE_LIMIT,
        }
    }

    /// Overrides the opener program.
    pub fn with_opener(mut self, opener: String) -> Self {
        self.opener = opener;
        self
    }

    /// The pages this outcome would open, capped and in site-id order.
    pub fn reservation_urls(&self, outcome: &ScanOutcome) -> Vec<String> {
        outcome
            .first_sites(self.limit)
            .map(|site| format!("{}{}/{}", self.base_url, WEB_ENDPOINT, site))
            .collect()
    }
}

#[async_trait]
impl Notifier for BrowserNotifier {
    async fn notify(&self, outcome: &ScanOutcome, _range: &DateRange) -> Result<(), NotifyError> {
        for url in self.reservation_urls(outcome) {
            info!("Opening reservation page {}", url);
            run_command(&self.opener, std::slice::from_ref(&url)).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome_with_sites(sites: &[&str]) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        outcome.any_available = !sites.is_empty();
        for site in sites {
            outcome.available_sites.insert(site.to_string());
        }
        outcome
    }

    #[test]
    fn builds_reservation_urls_in_site_id_order() {
        let notifier = BrowserNotifier::new("https://www.recreation.gov".to_string());
        let outcome = outcome_with_sites(&["300", "100", "200"]);

        assert_eq!(
            notifier.reservation_urls(&outcome),
            vec![
                "https://www.recreation.gov/camping/campsites/100",
                "https://www.recreation.gov/camping/campsites/200",
                "https://www.recreation.gov/camping/campsites/300",
            ]
        );
    }

    #[test]
    fn caps_opened_pages_at_the_limit() {
        let notifier = BrowserNotifier::new("https://www.recreation.gov".to_string());
        let sites: Vec<String> = (0..9).map(|i| format!("site-{}", i)).collect();
        let refs: Vec<&str> = sites.iter().map(String::as_str).collect();
        let outcome = outcome_with_sites(&refs);

        let urls = notifier.reservation_urls(&outcome);
        assert_eq!(urls.len(), RESERVATION_PAGE_LIMIT);
        assert!(urls[0].ends_with("/site-0"));
        assert!(urls[4].ends_with("/site-4"));
    }

    #[test]
    fn no_sites_means_no_pages() {
        let notifier = BrowserNotifier::new("https://www.recreation.gov".to_string());
        assert!(notifier.reservation_urls(&outcome_with_sites(&[])).is_empty());
    }
}
