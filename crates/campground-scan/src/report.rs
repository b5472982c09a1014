use crate::scan_types::{DateRange, ParkResult};

/// Marker for a park with at least one qualifying site
pub const SUCCESS_EMOJI: &str = "🏕";

/// Marker for a park with none
pub const FAILURE_EMOJI: &str = "❌";

/// Sink for the human-readable scan summary. Reporting is a side
/// channel; nothing in the scan decision depends on it.
pub trait ScanReporter: Send + Sync {
    /// One line per park, in request order.
    fn park_summary(&self, park: &ParkResult);

    /// Overall verdict for the pass.
    fn overall(&self, any_available: bool, range: &DateRange);
}

/// Formats the per-park summary line.
pub fn park_summary_line(park: &ParkResult) -> String {
    let emoji = if park.has_availability() {
        SUCCESS_EMOJI
    } else {
        FAILURE_EMOJI
    };
    format!(
        "{} {} ({}): {} site(s) available out of {} site(s)",
        emoji, park.name, park.park_id, park.available, park.total
    )
}

/// Reporter that prints to stdout.
pub struct ConsoleReporter;

impl ScanReporter for ConsoleReporter {
    fn park_summary(&self, park: &ParkResult) {
        println!("{}", park_summary_line(park));
    }

    fn overall(&self, any_available: bool, range: &DateRange) {
        if any_available {
            println!(
                "There are campsites available from {} to {}!!!",
                range.start, range.end
            );
        } else {
            println!("There are no campsites available :(");
        }
    }
}
