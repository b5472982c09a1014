use std::process::Stdio;

use async_trait::async_trait;
use campground_scan::{DateRange, ScanOutcome};
use tokio::process::Command;
use tracing::info;

/// Error type for notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The host program could not be started
    #[error("Failed to run {command}: {source}")]
    Spawn {
        /// The program that was invoked
        command: String,
        /// The underlying launch error
        source: std::io::Error,
    },

    /// The host program ran but reported failure
    #[error("{command} exited with {status}")]
    Failed {
        /// The program that was invoked
        command: String,
        /// Its exit status
        status: std::process::ExitStatus,
    },
}

/// Something that reacts to a successful scan. Failures here are worth
/// logging but must never undo a found reservation window.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Reacts to the outcome of the successful scan.
    async fn notify(&self, outcome: &ScanOutcome, range: &DateRange) -> Result<(), NotifyError>;
}

/// Runs a host program to completion, discarding its output.
pub(crate) async fn run_command(program: &str, args: &[String]) -> Result<(), NotifyError> {
    let status = Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|source| NotifyError::Spawn {
            command: program.to_string(),
            source,
        })?;

    if !status.success() {
        return Err(NotifyError::Failed {
            command: program.to_string(),
            status,
        });
    }
    Ok(())
}

/// Notifier for development/testing that only records invocations.
#[derive(Default)]
pub struct MockNotifier {
    calls: std::sync::Mutex<Vec<usize>>,
}

impl MockNotifier {
    /// Number of qualifying sites seen per call, in call order.
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, outcome: &ScanOutcome, range: &DateRange) -> Result<(), NotifyError> {
        info!(
            "🔔 [MOCK NOTIFY] {} site(s) available from {} to {}",
            outcome.available_sites.len(),
            range.start,
            range.end
        );
        self.calls.lock().unwrap().push(outcome.available_sites.len());
        Ok(())
    }
}
