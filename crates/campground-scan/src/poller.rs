use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::scan_types::{ScanError, ScanOutcome, ScanRequest};
use crate::scanner::CampgroundScanner;

/// Sleep abstraction so tests can drive poll iterations without real
/// delays.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Waits for `duration` to elapse.
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the tokio timer.
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// One full pass over the requested parks.
#[async_trait]
pub trait Scan: Send + Sync {
    /// Runs the pass and reports what it found.
    async fn scan(&self, request: &ScanRequest) -> Result<ScanOutcome, ScanError>;
}

#[async_trait]
impl Scan for CampgroundScanner {
    async fn scan(&self, request: &ScanRequest) -> Result<ScanOutcome, ScanError> {
        CampgroundScanner::scan(self, request).await
    }
}

/// Configuration for the poll loop.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Delay between scan attempts (default: 6 seconds)
    pub delay: Duration,

    /// Stop after this many attempts. `None` polls until availability
    /// appears or the loop is cancelled.
    pub max_attempts: Option<u32>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(6),
            max_attempts: None,
        }
    }
}

/// How a poll run ended.
#[derive(Debug)]
pub enum PollOutcome {
    /// A scan found at least one qualifying site
    Available(ScanOutcome),
    /// The cancellation channel fired
    Cancelled,
    /// The configured attempt bound was reached without availability
    AttemptsExhausted,
}

/// Creates the cancellation channel for a [`Poller`]. Send `true` to
/// stop the loop at the next opportunity.
pub fn cancellation_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Repeats scans until one finds availability, with a fixed delay
/// between attempts. Transient errors are logged with the attempt
/// counter and retried like a "not yet available" pass; everything else
/// aborts the loop.
pub struct Poller<S, C> {
    scanner: S,
    clock: C,
    config: PollerConfig,
    cancel: watch::Receiver<bool>,
}

impl<S: Scan, C: Clock> Poller<S, C> {
    /// Creates a poller. `cancel` is the receiving side of
    /// [`cancellation_channel`].
    pub fn new(scanner: S, clock: C, config: PollerConfig, cancel: watch::Receiver<bool>) -> Self {
        Self {
            scanner,
            clock,
            config,
            cancel,
        }
    }

    /// Runs the loop to completion.
    pub async fn run(&mut self, request: &ScanRequest) -> Result<PollOutcome, ScanError> {
        let mut attempt: u32 = 0;

        loop {
            if *self.cancel.borrow() {
                return Ok(PollOutcome::Cancelled);
            }
            attempt += 1;

            match self.scanner.scan(request).await {
                Ok(outcome) if outcome.any_available => {
                    info!("Attempt {}: availability found", attempt);
                    return Ok(PollOutcome::Available(outcome));
                }
                Ok(_) => {
                    info!("Attempt {}: no campsites available yet", attempt);
                }
                Err(e) if e.is_transient() => {
                    warn!("Attempt {} failed, will retry: {}", attempt, e);
                }
                Err(e) => return Err(e),
            }

            if let Some(max) = self.config.max_attempts {
                if attempt >= max {
                    return Ok(PollOutcome::AttemptsExhausted);
                }
            }

            if self.wait_for_next_attempt().await {
                return Ok(PollOutcome::Cancelled);
            }
        }
    }

    /// Sleeps the configured delay; returns true if cancellation
    /// arrived first.
    async fn wait_for_next_attempt(&mut self) -> bool {
        let sleep = self.clock.sleep(self.config.delay);
        tokio::select! {
            () = sleep => false,
            () = cancel_requested(&mut self.cancel) => true,
        }
    }
}

/// Resolves once cancellation is requested. If the sender is gone,
/// cancellation can no longer arrive, so this parks forever instead of
/// spinning the caller.
async fn cancel_requested(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::scan_types::DateRange;

    /// Scanner that plays back a scripted sequence of results.
    struct ScriptedScanner {
        script: Mutex<VecDeque<Result<ScanOutcome, ScanError>>>,
        calls: AtomicU32,
    }

    impl ScriptedScanner {
        fn new(script: Vec<Result<ScanOutcome, ScanError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Scan for &ScriptedScanner {
        async fn scan(&self, _request: &ScanRequest) -> Result<ScanOutcome, ScanError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(empty_outcome()))
        }
    }

    /// Clock that counts sleeps and returns immediately.
    #[derive(Default)]
    struct CountingClock {
        sleeps: AtomicU32,
    }

    impl CountingClock {
        fn sleeps(&self) -> u32 {
            self.sleeps.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Clock for &CountingClock {
        async fn sleep(&self, _duration: Duration) {
            self.sleeps.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn empty_outcome() -> ScanOutcome {
        ScanOutcome::default()
    }

    fn available_outcome() -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        outcome.any_available = true;
        outcome.available_sites.insert("A".to_string());
        outcome
    }

    fn test_request() -> ScanRequest {
        ScanRequest::new(
            vec!["232447".to_string()],
            DateRange::parse("2021-03-06", "2021-03-08").unwrap(),
        )
    }

    #[tokio::test]
    async fn stops_on_first_available_scan() {
        let scanner = ScriptedScanner::new(vec![Ok(available_outcome())]);
        let clock = CountingClock::default();
        let (_tx, rx) = cancellation_channel();
        let mut poller = Poller::new(&scanner, &clock, PollerConfig::default(), rx);

        let outcome = poller.run(&test_request()).await.unwrap();

        assert!(matches!(outcome, PollOutcome::Available(_)));
        assert_eq!(scanner.calls(), 1);
        assert_eq!(clock.sleeps(), 0);
    }

    #[tokio::test]
    async fn retries_until_availability_appears() {
        // Two empty passes, then success: three scans, two delays.
        let scanner = ScriptedScanner::new(vec![
            Ok(empty_outcome()),
            Ok(empty_outcome()),
            Ok(available_outcome()),
        ]);
        let clock = CountingClock::default();
        let (_tx, rx) = cancellation_channel();
        let mut poller = Poller::new(&scanner, &clock, PollerConfig::default(), rx);

        let outcome = poller.run(&test_request()).await.unwrap();

        assert!(matches!(outcome, PollOutcome::Available(_)));
        assert_eq!(scanner.calls(), 3);
        assert_eq!(clock.sleeps(), 2);
    }

    #[tokio::test]
    async fn transient_errors_retry_like_empty_passes() {
        let scanner = ScriptedScanner::new(vec![
            Err(ScanError::Network("connection reset".to_string())),
            Ok(empty_outcome()),
            Ok(available_outcome()),
        ]);
        let clock = CountingClock::default();
        let (_tx, rx) = cancellation_channel();
        let mut poller = Poller::new(&scanner, &clock, PollerConfig::default(), rx);

        let outcome = poller.run(&test_request()).await.unwrap();

        assert!(matches!(outcome, PollOutcome::Available(_)));
        assert_eq!(scanner.calls(), 3);
        assert_eq!(clock.sleeps(), 2);
    }

    #[tokio::test]
    async fn fatal_errors_abort_the_loop() {
        let scanner = ScriptedScanner::new(vec![
            Err(ScanError::RequestFailed {
                status: 400,
                body: "bad request".to_string(),
            }),
            Ok(available_outcome()),
        ]);
        let clock = CountingClock::default();
        let (_tx, rx) = cancellation_channel();
        let mut poller = Poller::new(&scanner, &clock, PollerConfig::default(), rx);

        let result = poller.run(&test_request()).await;

        assert!(matches!(
            result,
            Err(ScanError::RequestFailed { status: 400, .. })
        ));
        assert_eq!(scanner.calls(), 1);
        assert_eq!(clock.sleeps(), 0);
    }

    #[tokio::test]
    async fn attempt_bound_is_honored() {
        let scanner = ScriptedScanner::new(vec![Ok(empty_outcome()), Ok(empty_outcome())]);
        let clock = CountingClock::default();
        let (_tx, rx) = cancellation_channel();
        let config = PollerConfig {
            max_attempts: Some(2),
            ..PollerConfig::default()
        };
        let mut poller = Poller::new(&scanner, &clock, config, rx);

        let outcome = poller.run(&test_request()).await.unwrap();

        assert!(matches!(outcome, PollOutcome::AttemptsExhausted));
        assert_eq!(scanner.calls(), 2);
        assert_eq!(clock.sleeps(), 1);
    }

    #[tokio::test]
    async fn cancellation_before_the_first_scan() {
        let scanner = ScriptedScanner::new(vec![Ok(available_outcome())]);
        let clock = CountingClock::default();
        let (tx, rx) = cancellation_channel();
        tx.send(true).unwrap();
        let mut poller = Poller::new(&scanner, &clock, PollerConfig::default(), rx);

        let outcome = poller.run(&test_request()).await.unwrap();

        assert!(matches!(outcome, PollOutcome::Cancelled));
        assert_eq!(scanner.calls(), 0);
    }

    #[tokio::test]
    async fn cancellation_during_the_delay() {
        /// Clock whose sleep never finishes, standing in for a real
        /// delay the test should not wait out.
        struct HangingClock;

        #[async_trait]
        impl Clock for HangingClock {
            async fn sleep(&self, _duration: Duration) {
                std::future::pending::<()>().await;
            }
        }

        let scanner = ScriptedScanner::new(vec![Ok(empty_outcome())]);
        let (tx, rx) = cancellation_channel();
        let mut poller = Poller::new(&scanner, HangingClock, PollerConfig::default(), rx);

        let request = test_request();
        let run = poller.run(&request);
        tokio::pin!(run);

        // Let the first scan and the delay start, then cancel.
        tokio::select! {
            biased;
            _ = &mut run => panic!("loop finished before cancellation"),
            () = tokio::task::yield_now() => {}
        }
        tx.send(true).unwrap();

        let outcome = run.await.unwrap();
        assert!(matches!(outcome, PollOutcome::Cancelled));
        assert_eq!(scanner.calls(), 1);
    }
}
