use std::path::PathBuf;

use async_trait::async_trait;
use campground_scan::{DateRange, ScanOutcome};
use tracing::info;

use crate::service::{Notifier, NotifyError, run_command};

/// Hard ceiling on alert repetitions, whatever the configuration says.
pub const MAX_SOUND_REPEATS: u32 = 10;

#[cfg(target_os = "macos")]
const DEFAULT_PLAYER: &str = "afplay";
#[cfg(not(target_os = "macos"))]
const DEFAULT_PLAYER: &str = "aplay";

/// Plays a local sound asset a bounded number of times through the
/// platform's command-line audio player.
pub struct SoundNotifier {
    player: String,
    asset: PathBuf,
    repeats: u32,
}

impl SoundNotifier {
    /// Creates a notifier playing `asset` up to `repeats` times
    /// (clamped to [`MAX_SOUND_REPEATS`]).
    pub fn new(asset: PathBuf, repeats: u32) -> Self {
        Self {
            player: DEFAULT_PLAYER.to_string(),
            asset,
            repeats: repeats.min(MAX_SOUND_REPEATS),
        }
    }

    /// Overrides the player program.
    pub fn with_player(mut self, player: String) -> Self {
        self.player = player;
        self
    }

    /// How many times the alert will play.
    pub fn repeats(&self) -> u32 {
        self.repeats
    }
}

#[async_trait]
impl Notifier for SoundNotifier {
    async fn notify(&self, _outcome: &ScanOutcome, _range: &DateRange) -> Result<(), NotifyError> {
        let asset = self.asset.to_string_lossy().into_owned();
        info!("Playing {} {} time(s)", asset, self.repeats);
        for _ in 0..self.repeats {
            run_command(&self.player, std::slice::from_ref(&asset)).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeats_are_clamped_to_the_ceiling() {
        let notifier = SoundNotifier::new(PathBuf::from("alert.wav"), 100);
        assert_eq!(notifier.repeats(), MAX_SOUND_REPEATS);
    }

    #[test]
    fn zero_repeats_is_allowed() {
        let notifier = SoundNotifier::new(PathBuf::from("alert.wav"), 0);
        assert_eq!(notifier.repeats(), 0);
    }
}
