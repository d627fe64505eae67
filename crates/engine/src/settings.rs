use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Interval used when auto-advance is enabled without an explicit value.
pub const DEFAULT_AUTO_ADVANCE_INTERVAL_MS: u64 = 5_000;

/// Playback settings shared by the control and display surfaces.
///
/// `random` is the raw shuffle request. Shuffling only makes sense while
/// looping, so the coordinator always works with [`Settings::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    #[serde(rename = "loop")]
    pub loop_playback: bool,
    pub random: bool,
    pub enable_auto_advance: bool,
    pub auto_advance_interval_ms: u64,
    pub auto_play_videos: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            loop_playback: false,
            random: false,
            enable_auto_advance: false,
            auto_advance_interval_ms: DEFAULT_AUTO_ADVANCE_INTERVAL_MS,
            auto_play_videos: true,
        }
    }
}

impl Settings {
    /// Returns a copy with `random` cleared unless looping is on.
    ///
    /// # Example
    /// ```
    /// use engine::Settings;
    ///
    /// let requested = Settings {
    ///     loop_playback: false,
    ///     random: true,
    ///     ..Settings::default()
    /// };
    /// assert!(!requested.normalized().random);
    /// ```
    pub fn normalized(self) -> Self {
        Self {
            random: self.loop_playback && self.random,
            ..self
        }
    }

    /// Effective shuffle flag after normalization.
    pub fn shuffle(&self) -> bool {
        self.normalized().random
    }

    /// Auto-advance interval, or `None` when auto-advance is disabled.
    pub fn auto_advance(&self) -> Option<Duration> {
        if !self.enable_auto_advance || self.auto_advance_interval_ms == 0 {
            return None;
        }
        Some(Duration::from_millis(self.auto_advance_interval_ms))
    }
}
