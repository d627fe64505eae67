use std::sync::Arc;

use crate::error::EngineError;
use crate::item::Item;
use crate::settings::Settings;

/// Direction of one navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Commands accepted by the coordinator.
///
/// The first group is issued by the control surface, the second group is
/// reported by the display surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Opens the display surface, or re-synchronizes it when already open.
    ///
    /// # Example
    /// ```
    /// use engine::{Command, Item, ItemKind, Settings};
    ///
    /// let command = Command::Open {
    ///     items: vec![Item::new("a", ItemKind::Image, "a.png")],
    ///     settings: Settings::default(),
    /// };
    /// assert!(matches!(command, Command::Open { .. }));
    /// ```
    Open {
        items: Vec<Item>,
        settings: Settings,
    },
    Close,
    Advance(Direction),
    /// Jumps to the item at `item_index` in the item list (not the order).
    JumpTo {
        item_index: usize,
    },
    TogglePlayPause,
    /// Replaces the whole item list. Deltas are never sent.
    ReplaceItems {
        items: Vec<Item>,
    },
    UpdateSettings(Settings),
    /// Forwarded verbatim to the display surface.
    SeekVideo {
        seconds: f64,
    },
    /// Forwarded verbatim to the display surface.
    SetVolume {
        level: f32,
    },
    /// Forwarded verbatim to the display surface.
    ToggleFullscreen,

    DisplayReady,
    DisplayClosed,
    /// The item shown by the display finished its timer or video.
    PlaybackFinished {
        item_index: usize,
    },
    VideoProgress(VideoProgress),
    TimerProgress(TimerProgress),
    FullscreenChanged {
        fullscreen: bool,
    },
}

/// Playback position of the video currently on the display surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoProgress {
    pub current_time: f64,
    pub duration: f64,
}

/// Elapsed time of the auto-advance timer on a non-video item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerProgress {
    pub elapsed_ms: u64,
    pub total_ms: u64,
}

/// Events emitted by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Item index to show, `None` for the background.
    Navigate {
        item: Option<usize>,
    },
    PlayPause {
        playing: bool,
    },
    SettingsChanged(Settings),
    FilesUpdated(Arc<[Item]>),
    FullscreenChanged {
        fullscreen: bool,
    },
    VideoProgress(VideoProgress),
    TimerProgress(TimerProgress),
    SeekVideo {
        seconds: f64,
    },
    SetVolume {
        level: f32,
    },
    ToggleFullscreen,
    DisplayStatus {
        open: bool,
    },
    Error(EngineErrorEvent),
}

impl Event {
    /// Returns true for lossy playback telemetry.
    pub fn is_telemetry(&self) -> bool {
        matches!(self, Self::VideoProgress(_) | Self::TimerProgress(_))
    }
}

/// Surface(s) an event is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Control,
    Display,
    Both,
}

impl Target {
    pub fn includes_control(self) -> bool {
        matches!(self, Self::Control | Self::Both)
    }

    pub fn includes_display(self) -> bool {
        matches!(self, Self::Display | Self::Both)
    }
}

/// One event together with its delivery target.
#[derive(Debug, Clone, PartialEq)]
pub struct Routed {
    pub target: Target,
    pub event: Event,
}

impl Routed {
    pub fn both(event: Event) -> Self {
        Self {
            target: Target::Both,
            event,
        }
    }

    pub fn control(event: Event) -> Self {
        Self {
            target: Target::Control,
            event,
        }
    }

    pub fn display(event: Event) -> Self {
        Self {
            target: Target::Display,
            event,
        }
    }
}

/// User-facing error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    InvalidCommand,
    DisplayLaunch,
    Other,
}

impl From<&EngineError> for EngineErrorKind {
    fn from(value: &EngineError) -> Self {
        match value {
            error if error.is_invalid_command() => Self::InvalidCommand,
            EngineError::DisplayLaunch { .. } => Self::DisplayLaunch,
            _ => Self::Other,
        }
    }
}

/// User-facing error payload emitted as an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineErrorEvent {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineErrorEvent {
    pub fn from_error(error: &EngineError) -> Self {
        Self {
            kind: EngineErrorKind::from(error),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineErrorEvent, EngineErrorKind, Event, Target, TimerProgress};
    use crate::error::EngineError;

    #[test]
    fn stale_jump_maps_to_invalid_command_kind() {
        let event = EngineErrorEvent::from_error(&EngineError::ItemNotInOrder { item_index: 4 });

        assert_eq!(event.kind, EngineErrorKind::InvalidCommand);
        assert!(event.message.contains("item 4"));
    }

    #[test]
    fn launch_failure_maps_to_display_launch_kind() {
        let event = EngineErrorEvent::from_error(&EngineError::DisplayLaunch {
            reason: String::from("no monitor"),
        });

        assert_eq!(event.kind, EngineErrorKind::DisplayLaunch);
    }

    #[test]
    fn both_target_includes_each_surface() {
        assert!(Target::Both.includes_control());
        assert!(Target::Both.includes_display());
        assert!(!Target::Display.includes_control());
        assert!(!Target::Control.includes_display());
    }

    #[test]
    fn only_progress_events_are_telemetry() {
        let timer = Event::TimerProgress(TimerProgress {
            elapsed_ms: 100,
            total_ms: 5_000,
        });

        assert!(timer.is_telemetry());
        assert!(!Event::Navigate { item: None }.is_telemetry());
    }
}
