use std::time::{Duration, Instant};

use crate::api::VideoProgress;

/// Distance from the requested target within which a progress report
/// confirms a seek.
pub const SEEK_CONFIRM_TOLERANCE_SECONDS: f64 = 0.5;

/// Age after which an unconfirmed seek is abandoned.
pub const SEEK_CONFIRM_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingSeek {
    target: f64,
    requested_at: Instant,
}

impl PendingSeek {
    fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.requested_at) > SEEK_CONFIRM_TIMEOUT
    }
}

/// Keeps a control surface's video position steady across a seek.
///
/// Progress reports emitted before the display applied the seek would make
/// the position jump back; they are ignored until one lands near the
/// requested target or the request times out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeekTracker {
    pending: Option<PendingSeek>,
    reported: Option<VideoProgress>,
}

impl SeekTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a seek request and returns the target to send to the display.
    pub fn request(&mut self, target: f64, now: Instant) -> f64 {
        let target = target.max(0.0);
        self.pending = Some(PendingSeek {
            target,
            requested_at: now,
        });
        target
    }

    /// Feeds one `VideoProgress` report from the display.
    pub fn observe(&mut self, progress: VideoProgress, now: Instant) {
        self.expire(now);
        if let Some(pending) = self.pending {
            if (progress.current_time - pending.target).abs() > SEEK_CONFIRM_TOLERANCE_SECONDS {
                return;
            }
            self.pending = None;
        }
        self.reported = Some(progress);
    }

    /// Position the control surface should show, in seconds.
    pub fn displayed_time(&self, now: Instant) -> Option<f64> {
        match self.pending {
            Some(pending) if !pending.expired(now) => Some(pending.target),
            _ => self.reported.map(|progress| progress.current_time),
        }
    }

    /// Duration of the video last reported, in seconds.
    pub fn duration(&self) -> Option<f64> {
        self.reported.map(|progress| progress.duration)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Forgets everything; used when the display moves to another item.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn expire(&mut self, now: Instant) {
        if self.pending.is_some_and(|pending| pending.expired(now)) {
            self.pending = None;
        }
    }
}
