//! Display-surface side of playback timing.
//!
//! The display surface owns the auto-advance timer and reports telemetry
//! back to the coordinator. [`DisplayDriver`] holds that logic without any
//! rendering so a real renderer, or the headless runner below, can host it.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, TrySendError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::api::{Command, Event, TimerProgress, VideoProgress};
use crate::coordinator::DisplayLauncher;
use crate::error::{EngineError, Result};
use crate::item::Item;
use crate::notifier::{ChannelSurface, Surface};
use crate::settings::Settings;

/// Interval between progress reports.
pub const PROGRESS_TICK: Duration = Duration::from_millis(100);
const DISPLAY_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AdvanceTimer {
    item_index: usize,
    started_at: Instant,
    total: Duration,
    fired: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct VideoClock {
    current_time: f64,
    duration: f64,
}

/// Timer and telemetry state of one display surface.
#[derive(Debug)]
pub struct DisplayDriver {
    items: Arc<[Item]>,
    settings: Settings,
    current: Option<usize>,
    playing: bool,
    video_playing: bool,
    fullscreen: bool,
    volume: f32,
    timer: Option<AdvanceTimer>,
    video: Option<VideoClock>,
}

impl Default for DisplayDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayDriver {
    pub fn new() -> Self {
        Self {
            items: Arc::from(Vec::new()),
            settings: Settings::default(),
            current: None,
            playing: false,
            video_playing: false,
            fullscreen: false,
            volume: 1.0,
            timer: None,
            video: None,
        }
    }

    /// Applies one coordinator event and returns the reports it causes.
    ///
    /// Every event that changes what is shown, or whether it plays, cancels
    /// the running auto-advance timer before a new one may start.
    pub fn apply(&mut self, event: &Event, now: Instant) -> Vec<Command> {
        match event {
            Event::Navigate { item } => {
                self.current = *item;
                self.video = None;
                self.video_playing = self.current_is_video()
                    && (self.playing || self.settings.auto_play_videos);
                self.restart_timer(now);
            }
            Event::PlayPause { playing } => {
                self.playing = *playing;
                if self.current_is_video() {
                    self.video_playing = *playing;
                }
                self.restart_timer(now);
            }
            Event::SettingsChanged(settings) => {
                let previous = std::mem::replace(&mut self.settings, *settings);
                if previous.auto_advance() != settings.auto_advance()
                    || previous.auto_play_videos != settings.auto_play_videos
                {
                    self.restart_timer(now);
                }
            }
            Event::FilesUpdated(items) => {
                self.items = Arc::clone(items);
                self.restart_timer(now);
            }
            Event::SeekVideo { seconds } => {
                if let Some(clock) = self.video.as_mut() {
                    clock.current_time = (*seconds).clamp(0.0, clock.duration);
                    return vec![Command::VideoProgress(VideoProgress {
                        current_time: clock.current_time,
                        duration: clock.duration,
                    })];
                }
                debug!(seconds, "seek ignored: no video position known");
            }
            Event::SetVolume { level } => {
                let volume = (*level).clamp(0.0, 1.0);
                if volume != self.volume {
                    debug!(from = self.volume, to = volume, "volume changed");
                    self.volume = volume;
                }
            }
            Event::ToggleFullscreen => {
                self.fullscreen = !self.fullscreen;
                return vec![Command::FullscreenChanged {
                    fullscreen: self.fullscreen,
                }];
            }
            _ => {}
        }
        Vec::new()
    }

    /// Advances the auto-advance timer to `now`.
    ///
    /// Reports progress while the timer runs and a single
    /// `PlaybackFinished` once the interval has elapsed.
    pub fn tick(&mut self, now: Instant) -> Vec<Command> {
        let Some(timer) = self.timer.as_mut() else {
            return Vec::new();
        };
        if timer.fired {
            return Vec::new();
        }

        let elapsed = now.saturating_duration_since(timer.started_at).min(timer.total);
        let mut reports = vec![Command::TimerProgress(TimerProgress {
            elapsed_ms: duration_ms(elapsed),
            total_ms: duration_ms(timer.total),
        })];
        if elapsed >= timer.total {
            timer.fired = true;
            reports.push(Command::PlaybackFinished {
                item_index: timer.item_index,
            });
        }
        reports
    }

    /// Records the renderer's playback position for the current video.
    pub fn report_video_position(&mut self, current_time: f64, duration: f64) -> Option<Command> {
        if !self.current_is_video() {
            return None;
        }
        let clock = VideoClock {
            current_time,
            duration,
        };
        self.video = Some(clock);
        Some(Command::VideoProgress(VideoProgress {
            current_time: clock.current_time,
            duration: clock.duration,
        }))
    }

    /// Called by the renderer when the current video reached its end.
    pub fn video_ended(&mut self) -> Option<Command> {
        let item_index = self.current.filter(|_| self.current_is_video())?;
        self.video_playing = false;
        if !self.playing {
            return None;
        }
        Some(Command::PlaybackFinished { item_index })
    }

    pub fn current_item(&self) -> Option<&Item> {
        self.current.and_then(|index| self.items.get(index))
    }

    pub fn current_item_index(&self) -> Option<usize> {
        self.current
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_video_playing(&self) -> bool {
        self.video_playing
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Item the running auto-advance timer belongs to.
    pub fn timer_item(&self) -> Option<usize> {
        self.timer
            .filter(|timer| !timer.fired)
            .map(|timer| timer.item_index)
    }

    fn current_is_video(&self) -> bool {
        self.current_item().is_some_and(Item::is_video)
    }

    fn restart_timer(&mut self, now: Instant) {
        self.timer = None;
        if !self.playing || self.current_is_video() {
            return;
        }
        let (Some(item_index), Some(total)) = (self.current, self.settings.auto_advance()) else {
            return;
        };
        self.timer = Some(AdvanceTimer {
            item_index,
            started_at: now,
            total,
            fired: false,
        });
    }
}

/// Starts a headless display surface on its own thread.
///
/// The surface reports `DisplayReady` through `reports` right away, then
/// ticks its timers every [`PROGRESS_TICK`]. Dropping the returned surface
/// stops the thread.
pub fn spawn_headless_display(reports: mpsc::SyncSender<Command>) -> Result<ChannelSurface> {
    let (event_tx, event_rx) = mpsc::sync_channel::<Event>(DISPLAY_EVENT_CAPACITY);
    thread::Builder::new()
        .name(String::from("headless-display"))
        .spawn(move || run_headless_display(event_rx, reports))
        .map_err(|error| EngineError::DisplayLaunch {
            reason: error.to_string(),
        })?;
    Ok(ChannelSurface::new(event_tx))
}

/// Launches a [`spawn_headless_display`] surface for every `Open`.
#[derive(Debug, Clone)]
pub struct HeadlessDisplayLauncher {
    reports: mpsc::SyncSender<Command>,
}

impl HeadlessDisplayLauncher {
    pub fn new(reports: mpsc::SyncSender<Command>) -> Self {
        Self { reports }
    }
}

impl DisplayLauncher for HeadlessDisplayLauncher {
    fn launch(&mut self) -> Result<Box<dyn Surface>> {
        let surface = spawn_headless_display(self.reports.clone())?;
        Ok(Box::new(surface))
    }
}

fn run_headless_display(events: mpsc::Receiver<Event>, reports: mpsc::SyncSender<Command>) {
    let mut driver = DisplayDriver::new();
    let mut outbox = ReportOutbox::default();
    outbox.push(Command::DisplayReady);

    loop {
        match events.recv_timeout(PROGRESS_TICK) {
            Ok(event) => {
                if let Event::Navigate { item } = event {
                    info!(item = ?item, "display showing item");
                }
                let now = Instant::now();
                outbox.extend(driver.apply(&event, now));
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("display surface closed by coordinator");
                return;
            }
        }

        outbox.extend(driver.tick(Instant::now()));
        if outbox.flush(&reports).is_err() {
            debug!("coordinator gone; stopping headless display");
            return;
        }
    }
}

/// Reports waiting to be sent without blocking the display thread.
///
/// Telemetry that does not fit is dropped; every other report is kept for
/// the next flush.
#[derive(Debug, Default)]
struct ReportOutbox {
    pending: VecDeque<Command>,
}

impl ReportOutbox {
    fn push(&mut self, report: Command) {
        self.pending.push_back(report);
    }

    fn extend(&mut self, reports: Vec<Command>) {
        self.pending.extend(reports);
    }

    fn flush(&mut self, reports: &mpsc::SyncSender<Command>) -> std::result::Result<(), ()> {
        while let Some(report) = self.pending.pop_front() {
            match reports.try_send(report) {
                Ok(()) => {}
                Err(TrySendError::Full(report)) => {
                    if !is_telemetry(&report) {
                        self.pending.push_front(report);
                        self.pending.retain(|pending| !is_telemetry(pending));
                        return Ok(());
                    }
                }
                Err(TrySendError::Disconnected(_)) => return Err(()),
            }
        }
        Ok(())
    }
}

fn is_telemetry(report: &Command) -> bool {
    matches!(
        report,
        Command::VideoProgress(_) | Command::TimerProgress(_)
    )
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
