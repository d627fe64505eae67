use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::Rng;
use tracing::{debug, info};

use crate::api::{Command, Direction, EngineErrorEvent, Event, Routed, Target};
use crate::error::{EngineError, Result};
use crate::item::Item;
use crate::navigation::{self, Transition};
use crate::notifier::{Notifier, Surface};
use crate::session::Session;
use crate::settings::Settings;

/// Creates display surfaces on demand.
pub trait DisplayLauncher {
    /// Launches a new display surface.
    ///
    /// The surface signals readiness later by sending
    /// [`Command::DisplayReady`] back to the coordinator.
    fn launch(&mut self) -> Result<Box<dyn Surface>>;
}

/// Lifecycle of the display surface as seen by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Absent,
    Opening,
    Ready,
}

/// Owns the projector session and keeps both surfaces in step with it.
///
/// Commands are applied one at a time; each either produces a new session
/// and the events announcing it, or fails and leaves everything untouched.
#[derive(Debug)]
pub struct Coordinator<L, R = SmallRng> {
    launcher: L,
    rng: R,
    notifier: Notifier,
    items: Arc<[Item]>,
    settings: Settings,
    session: Option<Session>,
    display: DisplayState,
    autoplay_on_ready: bool,
}

impl<L, R> Coordinator<L, R>
where
    L: DisplayLauncher,
    R: Rng,
{
    /// Creates a coordinator delivering control-surface events to `control`.
    ///
    /// # Example
    /// ```
    /// use engine::{Coordinator, DisplayLauncher, Result, Surface, SurfaceGone, Event};
    /// use rand::SeedableRng;
    /// use rand::rngs::SmallRng;
    ///
    /// struct Discard;
    /// impl Surface for Discard {
    ///     fn deliver(&mut self, _event: Event) -> std::result::Result<(), SurfaceGone> {
    ///         Ok(())
    ///     }
    /// }
    ///
    /// struct Launcher;
    /// impl DisplayLauncher for Launcher {
    ///     fn launch(&mut self) -> Result<Box<dyn Surface>> {
    ///         Ok(Box::new(Discard))
    ///     }
    /// }
    ///
    /// let coordinator = Coordinator::new(Launcher, Box::new(Discard), SmallRng::seed_from_u64(1));
    /// assert!(coordinator.session().is_none());
    /// ```
    pub fn new(launcher: L, control: Box<dyn Surface>, rng: R) -> Self {
        Self {
            launcher,
            rng,
            notifier: Notifier::new(control),
            items: Arc::from(Vec::new()),
            settings: Settings::default(),
            session: None,
            display: DisplayState::Absent,
            autoplay_on_ready: false,
        }
    }

    /// Applies one command, delivers the resulting events and returns them.
    pub fn handle_command(&mut self, command: Command) -> Result<Vec<Routed>> {
        let mut routed = match command {
            Command::Open { items, settings } => self.open(items.into(), settings)?,
            Command::Close | Command::DisplayClosed => self.close(),
            Command::Advance(direction) => self.advance(direction)?,
            Command::JumpTo { item_index } => self.jump_to(item_index)?,
            Command::TogglePlayPause => self.toggle_play_pause()?,
            Command::ReplaceItems { items } => self.replace_items(items.into()),
            Command::UpdateSettings(settings) => self.update_settings(settings),
            Command::SeekVideo { seconds } => vec![Routed::display(Event::SeekVideo { seconds })],
            Command::SetVolume { level } => vec![Routed::display(Event::SetVolume { level })],
            Command::ToggleFullscreen => vec![Routed::display(Event::ToggleFullscreen)],
            Command::DisplayReady => self.display_ready(),
            Command::PlaybackFinished { item_index } => self.playback_finished(item_index),
            Command::VideoProgress(progress) => {
                vec![Routed::control(Event::VideoProgress(progress))]
            }
            Command::TimerProgress(progress) => {
                vec![Routed::control(Event::TimerProgress(progress))]
            }
            Command::FullscreenChanged { fullscreen } => {
                vec![Routed::control(Event::FullscreenChanged { fullscreen })]
            }
        };

        self.notifier.dispatch(&routed);
        if self.display != DisplayState::Absent && !self.notifier.has_display() {
            info!("display surface lost; keeping paper session");
            self.display = DisplayState::Absent;
            let lost = Routed::control(Event::DisplayStatus { open: false });
            self.notifier.dispatch(std::slice::from_ref(&lost));
            routed.push(lost);
        }
        Ok(routed)
    }

    /// Reports a failed command to the control surface.
    pub fn report_error(&mut self, error: &EngineError) {
        info!(%error, "command rejected");
        self.notifier.notify(
            Event::Error(EngineErrorEvent::from_error(error)),
            Target::Control,
        );
    }

    /// Returns false once the control surface stopped accepting events.
    pub fn has_control(&self) -> bool {
        self.notifier.has_control()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn display_state(&self) -> DisplayState {
        self.display
    }

    /// Settings retained for the next session.
    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Items retained for the next session.
    pub fn items(&self) -> &Arc<[Item]> {
        &self.items
    }

    fn open(&mut self, items: Arc<[Item]>, settings: Settings) -> Result<Vec<Routed>> {
        if self.display != DisplayState::Absent {
            return self.resync(items, settings);
        }

        let surface = self.launcher.launch()?;
        self.notifier.attach_display(surface);
        self.display = DisplayState::Opening;

        match self.session.take() {
            Some(paper) => {
                // The new surface learns the session from `display_ready`.
                let resynced = self.resynced_session(&paper, items, settings);
                debug_assert!(resynced.session.invariants_hold());
                self.session = Some(resynced.session);
                self.autoplay_on_ready = false;
            }
            None => {
                self.items = Arc::clone(&items);
                self.settings = settings.normalized();
                self.session = Some(Session::start(items, self.settings, &mut self.rng));
                self.autoplay_on_ready = true;
            }
        }

        info!(
            item_count = self.items.len(),
            loop_playback = self.settings.loop_playback,
            shuffle = self.settings.shuffle(),
            "display surface launched"
        );
        Ok(vec![Routed::control(Event::DisplayStatus { open: true })])
    }

    fn resync(&mut self, items: Arc<[Item]>, settings: Settings) -> Result<Vec<Routed>> {
        let session = self.session.take().ok_or(EngineError::NoSession)?;
        let resynced = self.resynced_session(&session, items, settings);
        debug!(
            item_count = self.items.len(),
            "display surface re-synchronized in place"
        );
        Ok(self.commit(resynced))
    }

    fn resynced_session(
        &mut self,
        session: &Session,
        items: Arc<[Item]>,
        settings: Settings,
    ) -> Transition {
        self.settings = settings.normalized();
        let configured = navigation::update_settings(session, settings, &mut self.rng);
        let mut events = configured.events;

        let session = if configured.session.items()[..] != items[..] {
            self.items = Arc::clone(&items);
            let replaced = navigation::replace_items(&configured.session, items, &mut self.rng);
            events.extend(replaced.events);
            replaced.session
        } else {
            events.push(navigation::announce(&configured.session));
            configured.session
        };

        Transition { session, events }
    }

    fn display_ready(&mut self) -> Vec<Routed> {
        if self.display != DisplayState::Opening {
            debug!(state = ?self.display, "ignoring display ready outside of opening");
            return Vec::new();
        }
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        self.display = DisplayState::Ready;

        let mut events = vec![
            Routed::display(Event::FilesUpdated(Arc::clone(session.items()))),
            Routed::display(Event::SettingsChanged(session.settings())),
            navigation::announce(session),
        ];

        let autoplay = std::mem::take(&mut self.autoplay_on_ready);
        if session.is_playing() {
            events.push(Routed::both(Event::PlayPause { playing: true }));
        } else if autoplay && session.settings().auto_advance().is_some() && !session.is_background() {
            let started = navigation::toggle_play_pause(session);
            events.extend(started.events);
            self.session = Some(started.session);
        }

        info!(
            current_item = ?self.session.as_ref().and_then(Session::current_item_index),
            "display surface ready"
        );
        events
    }

    fn close(&mut self) -> Vec<Routed> {
        let had_display = self.notifier.detach_display();
        let had_session = self.session.take().is_some();
        self.display = DisplayState::Absent;
        self.autoplay_on_ready = false;

        if !had_display && !had_session {
            return Vec::new();
        }

        info!("display surface closed; session ended");
        vec![
            Routed::control(Event::PlayPause { playing: false }),
            Routed::control(Event::Navigate { item: None }),
            Routed::control(Event::DisplayStatus { open: false }),
        ]
    }

    fn advance(&mut self, direction: Direction) -> Result<Vec<Routed>> {
        let session = self.session.as_ref().ok_or(EngineError::NoSession)?;
        let transition = navigation::advance(session, direction);
        info!(
            ?direction,
            current_item = ?transition.session.current_item_index(),
            "advanced"
        );
        Ok(self.commit(transition))
    }

    fn jump_to(&mut self, item_index: usize) -> Result<Vec<Routed>> {
        if self.display == DisplayState::Absent {
            return Err(EngineError::NoDisplaySurface);
        }
        let session = self.session.as_ref().ok_or(EngineError::NoSession)?;
        let transition = navigation::jump_to(session, item_index)?;
        info!(item_index, "jumped to item");
        Ok(self.commit(transition))
    }

    fn toggle_play_pause(&mut self) -> Result<Vec<Routed>> {
        let session = self.session.as_ref().ok_or(EngineError::NoSession)?;
        let transition = navigation::toggle_play_pause(session);
        info!(playing = transition.session.is_playing(), "play state toggled");
        Ok(self.commit(transition))
    }

    fn replace_items(&mut self, items: Arc<[Item]>) -> Vec<Routed> {
        self.items = Arc::clone(&items);
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        let transition = navigation::replace_items(session, items, &mut self.rng);
        info!(item_count = self.items.len(), "items replaced");
        self.commit(transition)
    }

    fn update_settings(&mut self, settings: Settings) -> Vec<Routed> {
        self.settings = settings.normalized();
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        let transition = navigation::update_settings(session, settings, &mut self.rng);
        self.commit(transition)
    }

    fn playback_finished(&mut self, item_index: usize) -> Vec<Routed> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        if !session.is_playing() || session.current_item_index() != Some(item_index) {
            debug!(
                item_index,
                current_item = ?session.current_item_index(),
                playing = session.is_playing(),
                "ignoring stale playback finished report"
            );
            return Vec::new();
        }
        let transition = navigation::advance(session, Direction::Next);
        self.commit(transition)
    }

    fn commit(&mut self, transition: Transition) -> Vec<Routed> {
        debug_assert!(transition.session.invariants_hold());
        self.session = Some(transition.session);
        transition.events
    }
}
