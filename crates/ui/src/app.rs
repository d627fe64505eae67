use std::path::Path;
use std::sync::mpsc::TrySendError;
use std::time::Instant;

use engine::config::load_playlist;
use engine::{Command, CommandSender, Direction, Event, Item, SeekTracker, Settings, TimerProgress};
use iced::widget::{button, checkbox, column, row, slider, text, text_input};
use iced::{Element, Length, Subscription, Task};

use crate::bridge::{BridgeEvent, coordinator_subscription};
use crate::widgets::{item_list, seek_bar};

/// UI messages handled by the iced app update loop.
#[derive(Debug, Clone)]
pub enum Message {
    PlaylistPathChanged(String),
    LoadPressed,
    OpenPressed,
    ClosePressed,
    PreviousPressed,
    NextPressed,
    PlayPausePressed,
    LoopToggled(bool),
    RandomToggled(bool),
    AutoAdvanceToggled(bool),
    ItemSelected(usize),
    SeekRequested(f64),
    VolumeChanged(f32),
    FullscreenPressed,
    Bridge(BridgeEvent),
}

/// Control-surface state of the operator panel.
pub struct AppState {
    engine_tx: Option<CommandSender>,
    playlist_path: String,
    items: Vec<Item>,
    settings: Settings,
    display_open: bool,
    current_item: Option<usize>,
    playing: bool,
    fullscreen: bool,
    volume: f32,
    timer: Option<TimerProgress>,
    seek: SeekTracker,
    status: String,
}

impl AppState {
    /// Boots the app; the coordinator bridge arrives through the subscription.
    pub fn boot() -> (Self, Task<Message>) {
        (Self::with_status("starting coordinator"), Task::none())
    }

    fn with_status(status: &str) -> Self {
        Self {
            engine_tx: None,
            playlist_path: String::new(),
            items: Vec::new(),
            settings: Settings::default(),
            display_open: false,
            current_item: None,
            playing: false,
            fullscreen: false,
            volume: 1.0,
            timer: None,
            seek: SeekTracker::new(),
            status: String::from(status),
        }
    }

    /// Handles one UI message.
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PlaylistPathChanged(path) => {
                self.playlist_path = path;
            }
            Message::LoadPressed => self.load_playlist(),
            Message::OpenPressed => {
                if self.send_command(Command::Open {
                    items: self.items.clone(),
                    settings: self.settings,
                }) {
                    self.status = String::from("opening display");
                }
            }
            Message::ClosePressed => {
                self.send_command(Command::Close);
            }
            Message::PreviousPressed => {
                self.send_command(Command::Advance(Direction::Previous));
            }
            Message::NextPressed => {
                self.send_command(Command::Advance(Direction::Next));
            }
            Message::PlayPausePressed => {
                self.send_command(Command::TogglePlayPause);
            }
            Message::LoopToggled(enabled) => {
                self.settings.loop_playback = enabled;
                self.push_settings();
            }
            Message::RandomToggled(enabled) => {
                self.settings.random = enabled;
                self.push_settings();
            }
            Message::AutoAdvanceToggled(enabled) => {
                self.settings.enable_auto_advance = enabled;
                self.push_settings();
            }
            Message::ItemSelected(item_index) => {
                self.send_command(Command::JumpTo { item_index });
            }
            Message::SeekRequested(seconds) => {
                let seconds = self.seek.request(seconds, Instant::now());
                self.send_command(Command::SeekVideo { seconds });
            }
            Message::VolumeChanged(level) => {
                self.volume = level;
                self.send_command(Command::SetVolume { level });
            }
            Message::FullscreenPressed => {
                self.send_command(Command::ToggleFullscreen);
            }
            Message::Bridge(BridgeEvent::Ready(sender)) => {
                self.engine_tx = Some(sender);
                self.status = String::from("coordinator ready");
            }
            Message::Bridge(BridgeEvent::Event(event)) => {
                self.apply_engine_event(event);
            }
            Message::Bridge(BridgeEvent::Disconnected) => {
                self.status = String::from("coordinator event channel closed");
                self.engine_tx = None;
                self.display_open = false;
            }
        }

        Task::none()
    }

    fn send_command(&mut self, command: Command) -> bool {
        if let Some(sender) = &self.engine_tx {
            match sender.try_send(command) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    self.status = String::from("coordinator command queue is full");
                    false
                }
                Err(TrySendError::Disconnected(_)) => {
                    self.status = String::from("coordinator command channel closed");
                    self.engine_tx = None;
                    false
                }
            }
        } else {
            self.status = String::from("coordinator is not ready");
            false
        }
    }

    fn load_playlist(&mut self) {
        let path = self.playlist_path.trim().to_owned();
        if path.is_empty() {
            self.status = String::from("playlist path is empty");
            return;
        }

        match load_playlist(Path::new(&path)) {
            Ok(items) => {
                self.status = format!("loaded {} items from {path}", items.len());
                self.items = items;
                self.send_command(Command::ReplaceItems {
                    items: self.items.clone(),
                });
            }
            Err(error) => {
                self.status = format!("error: {error}");
            }
        }
    }

    fn push_settings(&mut self) {
        self.settings = self.settings.normalized();
        self.send_command(Command::UpdateSettings(self.settings));
    }

    fn apply_engine_event(&mut self, event: Event) {
        match event {
            Event::Navigate { item } => {
                self.current_item = item;
                self.timer = None;
                self.seek.reset();
            }
            Event::PlayPause { playing } => {
                self.playing = playing;
            }
            Event::FullscreenChanged { fullscreen } => {
                self.fullscreen = fullscreen;
            }
            Event::VideoProgress(progress) => {
                self.seek.observe(progress, Instant::now());
            }
            Event::TimerProgress(progress) => {
                self.timer = Some(progress);
            }
            Event::DisplayStatus { open } => {
                self.display_open = open;
                self.status = String::from(if open {
                    "display open"
                } else {
                    "display closed"
                });
                // Position and play state still follow the session; only
                // display telemetry stops.
                if !open {
                    self.timer = None;
                    self.seek.reset();
                }
            }
            Event::Error(error) => {
                self.status = format!("error: {}", error.message);
            }
            Event::SettingsChanged(_)
            | Event::FilesUpdated(_)
            | Event::SeekVideo { .. }
            | Event::SetVolume { .. }
            | Event::ToggleFullscreen => {}
        }
    }

    fn current(&self) -> Option<&Item> {
        self.current_item.and_then(|index| self.items.get(index))
    }

    fn progress_row(&self) -> Element<'_, Message> {
        let now = Instant::now();
        match (self.current(), self.timer) {
            (Some(item), _) if item.is_video() => {
                let position = self.seek.displayed_time(now).unwrap_or(0.0);
                let duration = self.seek.duration().unwrap_or(0.0);
                column![
                    seek_bar::view(position, duration, Some(Message::SeekRequested)),
                    text(format!("Video: {position:.1} s / {duration:.1} s")),
                ]
                .spacing(6)
                .into()
            }
            (_, Some(timer)) => column![
                seek_bar::view(timer.elapsed_ms as f64, timer.total_ms as f64, None),
                text(format!(
                    "Timer: {:.1} s / {:.1} s",
                    timer.elapsed_ms as f64 / 1_000.0,
                    timer.total_ms as f64 / 1_000.0
                )),
            ]
            .spacing(6)
            .into(),
            _ => text("Timer: idle").into(),
        }
    }

    /// Renders the UI tree.
    pub fn view(&self) -> Element<'_, Message> {
        let playlist_row = row![
            text_input("playlist.json", &self.playlist_path).on_input(Message::PlaylistPathChanged),
            button("Load").on_press(Message::LoadPressed),
            if self.display_open {
                button("Close display").on_press(Message::ClosePressed)
            } else {
                button("Open display").on_press(Message::OpenPressed)
            },
        ]
        .spacing(12);

        let transport_row = row![
            button("Previous").on_press(Message::PreviousPressed),
            button(if self.playing { "Pause" } else { "Play" }).on_press(Message::PlayPausePressed),
            button("Next").on_press(Message::NextPressed),
            button(if self.fullscreen {
                "Leave fullscreen"
            } else {
                "Fullscreen"
            })
            .on_press_maybe(self.display_open.then_some(Message::FullscreenPressed)),
        ]
        .spacing(12);

        let settings_row = row![
            checkbox("Loop", self.settings.loop_playback).on_toggle(Message::LoopToggled),
            checkbox("Random", self.settings.random)
                .on_toggle_maybe(self.settings.loop_playback.then_some(Message::RandomToggled)),
            checkbox("Auto-advance", self.settings.enable_auto_advance)
                .on_toggle(Message::AutoAdvanceToggled),
            text(format!("Volume {:.0}%", self.volume * 100.0)),
            slider(0.0..=1.0, self.volume, Message::VolumeChanged).step(0.05_f32),
        ]
        .spacing(12);

        let showing = match self.current() {
            Some(item) => format!("Showing: {}", item.id),
            None => String::from("Showing: background"),
        };

        column![
            playlist_row,
            transport_row,
            settings_row,
            text(showing),
            self.progress_row(),
            item_list::view(
                &self.items,
                self.current_item,
                self.display_open.then_some(Message::ItemSelected as fn(usize) -> Message),
            ),
            text(format!("Status: {}", self.status)),
        ]
        .spacing(12)
        .padding(16)
        .width(Length::Fill)
        .into()
    }

    /// Subscribes to bridge events emitted by the coordinator thread.
    pub fn subscription(&self) -> Subscription<Message> {
        coordinator_subscription().map(Message::Bridge)
    }

    #[cfg(test)]
    fn from_sender_for_test(engine_tx: CommandSender) -> Self {
        Self {
            engine_tx: Some(engine_tx),
            ..Self::with_status("idle")
        }
    }
}
