use std::fmt::{Debug, Formatter};
use std::sync::mpsc::{self, TrySendError};

use tracing::debug;

use crate::api::{Event, Routed, Target};

/// Returned by a surface that can no longer receive events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceGone;

/// Receiving end of one rendering surface.
pub trait Surface: Send {
    /// Delivers one state event. Events arrive in emission order.
    fn deliver(&mut self, event: Event) -> Result<(), SurfaceGone>;

    /// Offers one telemetry event. Implementations may drop it when busy.
    fn offer(&mut self, event: Event) -> Result<(), SurfaceGone> {
        self.deliver(event)
    }

    /// Tears the surface down. Called once when the surface is detached.
    fn close(&mut self) {}
}

/// Surface backed by a bounded channel.
///
/// State events block on a full queue so none are lost; telemetry is dropped
/// instead, which keeps the newest value flowing once the receiver catches
/// up.
#[derive(Debug, Clone)]
pub struct ChannelSurface {
    sender: mpsc::SyncSender<Event>,
}

impl ChannelSurface {
    pub fn new(sender: mpsc::SyncSender<Event>) -> Self {
        Self { sender }
    }
}

impl Surface for ChannelSurface {
    fn deliver(&mut self, event: Event) -> Result<(), SurfaceGone> {
        self.sender.send(event).map_err(|_| SurfaceGone)
    }

    fn offer(&mut self, event: Event) -> Result<(), SurfaceGone> {
        match self.sender.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                debug!("telemetry dropped: surface queue is full");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(SurfaceGone),
        }
    }
}

/// Routes coordinator events to the control and display surfaces.
///
/// A missing surface is normal (the display is opened and closed by the
/// operator) and silently drops its events.
#[derive(Default)]
pub struct Notifier {
    control: Option<Box<dyn Surface>>,
    display: Option<Box<dyn Surface>>,
}

impl Notifier {
    pub fn new(control: Box<dyn Surface>) -> Self {
        Self {
            control: Some(control),
            display: None,
        }
    }

    /// Attaches the display surface, closing any previous one.
    pub fn attach_display(&mut self, surface: Box<dyn Surface>) {
        if let Some(mut previous) = self.display.replace(surface) {
            previous.close();
        }
    }

    /// Detaches and closes the display surface. Returns false if none was attached.
    pub fn detach_display(&mut self) -> bool {
        match self.display.take() {
            Some(mut surface) => {
                surface.close();
                true
            }
            None => false,
        }
    }

    pub fn has_display(&self) -> bool {
        self.display.is_some()
    }

    pub fn has_control(&self) -> bool {
        self.control.is_some()
    }

    /// Sends one event to `target`.
    ///
    /// With [`Target::Both`] the display hears the event before control.
    pub fn notify(&mut self, event: Event, target: Target) {
        if target.includes_display() {
            deliver_to(&mut self.display, "display", event.clone());
        }
        if target.includes_control() {
            deliver_to(&mut self.control, "control", event);
        }
    }

    /// Sends every routed event in order.
    pub fn dispatch(&mut self, routed: &[Routed]) {
        for Routed { target, event } in routed {
            self.notify(event.clone(), *target);
        }
    }
}

impl Debug for Notifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("control", &self.control.is_some())
            .field("display", &self.display.is_some())
            .finish()
    }
}

fn deliver_to(slot: &mut Option<Box<dyn Surface>>, surface_name: &'static str, event: Event) {
    let Some(surface) = slot.as_mut() else {
        return;
    };

    let result = if event.is_telemetry() {
        surface.offer(event)
    } else {
        surface.deliver(event)
    };

    if result.is_err() {
        debug!(surface = surface_name, "surface disconnected; detaching");
        *slot = None;
    }
}
