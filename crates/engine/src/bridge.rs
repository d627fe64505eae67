//! Runs a [`Coordinator`] on its own thread behind bounded channels.

use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::debug;

use crate::api::{Command, Event};
use crate::coordinator::{Coordinator, DisplayLauncher};
use crate::display::HeadlessDisplayLauncher;
use crate::notifier::ChannelSurface;

pub const COMMAND_CHANNEL_CAPACITY: usize = 32;
pub const EVENT_CHANNEL_CAPACITY: usize = 32;
const REPORT_CHANNEL_CAPACITY: usize = 64;
const REPORT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Sender used by a control surface to dispatch commands to the coordinator thread.
pub type CommandSender = mpsc::SyncSender<Command>;

/// Receiver used by a control surface to read events emitted by the coordinator thread.
pub type EventReceiver = mpsc::Receiver<Event>;

/// Spawns the coordinator thread with headless display surfaces.
///
/// A `seed` makes shuffled orders reproducible; without one the generator is
/// seeded from the OS.
pub fn spawn_headless_coordinator(seed: Option<u64>) -> (CommandSender, EventReceiver) {
    let rng = seed.map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);
    spawn_coordinator(rng, HeadlessDisplayLauncher::new)
}

/// Spawns the coordinator thread.
///
/// `build_launcher` receives the sender display surfaces report through.
/// Control commands are handled one at a time in arrival order; display
/// reports are drained between them. The thread ends once every
/// [`CommandSender`] is dropped or the event receiver goes away.
pub fn spawn_coordinator<L, F>(rng: SmallRng, build_launcher: F) -> (CommandSender, EventReceiver)
where
    L: DisplayLauncher + 'static,
    F: FnOnce(mpsc::SyncSender<Command>) -> L + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::sync_channel::<Command>(COMMAND_CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::sync_channel::<Event>(EVENT_CHANNEL_CAPACITY);

    thread::spawn(move || {
        let (report_tx, report_rx) = mpsc::sync_channel::<Command>(REPORT_CHANNEL_CAPACITY);
        let control = Box::new(ChannelSurface::new(event_tx));
        let mut coordinator = Coordinator::new(build_launcher(report_tx), control, rng);

        loop {
            match command_rx.recv_timeout(REPORT_POLL_INTERVAL) {
                Ok(command) => handle(&mut coordinator, command),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("command senders dropped; stopping coordinator");
                    return;
                }
            }

            loop {
                match report_rx.try_recv() {
                    Ok(report) => handle(&mut coordinator, report),
                    Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
                }
            }

            if !coordinator.has_control() {
                debug!("control surface gone; stopping coordinator");
                return;
            }
        }
    });

    (command_tx, event_rx)
}

fn handle<L>(coordinator: &mut Coordinator<L>, command: Command)
where
    L: DisplayLauncher,
{
    if let Err(error) = coordinator.handle_command(command) {
        coordinator.report_error(&error);
    }
}
