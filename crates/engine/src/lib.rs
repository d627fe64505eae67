//! UI-agnostic session engine for the projector.

pub mod api;
pub mod bridge;
pub mod config;
pub mod coordinator;
pub mod display;
pub mod error;
pub mod item;
pub mod navigation;
pub mod notifier;
pub mod order;
pub mod seek;
pub mod session;
pub mod settings;

pub use api::{
    Command, Direction, EngineErrorEvent, EngineErrorKind, Event, Routed, Target, TimerProgress,
    VideoProgress,
};
pub use bridge::{CommandSender, EventReceiver, spawn_coordinator, spawn_headless_coordinator};
pub use coordinator::{Coordinator, DisplayLauncher, DisplayState};
pub use display::{DisplayDriver, HeadlessDisplayLauncher, spawn_headless_display};
pub use error::{EngineError, Result};
pub use item::{Item, ItemId, ItemKind};
pub use notifier::{ChannelSurface, Notifier, Surface, SurfaceGone};
pub use order::DisplayOrder;
pub use seek::SeekTracker;
pub use session::{Cursor, Session};
pub use settings::Settings;
