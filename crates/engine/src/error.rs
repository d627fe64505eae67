use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Result type used by the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by coordinator commands and configuration files.
///
/// Command errors never leave a session half-updated: the state seen by the
/// surfaces is the state from before the failed command.
#[derive(Debug)]
pub enum EngineError {
    NoSession,
    NoDisplaySurface,
    ItemOutOfRange {
        item_index: usize,
        item_count: usize,
    },
    ItemNotInOrder {
        item_index: usize,
    },
    DisplayLaunch {
        reason: String,
    },
    ConfigIo {
        context: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    ConfigSerialization {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl EngineError {
    /// Returns true for commands that referenced state that no longer exists.
    pub fn is_invalid_command(&self) -> bool {
        matches!(
            self,
            Self::NoSession
                | Self::NoDisplaySurface
                | Self::ItemOutOfRange { .. }
                | Self::ItemNotInOrder { .. }
        )
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSession => write!(f, "no projector session is active"),
            Self::NoDisplaySurface => write!(f, "display surface is not open"),
            Self::ItemOutOfRange {
                item_index,
                item_count,
            } => write!(f, "item {item_index} is out of range (item count {item_count})"),
            Self::ItemNotInOrder { item_index } => {
                write!(f, "item {item_index} is not part of the display order")
            }
            Self::DisplayLaunch { reason } => {
                write!(f, "failed to launch display surface: {reason}")
            }
            Self::ConfigIo {
                context,
                path,
                source,
            } => write!(f, "{context}: {} ({source})", path.display()),
            Self::ConfigSerialization { path, source } => write!(
                f,
                "config serialization/deserialization failed at {} ({source})",
                path.display()
            ),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConfigIo { source, .. } => Some(source),
            Self::ConfigSerialization { source, .. } => Some(source),
            _ => None,
        }
    }
}
