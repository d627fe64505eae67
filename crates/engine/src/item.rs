use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Stable identifier of one projectable item.
///
/// Two items sharing an id are treated as the same content by the
/// no-repeat rule of shuffled playback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Kind of content an item carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    Image,
    Video,
    DocumentPage,
}

/// One projectable unit: an image, a video, or a single document page.
///
/// `payload` is an opaque content reference (usually a path) that only the
/// display surface interprets.
///
/// # Example
/// ```
/// use engine::{Item, ItemKind};
///
/// let item = Item::new("intro", ItemKind::Video, "media/intro.mp4");
/// assert!(item.is_video());
/// assert_eq!(item.id.as_str(), "intro");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub payload: String,
}

impl Item {
    pub fn new(id: impl Into<String>, kind: ItemKind, payload: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(id),
            kind,
            payload: payload.into(),
        }
    }

    pub fn is_video(&self) -> bool {
        self.kind == ItemKind::Video
    }
}
