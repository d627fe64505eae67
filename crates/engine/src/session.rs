use std::sync::Arc;

use rand::Rng;

use crate::item::Item;
use crate::order::DisplayOrder;
use crate::settings::Settings;

/// Position within the display order, or the idle background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Position(usize),
    Background,
}

/// Authoritative record of what the projector is showing.
///
/// Sessions are values: navigation never mutates one in place but returns
/// the successor from [`crate::navigation`]. Items are shared so that
/// successors are cheap to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub(crate) items: Arc<[Item]>,
    pub(crate) order: DisplayOrder,
    pub(crate) cursor: Cursor,
    pub(crate) playing: bool,
    pub(crate) settings: Settings,
}

impl Session {
    /// Starts a session at the first item of a freshly generated order.
    ///
    /// An empty item list starts on the background. Playback starts paused.
    pub fn start<R>(items: Arc<[Item]>, settings: Settings, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let settings = settings.normalized();
        let order = DisplayOrder::generate(items.len(), settings.random, rng);
        let cursor = if order.is_empty() {
            Cursor::Background
        } else {
            Cursor::Position(0)
        };

        Self {
            items,
            order,
            cursor,
            playing: false,
            settings,
        }
    }

    pub fn items(&self) -> &Arc<[Item]> {
        &self.items
    }

    pub fn order(&self) -> &DisplayOrder {
        &self.order
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_background(&self) -> bool {
        self.cursor == Cursor::Background
    }

    /// Normalized settings snapshot.
    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Index into the item list of the item currently shown.
    pub fn current_item_index(&self) -> Option<usize> {
        match self.cursor {
            Cursor::Position(position) => self.order.item_at(position),
            Cursor::Background => None,
        }
    }

    pub fn current_item(&self) -> Option<&Item> {
        self.current_item_index()
            .and_then(|index| self.items.get(index))
    }

    /// Checks every structural invariant of the session.
    pub fn invariants_hold(&self) -> bool {
        let order_ok = self.order.len() == self.items.len() && self.order.is_permutation();
        let cursor_ok = match self.cursor {
            Cursor::Position(position) => position < self.order.len(),
            Cursor::Background => true,
        };
        let shuffle_ok = !self.settings.random || self.settings.loop_playback;
        let playing_ok = !(self.playing && self.cursor == Cursor::Background);

        order_ok && cursor_ok && shuffle_ok && playing_ok
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::{Cursor, Session};
    use crate::item::{Item, ItemKind};
    use crate::settings::Settings;

    #[test]
    fn start_positions_cursor_on_first_order_entry() {
        let items: Arc<[Item]> = vec![
            Item::new("a", ItemKind::Image, "a.png"),
            Item::new("b", ItemKind::Image, "b.png"),
        ]
        .into();
        let session = Session::start(items, Settings::default(), &mut SmallRng::seed_from_u64(1));

        assert_eq!(session.cursor(), Cursor::Position(0));
        assert_eq!(session.current_item_index(), Some(0));
        assert!(!session.is_playing());
        assert!(session.invariants_hold());
    }

    #[test]
    fn start_with_no_items_shows_background() {
        let session = Session::start(
            Arc::from(Vec::new()),
            Settings::default(),
            &mut SmallRng::seed_from_u64(1),
        );

        assert!(session.is_background());
        assert_eq!(session.current_item(), None);
        assert!(session.invariants_hold());
    }

    #[test]
    fn start_normalizes_random_without_loop() {
        let settings = Settings {
            loop_playback: false,
            random: true,
            ..Settings::default()
        };
        let session = Session::start(Arc::from(Vec::new()), settings, &mut SmallRng::seed_from_u64(1));

        assert!(!session.settings().random);
    }
}
