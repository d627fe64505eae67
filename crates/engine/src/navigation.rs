//! Pure session transitions.
//!
//! Every function takes the current [`Session`] by reference and returns the
//! successor together with the events it caused, in causal order. None of
//! them can leave the session invariants broken; commands that reference
//! state which no longer exists return an error and produce no successor.

use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use crate::api::{Direction, Event, Routed};
use crate::error::{EngineError, Result};
use crate::item::{Item, ItemId};
use crate::order::DisplayOrder;
use crate::session::{Cursor, Session};
use crate::settings::Settings;

/// Successor session and the events that announce it.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub session: Session,
    pub events: Vec<Routed>,
}

/// Moves one step in `direction`.
///
/// Leaving the order without looping stops playback and shows the
/// background; the next step from the background resumes at the matching
/// end of the order.
pub fn advance(session: &Session, direction: Direction) -> Transition {
    let mut next = session.clone();
    let mut events = Vec::new();

    if next.order.is_empty() {
        next.cursor = Cursor::Background;
        events.push(Routed::both(Event::Navigate { item: None }));
        if next.playing {
            next.playing = false;
            events.push(Routed::both(Event::PlayPause { playing: false }));
        }
        return Transition {
            session: next,
            events,
        };
    }

    let len = next.order.len();
    let position = match next.cursor {
        Cursor::Background => match direction {
            Direction::Next => 0,
            Direction::Previous => len - 1,
        },
        Cursor::Position(current) => match step(current, direction, len) {
            Some(position) => position,
            None if !next.settings.loop_playback => {
                next.playing = false;
                next.cursor = Cursor::Background;
                events.push(Routed::both(Event::PlayPause { playing: false }));
                events.push(Routed::both(Event::Navigate { item: None }));
                return Transition {
                    session: next,
                    events,
                };
            }
            None => {
                let wrapped = wrap_step(current, direction, len);
                avoid_repeat_on_wrap(&next, current, wrapped, direction)
            }
        },
    };

    next.cursor = Cursor::Position(position);
    events.push(announce(&next));
    Transition {
        session: next,
        events,
    }
}

/// Shows the item at `item_index` of the item list.
pub fn jump_to(session: &Session, item_index: usize) -> Result<Transition> {
    if item_index >= session.items.len() {
        return Err(EngineError::ItemOutOfRange {
            item_index,
            item_count: session.items.len(),
        });
    }
    let position = session
        .order
        .position_of(item_index)
        .ok_or(EngineError::ItemNotInOrder { item_index })?;

    let mut next = session.clone();
    next.cursor = Cursor::Position(position);
    Ok(Transition {
        events: vec![Routed::both(Event::Navigate {
            item: Some(item_index),
        })],
        session: next,
    })
}

/// Flips between playing and paused.
///
/// Starting playback from the background first moves to the first item of
/// the order. With nothing to show, playback stays paused.
pub fn toggle_play_pause(session: &Session) -> Transition {
    let mut next = session.clone();
    let mut events = Vec::new();

    if session.playing {
        next.playing = false;
    } else if !next.order.is_empty() {
        if next.is_background() {
            let resumed = advance(&next, Direction::Next);
            next = resumed.session;
            events.extend(resumed.events);
        }
        next.playing = true;
    }

    events.push(Routed::both(Event::PlayPause {
        playing: next.playing,
    }));
    Transition {
        session: next,
        events,
    }
}

/// Replaces the item list wholesale and re-announces the position.
pub fn replace_items<R>(session: &Session, items: Arc<[Item]>, rng: &mut R) -> Transition
where
    R: Rng + ?Sized,
{
    let order = DisplayOrder::generate(items.len(), session.settings.random, rng);
    let cursor = match session.cursor {
        _ if order.is_empty() => Cursor::Background,
        Cursor::Position(position) => Cursor::Position(position.min(order.len() - 1)),
        Cursor::Background => Cursor::Background,
    };

    let mut next = session.clone();
    next.items = Arc::clone(&items);
    next.order = order;
    next.cursor = cursor;

    let mut events = vec![Routed::display(Event::FilesUpdated(items)), announce(&next)];
    if next.playing && next.is_background() {
        next.playing = false;
        events.push(Routed::both(Event::PlayPause { playing: false }));
    }

    Transition {
        session: next,
        events,
    }
}

/// Applies new settings, normalizing the shuffle request first.
///
/// When the effective shuffle flag flips, a new order is generated and the
/// cursor follows the item that is currently shown, so the display does not
/// change under the audience.
pub fn update_settings<R>(session: &Session, requested: Settings, rng: &mut R) -> Transition
where
    R: Rng + ?Sized,
{
    let settings = requested.normalized();
    let mut next = session.clone();

    if requested.shuffle() != session.settings.shuffle() {
        let shown = session.current_item_index();
        next.order = DisplayOrder::generate(next.items.len(), settings.random, rng);
        if let Some(position) = shown.and_then(|item| next.order.position_of(item)) {
            next.cursor = Cursor::Position(position);
        }
        debug!(
            shuffle = settings.shuffle(),
            current_item = ?shown,
            "display order regenerated"
        );
    }
    next.settings = settings;

    Transition {
        session: next,
        events: vec![Routed::display(Event::SettingsChanged(settings))],
    }
}

/// `Navigate` event for the session's current position, to both surfaces.
pub fn announce(session: &Session) -> Routed {
    Routed::both(Event::Navigate {
        item: session.current_item_index(),
    })
}

fn step(position: usize, direction: Direction, len: usize) -> Option<usize> {
    match direction {
        Direction::Next => position.checked_add(1).filter(|&next| next < len),
        Direction::Previous => position.checked_sub(1),
    }
}

fn wrap_step(position: usize, direction: Direction, len: usize) -> usize {
    match direction {
        Direction::Next => (position + 1) % len,
        Direction::Previous => (position + len - 1) % len,
    }
}

/// Skips wrapped candidates that would show the same content again.
///
/// Tries at most `len` positions; when every item shares one id the first
/// candidate is accepted.
fn avoid_repeat_on_wrap(
    session: &Session,
    from: usize,
    candidate: usize,
    direction: Direction,
) -> usize {
    let len = session.order.len();
    if !(session.settings.loop_playback && session.settings.random && len > 1) {
        return candidate;
    }
    let Some(previous_id) = item_id_at(session, from) else {
        return candidate;
    };

    let mut position = candidate;
    for _ in 0..len {
        if item_id_at(session, position) != Some(previous_id) {
            return position;
        }
        position = wrap_step(position, direction, len);
    }

    debug!(
        item_id = %previous_id,
        len,
        "every position repeats the current item; accepting repeat"
    );
    candidate
}

fn item_id_at(session: &Session, position: usize) -> Option<&ItemId> {
    session
        .order
        .item_at(position)
        .and_then(|index| session.items.get(index))
        .map(|item| &item.id)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::{Transition, advance, jump_to, replace_items, toggle_play_pause, update_settings};
    use crate::api::{Direction, Event, Routed, Target};
    use crate::error::EngineError;
    use crate::item::{Item, ItemKind};
    use crate::order::DisplayOrder;
    use crate::session::{Cursor, Session};
    use crate::settings::Settings;

    #[test]
    fn linear_sequence_ends_on_background() {
        let session = start(&["A", "B", "C"], linear());

        let first = advance(&session, Direction::Next);
        let second = advance(&first.session, Direction::Next);
        let third = advance(&second.session, Direction::Next);

        assert_eq!(navigated(&first), vec![Some(1)]);
        assert_eq!(navigated(&second), vec![Some(2)]);
        assert_eq!(navigated(&third), vec![None]);
        assert!(third.session.is_background());
    }

    #[test]
    fn leaving_the_end_without_loop_stops_then_shows_background() {
        let session = at_position(start(&["A", "B", "C"], linear()), 2);

        let transition = advance(&session, Direction::Next);

        assert_eq!(
            transition.events,
            vec![
                Routed::both(Event::PlayPause { playing: false }),
                Routed::both(Event::Navigate { item: None }),
            ]
        );
        assert!(!transition.session.is_playing());
    }

    #[test]
    fn next_from_background_resumes_at_first_position() {
        let session = at_position(start(&["A", "B", "C"], linear()), 2);
        let background = advance(&session, Direction::Next).session;

        let resumed = advance(&background, Direction::Next);

        assert_eq!(resumed.session.cursor(), Cursor::Position(0));
        assert_eq!(navigated(&resumed), vec![Some(0)]);
    }

    #[test]
    fn previous_from_background_resumes_at_last_position() {
        let mut session = start(&["A", "B", "C"], linear());
        session.cursor = Cursor::Background;

        let resumed = advance(&session, Direction::Previous);

        assert_eq!(resumed.session.cursor(), Cursor::Position(2));
        assert_eq!(navigated(&resumed), vec![Some(2)]);
    }

    #[test]
    fn previous_before_first_item_without_loop_shows_background() {
        let session = start(&["A", "B", "C"], linear());

        let transition = advance(&session, Direction::Previous);

        assert!(transition.session.is_background());
        assert_eq!(navigated(&transition), vec![None]);
    }

    #[test]
    fn looping_wraps_from_last_to_first() {
        let session = at_position(start(&["A", "B", "C"], looping()), 2);

        let transition = advance(&session, Direction::Next);

        assert_eq!(navigated(&transition), vec![Some(0)]);
        assert_eq!(transition.session.cursor(), Cursor::Position(0));
    }

    #[test]
    fn looping_wraps_from_first_to_last_going_backwards() {
        let session = start(&["A", "B", "C"], looping());

        let transition = advance(&session, Direction::Previous);

        assert_eq!(navigated(&transition), vec![Some(2)]);
    }

    #[test]
    fn advance_on_empty_session_reports_background_and_stops_playback() {
        let mut session = start(&[], linear());
        session.playing = true;

        let transition = advance(&session, Direction::Next);

        assert_eq!(
            transition.events,
            vec![
                Routed::both(Event::Navigate { item: None }),
                Routed::both(Event::PlayPause { playing: false }),
            ]
        );
        assert!(transition.session.invariants_hold());
    }

    #[test]
    fn wrapped_candidate_repeating_current_item_is_skipped() {
        let mut session = start_with_ids(&["x", "y", "z", "x"], shuffled());
        session.order = DisplayOrder::identity(4);
        session.cursor = Cursor::Position(3);

        let transition = advance(&session, Direction::Next);

        assert_eq!(transition.session.cursor(), Cursor::Position(1));
        assert_eq!(navigated(&transition), vec![Some(1)]);
    }

    #[test]
    fn wrapped_candidate_repeat_is_skipped_going_backwards() {
        let mut session = start_with_ids(&["x", "y", "x", "x"], shuffled());
        session.order = DisplayOrder::identity(4);
        session.cursor = Cursor::Position(0);

        let transition = advance(&session, Direction::Previous);

        assert_eq!(transition.session.cursor(), Cursor::Position(1));
    }

    #[test]
    fn repeat_rule_does_not_apply_without_shuffle() {
        let mut session = start_with_ids(&["x", "y", "z", "x"], looping());
        session.cursor = Cursor::Position(3);

        let transition = advance(&session, Direction::Next);

        assert_eq!(transition.session.cursor(), Cursor::Position(0));
    }

    #[test]
    fn identical_items_accept_repeat_instead_of_spinning() {
        let mut session = start_with_ids(&["x", "x", "x", "x"], shuffled());
        session.order = DisplayOrder::identity(4);
        session.cursor = Cursor::Position(3);

        let transition = advance(&session, Direction::Next);

        assert_eq!(transition.session.cursor(), Cursor::Position(0));
    }

    #[test]
    fn jump_to_round_trips_every_item_in_shuffled_order() {
        let session = start(&["A", "B", "C", "D", "E"], shuffled());

        for item_index in 0..5 {
            let transition = jump_to(&session, item_index).expect("jump should succeed");
            assert_eq!(transition.session.current_item_index(), Some(item_index));
            assert_eq!(navigated(&transition), vec![Some(item_index)]);
        }
    }

    #[test]
    fn jump_to_clears_background() {
        let mut session = start(&["A", "B"], linear());
        session.cursor = Cursor::Background;

        let transition = jump_to(&session, 1).expect("jump should succeed");

        assert!(!transition.session.is_background());
    }

    #[test]
    fn jump_to_stale_index_fails() {
        let session = start(&["A", "B"], linear());

        let result = jump_to(&session, 2);

        assert!(matches!(
            result,
            Err(EngineError::ItemOutOfRange {
                item_index: 2,
                item_count: 2
            })
        ));
    }

    #[test]
    fn jump_to_index_missing_from_order_fails() {
        let mut session = start(&["A", "B", "C"], linear());
        session.order = DisplayOrder::identity(2);

        let result = jump_to(&session, 2);

        assert!(matches!(
            result,
            Err(EngineError::ItemNotInOrder { item_index: 2 })
        ));
    }

    #[test]
    fn play_from_background_navigates_to_first_item_before_announcing_play() {
        let mut session = start(&["A", "B", "C"], linear());
        session.cursor = Cursor::Background;

        let transition = toggle_play_pause(&session);

        assert!(transition.session.is_playing());
        assert_eq!(
            transition.events,
            vec![
                Routed::both(Event::Navigate { item: Some(0) }),
                Routed::both(Event::PlayPause { playing: true }),
            ]
        );
    }

    #[test]
    fn toggle_pauses_when_playing() {
        let mut session = start(&["A"], linear());
        session.playing = true;

        let transition = toggle_play_pause(&session);

        assert!(!transition.session.is_playing());
        assert_eq!(
            transition.events,
            vec![Routed::both(Event::PlayPause { playing: false })]
        );
    }

    #[test]
    fn toggle_on_empty_session_stays_paused() {
        let session = start(&[], linear());

        let transition = toggle_play_pause(&session);

        assert!(!transition.session.is_playing());
        assert!(transition.session.invariants_hold());
    }

    #[test]
    fn replace_items_clamps_cursor_and_reannounces_position() {
        let session = at_position(start(&["A", "B", "C", "D"], linear()), 3);

        let transition = replace_items(&session, items(&["A", "B"]), &mut rng());

        assert_eq!(transition.session.cursor(), Cursor::Position(1));
        assert_eq!(transition.events.len(), 2);
        assert_eq!(transition.events[0].target, Target::Display);
        assert!(matches!(
            transition.events[0].event,
            Event::FilesUpdated(ref files) if files.len() == 2
        ));
        assert_eq!(
            transition.events[1],
            Routed::both(Event::Navigate { item: Some(1) })
        );
    }

    #[test]
    fn replace_items_with_empty_list_shows_background_and_stops() {
        let mut session = start(&["A", "B"], linear());
        session.playing = true;

        let transition = replace_items(&session, items(&[]), &mut rng());

        assert!(transition.session.is_background());
        assert!(!transition.session.is_playing());
        assert_eq!(
            transition.events.last(),
            Some(&Routed::both(Event::PlayPause { playing: false }))
        );
        assert!(transition.session.invariants_hold());
    }

    #[test]
    fn replace_items_keeps_identity_order_without_shuffle() {
        let session = start(&["A"], looping());

        let transition = replace_items(&session, items(&["A", "B", "C"]), &mut rng());

        assert_eq!(transition.session.order(), &DisplayOrder::identity(3));
    }

    #[test]
    fn replace_items_reshuffles_new_list_with_shuffle_on() {
        let session = start(&["A"], shuffled());
        let names = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"];

        let transition = replace_items(&session, items(&names), &mut rng());

        let order = transition.session.order();
        assert_eq!(order.len(), names.len());
        assert!(order.is_permutation());
        assert_ne!(order, &DisplayOrder::identity(names.len()));
        assert!(transition.session.invariants_hold());
    }

    #[test]
    fn settings_normalization_stores_random_off_without_loop() {
        let session = start(&["A", "B"], linear());
        let requested = Settings {
            loop_playback: false,
            random: true,
            ..Settings::default()
        };

        let transition = update_settings(&session, requested, &mut rng());

        assert!(!transition.session.settings().random);
        assert_eq!(
            transition.events,
            vec![Routed::display(Event::SettingsChanged(Settings {
                random: false,
                ..requested
            }))]
        );
    }

    #[test]
    fn repeated_settings_update_does_not_reshuffle() {
        let session = start(&["A", "B", "C", "D", "E", "F"], linear());
        let mut rng = rng();

        let once = update_settings(&session, shuffled(), &mut rng);
        let twice = update_settings(&once.session, shuffled(), &mut rng);

        assert_eq!(once.session.order(), twice.session.order());
    }

    #[test]
    fn enabling_shuffle_keeps_current_item_on_screen() {
        let session = at_position(start(&["A", "B", "C", "D", "E", "F"], looping()), 4);

        let transition = update_settings(&session, shuffled(), &mut rng());

        assert_eq!(transition.session.current_item_index(), Some(4));
        assert!(transition.session.order().is_permutation());
    }

    #[test]
    fn disabling_loop_restores_identity_order() {
        let session = start(&["A", "B", "C", "D"], shuffled());

        let transition = update_settings(&session, linear(), &mut rng());

        assert_eq!(transition.session.order(), &DisplayOrder::identity(4));
        assert_eq!(
            transition.session.current_item_index(),
            session.current_item_index()
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Next,
        Previous,
        Toggle,
        Jump(usize),
        Replace(usize),
        Configure(bool, bool),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Next),
            Just(Op::Previous),
            Just(Op::Toggle),
            (0usize..8).prop_map(Op::Jump),
            (0usize..6).prop_map(Op::Replace),
            (any::<bool>(), any::<bool>()).prop_map(|(looped, random)| Op::Configure(looped, random)),
        ]
    }

    proptest! {
        #[test]
        fn invariants_survive_any_command_sequence(
            seed in any::<u64>(),
            ops in proptest::collection::vec(op_strategy(), 0..64),
        ) {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut session = Session::start(items(&["A", "B", "C", "D"]), looping(), &mut rng);

            for op in ops {
                let transition = match op {
                    Op::Next => advance(&session, Direction::Next),
                    Op::Previous => advance(&session, Direction::Previous),
                    Op::Toggle => toggle_play_pause(&session),
                    Op::Jump(item_index) => match jump_to(&session, item_index) {
                        Ok(transition) => transition,
                        Err(_) => {
                            prop_assert!(item_index >= session.items().len());
                            continue;
                        }
                    },
                    Op::Replace(count) => {
                        let names: Vec<String> = (0..count).map(|n| format!("item-{n}")).collect();
                        let names: Vec<&str> = names.iter().map(String::as_str).collect();
                        replace_items(&session, items(&names), &mut rng)
                    }
                    Op::Configure(looped, random) => {
                        let requested = Settings {
                            loop_playback: looped,
                            random,
                            ..Settings::default()
                        };
                        update_settings(&session, requested, &mut rng)
                    }
                };

                prop_assert!(transition.session.invariants_hold());
                if let Some(item) = navigated(&transition).last() {
                    prop_assert_eq!(*item, transition.session.current_item_index());
                }
                session = transition.session;
            }
        }
    }

    fn navigated(transition: &Transition) -> Vec<Option<usize>> {
        transition
            .events
            .iter()
            .filter_map(|routed| match routed.event {
                Event::Navigate { item } => Some(item),
                _ => None,
            })
            .collect()
    }

    fn items(names: &[&str]) -> Arc<[Item]> {
        names
            .iter()
            .map(|name| Item::new(*name, ItemKind::Image, format!("{name}.png")))
            .collect()
    }

    fn start(names: &[&str], settings: Settings) -> Session {
        Session::start(items(names), settings, &mut rng())
    }

    fn start_with_ids(ids: &[&str], settings: Settings) -> Session {
        let items: Arc<[Item]> = ids
            .iter()
            .enumerate()
            .map(|(index, id)| Item::new(*id, ItemKind::Image, format!("{index}.png")))
            .collect();
        Session::start(items, settings, &mut rng())
    }

    fn at_position(mut session: Session, position: usize) -> Session {
        session.cursor = Cursor::Position(position);
        session
    }

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(0x5eed)
    }

    fn linear() -> Settings {
        Settings::default()
    }

    fn looping() -> Settings {
        Settings {
            loop_playback: true,
            ..Settings::default()
        }
    }

    fn shuffled() -> Settings {
        Settings {
            loop_playback: true,
            random: true,
            ..Settings::default()
        }
    }
}
