use std::thread;

use engine::{CommandSender, Event, EventReceiver, spawn_headless_coordinator};
use iced::futures::{SinkExt, StreamExt, channel::mpsc as futures_mpsc, executor};
use iced::{Subscription, stream};

const SUBSCRIPTION_CHANNEL_CAPACITY: usize = 32;

/// Messages emitted by the coordinator bridge subscription.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    Ready(CommandSender),
    Event(Event),
    Disconnected,
}

/// Builds a subscription that starts the coordinator thread and forwards its events.
pub fn coordinator_subscription() -> Subscription<BridgeEvent> {
    Subscription::run(bridge_worker_stream)
}

fn bridge_worker_stream() -> impl iced::futures::Stream<Item = BridgeEvent> {
    bridge_worker_stream_with(spawn_projector_bridge)
}

fn bridge_worker_stream_with(
    spawn_bridge: fn() -> (CommandSender, EventReceiver),
) -> impl iced::futures::Stream<Item = BridgeEvent> {
    stream::channel(
        SUBSCRIPTION_CHANNEL_CAPACITY,
        move |mut output| async move {
            let (command_tx, event_rx) = spawn_bridge();
            let _ = output.send(BridgeEvent::Ready(command_tx)).await;

            let (forward_tx, mut forward_rx) =
                futures_mpsc::channel::<BridgeEvent>(SUBSCRIPTION_CHANNEL_CAPACITY);

            thread::spawn(move || {
                let mut forward_tx = forward_tx;
                while let Ok(event) = event_rx.recv() {
                    if executor::block_on(forward_tx.send(BridgeEvent::Event(event))).is_err() {
                        return;
                    }
                }
                let _ = executor::block_on(forward_tx.send(BridgeEvent::Disconnected));
            });

            while let Some(event) = forward_rx.next().await {
                if output.send(event).await.is_err() {
                    break;
                }
            }
        },
    )
}

/// Spawns the production coordinator with headless display surfaces.
pub fn spawn_projector_bridge() -> (CommandSender, EventReceiver) {
    spawn_headless_coordinator(None)
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use engine::{Command, CommandSender, Event, EventReceiver, Item, ItemKind, Settings};
    use iced::futures::{StreamExt, executor, pin_mut};

    use super::{BridgeEvent, bridge_worker_stream_with};

    #[test]
    fn bridge_worker_stream_emits_ready_forwards_events_and_disconnected() {
        let (bridge_tx, bridge_rx) = mpsc::channel::<BridgeEvent>();

        thread::spawn(move || {
            let stream = bridge_worker_stream_with(spawn_seeded_bridge);
            executor::block_on(async move {
                pin_mut!(stream);
                for _ in 0..4 {
                    let Some(event) = stream.next().await else {
                        break;
                    };
                    if bridge_tx.send(event).is_err() {
                        break;
                    }
                }
            });
        });

        let ready = bridge_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("ready event");
        let BridgeEvent::Ready(command_tx) = ready else {
            panic!("expected BridgeEvent::Ready");
        };

        command_tx
            .send(Command::Open {
                items: vec![Item::new("a", ItemKind::Image, "a.png")],
                settings: Settings::default(),
            })
            .expect("send open command");

        let first = bridge_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("first forwarded event");
        assert!(matches!(
            first,
            BridgeEvent::Event(Event::DisplayStatus { open: true })
        ));

        let second = bridge_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("second forwarded event");
        assert!(matches!(
            second,
            BridgeEvent::Event(Event::Navigate { item: Some(0) })
        ));

        drop(command_tx);

        let disconnected = bridge_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("disconnected event");
        assert!(matches!(disconnected, BridgeEvent::Disconnected));
    }

    fn spawn_seeded_bridge() -> (CommandSender, EventReceiver) {
        engine::spawn_headless_coordinator(Some(1))
    }
}
