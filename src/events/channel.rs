//! Event channel built on crossbeam.
//!
//! The channel is unbounded: a run never blocks on a slow consumer.

use super::Event;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::time::Duration;

/// Worker side of an event channel. Clones share one queue.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Queue an event. Dropped silently once the receiver is gone.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Consumer side of an event channel
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block for the next event; `None` once every sender is gone
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// `None` on timeout as well as on disconnect
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Event> {
        self.inner.recv_timeout(timeout).ok()
    }

    /// Blocking iterator that ends once every sender is gone
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Everything queued right now, in send order
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }
}

pub struct EventChannel;

impl EventChannel {
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// A sender nobody listens to, for runs without a consumer
pub fn null_sender() -> EventSender {
    let (sender, _) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ClusterEvent, ProgressUpdate, RunPhase};
    use std::thread;

    fn progress(percent: u8) -> Event {
        Event::Cluster(ClusterEvent::Progress(ProgressUpdate {
            percent,
            message: "Processing: a.png".to_string(),
            phase: RunPhase::Hashing,
        }))
    }

    #[test]
    fn events_can_be_sent_across_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(progress(25));
        });
        handle.join().unwrap();

        match receiver.recv().unwrap() {
            Event::Cluster(ClusterEvent::Progress(p)) => assert_eq!(p.percent, 25),
            other => panic!("Wrong event type: {other:?}"),
        }
    }

    #[test]
    fn sending_without_a_receiver_is_a_no_op() {
        null_sender().send(Event::Cluster(ClusterEvent::Cancelled));
    }

    #[test]
    fn recv_ends_when_all_senders_drop() {
        let (sender, receiver) = EventChannel::new();
        let clone = sender.clone();
        clone.send(progress(5));
        drop(sender);
        drop(clone);

        assert!(receiver.recv().is_some());
        assert!(receiver.recv().is_none());
    }

    #[test]
    fn iter_yields_until_senders_drop() {
        let (sender, receiver) = EventChannel::new();
        let handle = thread::spawn(move || {
            for percent in [10, 20] {
                sender.send(progress(percent));
            }
        });
        handle.join().unwrap();

        assert_eq!(receiver.iter().count(), 2);
    }

    #[test]
    fn recv_timeout_returns_none_when_idle() {
        let (_sender, receiver) = EventChannel::new();
        assert!(receiver.recv_timeout(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn drain_preserves_send_order() {
        let (sender, receiver) = EventChannel::new();
        for percent in [0, 10, 20] {
            sender.send(progress(percent));
        }

        let percents: Vec<u8> = receiver
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                Event::Cluster(ClusterEvent::Progress(p)) => Some(p.percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents, vec![0, 10, 20]);
    }
}
