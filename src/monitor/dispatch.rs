//! Fan-out of changes and warnings to subscribers.
//!
//! This module provides:
//! - [`Dispatcher`]: a publish point holding one unbounded channel per subscriber
//! - [`ChangeFeed`]: replay of the current state as adds, then live changes
//! - [`WarningFeed`]: live warnings
//! - [`FramedChanges`] / [`FramedWarnings`]: the same feeds rendered through a [`Framing`]

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::task::{Context, Poll};

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_stream::Stream;
use tracing::error;

use super::change::Change;
use super::error::Warning;
use super::scheduler::Subscription;
use crate::encoding::{Framing, Timestamped};
use crate::time::{Clock, unix_millis};

/// A publish point for values of type `T`.
///
/// Subscribers that dropped their receiver are pruned on the next publish.
#[derive(Debug)]
pub struct Dispatcher<T> {
    senders: Mutex<Vec<UnboundedSender<T>>>,
}

impl<T> Default for Dispatcher<T> {
    fn default() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Clone> Dispatcher<T> {
    /// Creates a dispatcher with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber and returns its receiving end.
    pub fn register(&self) -> UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        rx
    }

    /// Sends `value` to every live subscriber.
    pub fn publish(&self, value: &T) {
        self.lock().retain(|tx| tx.send(value.clone()).is_ok());
    }

    /// Returns the number of registered subscribers, including ones not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true when no subscriber is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<UnboundedSender<T>>> {
        self.senders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Stream of changes: the state at subscription time as adds, then every
/// change applied afterwards, in emission order.
///
/// Dropping the feed unsubscribes it. When the last feed goes away the
/// engine stops polling.
#[derive(Debug)]
pub struct ChangeFeed {
    replay: VecDeque<Change>,
    receiver: UnboundedReceiver<Change>,
    _subscription: Subscription,
}

impl ChangeFeed {
    pub(crate) fn new(
        replay: VecDeque<Change>,
        receiver: UnboundedReceiver<Change>,
        subscription: Subscription,
    ) -> Self {
        Self {
            replay,
            receiver,
            _subscription: subscription,
        }
    }

    /// Renders this feed through `framing`, stamping each record with `clock`.
    pub fn framed<C: Clock>(self, framing: Framing, clock: C) -> FramedChanges<C> {
        FramedChanges {
            feed: self,
            framing,
            clock,
        }
    }
}

impl Stream for ChangeFeed {
    type Item = Change;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(change) = self.replay.pop_front() {
            return Poll::Ready(Some(change));
        }
        self.receiver.poll_recv(cx)
    }
}

/// Stream of warnings raised after subscription.
#[derive(Debug)]
pub struct WarningFeed {
    receiver: UnboundedReceiver<Warning>,
}

impl WarningFeed {
    pub(crate) const fn new(receiver: UnboundedReceiver<Warning>) -> Self {
        Self { receiver }
    }

    /// Renders this feed through `framing`.
    #[must_use]
    pub const fn framed(self, framing: Framing) -> FramedWarnings {
        FramedWarnings {
            feed: self,
            framing,
        }
    }
}

impl Stream for WarningFeed {
    type Item = Warning;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// A [`ChangeFeed`] rendered as framed strings with a leading `time` field.
#[derive(Debug)]
pub struct FramedChanges<C> {
    feed: ChangeFeed,
    framing: Framing,
    clock: C,
}

impl<C: Clock + Unpin> Stream for FramedChanges<C> {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            let Some(change) = std::task::ready!(Pin::new(&mut self.feed).poll_next(cx)) else {
                return Poll::Ready(None);
            };
            let record = Timestamped::new(unix_millis(self.clock.now()), &change);
            if let Some(frame) = encode(self.framing, &record) {
                return Poll::Ready(Some(frame));
            }
        }
    }
}

/// A [`WarningFeed`] rendered as framed strings.
#[derive(Debug)]
pub struct FramedWarnings {
    feed: WarningFeed,
    framing: Framing,
}

impl Stream for FramedWarnings {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            let Some(warning) = std::task::ready!(Pin::new(&mut self.feed).poll_next(cx)) else {
                return Poll::Ready(None);
            };
            if let Some(frame) = encode(self.framing, &warning) {
                return Poll::Ready(Some(frame));
            }
        }
    }
}

fn encode<T: Serialize>(framing: Framing, value: &T) -> Option<String> {
    framing
        .encode(value)
        .inspect_err(|e| error!("Failed to encode record: {e}"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::Scheduler;
    use crate::monitor::{Address, InterfaceInfo};
    use crate::network::{Family, LookupError, NicType, RawAddress};
    use std::sync::Arc;
    use std::time::{Duration, SystemTime};
    use tokio_stream::StreamExt;

    struct FixedClock(SystemTime);

    impl Clock for FixedClock {
        fn now(&self) -> SystemTime {
            self.0
        }
    }

    fn subscription() -> Subscription {
        let scheduler = Arc::new(Mutex::new(Scheduler::new(Duration::from_millis(250))));
        scheduler.lock().unwrap().add_subscriber();
        Subscription::new(scheduler)
    }

    fn add_interface(id: &str) -> Change {
        Change::AddInterface {
            info: Arc::new(InterfaceInfo::new(id, false, NicType::Other)),
        }
    }

    mod dispatcher {
        use super::*;

        #[tokio::test]
        async fn publishes_to_every_subscriber() {
            let dispatcher = Dispatcher::new();
            let mut a = dispatcher.register();
            let mut b = dispatcher.register();

            dispatcher.publish(&7);

            assert_eq!(a.recv().await, Some(7));
            assert_eq!(b.recv().await, Some(7));
        }

        #[test]
        fn prunes_dropped_subscribers() {
            let dispatcher = Dispatcher::new();
            let kept = dispatcher.register();
            drop(dispatcher.register());

            dispatcher.publish(&1);

            assert_eq!(dispatcher.len(), 1);
            drop(kept);
            dispatcher.publish(&2);
            assert!(dispatcher.is_empty());
        }
    }

    mod change_feed {
        use super::*;

        #[tokio::test]
        async fn replays_before_live_changes() {
            let dispatcher = Dispatcher::new();
            let replay = VecDeque::from([add_interface("lo")]);
            let mut feed = ChangeFeed::new(replay, dispatcher.register(), subscription());

            dispatcher.publish(&add_interface("eth0"));

            assert_eq!(feed.next().await.unwrap().interface_id(), "lo");
            assert_eq!(feed.next().await.unwrap().interface_id(), "eth0");
        }

        #[tokio::test]
        async fn ends_when_dispatcher_is_gone() {
            let dispatcher = Dispatcher::new();
            let mut feed = ChangeFeed::new(VecDeque::new(), dispatcher.register(), subscription());
            drop(dispatcher);

            assert!(feed.next().await.is_none());
        }
    }

    mod framed {
        use super::*;

        #[tokio::test]
        async fn changes_carry_time_first() {
            let dispatcher: Dispatcher<Change> = Dispatcher::new();
            let feed = ChangeFeed::new(
                VecDeque::from([add_interface("lo")]),
                dispatcher.register(),
                subscription(),
            );
            let clock = FixedClock(SystemTime::UNIX_EPOCH + Duration::from_millis(1_500));
            let mut framed = feed.framed(Framing::Line, clock);

            let line = framed.next().await.unwrap();

            assert!(line.starts_with(r#"{"time":1500,"type":"add-interface","#));
            assert!(line.ends_with('\n'));
        }

        #[tokio::test]
        async fn address_changes_are_framed() {
            let dispatcher: Dispatcher<Change> = Dispatcher::new();
            let address = Address::normalize("lo", RawAddress::new("127.0.0.1", Family::IPv4));
            let change = Change::AddAddress {
                address: Arc::new(address),
            };
            let feed = ChangeFeed::new(VecDeque::from([change]), dispatcher.register(), subscription());
            let mut framed = feed.framed(Framing::RecordSeparator, FixedClock(SystemTime::UNIX_EPOCH));

            let record = framed.next().await.unwrap();

            assert!(record.starts_with("\u{1e}{\"time\":0,\"type\":\"add-address\""));
            assert!(record.contains(r#""interfaceId":"lo""#));
        }

        #[tokio::test]
        async fn warnings_are_framed_as_is() {
            let dispatcher = Dispatcher::new();
            let mut framed = WarningFeed::new(dispatcher.register()).framed(Framing::Concatenated);

            dispatcher.publish(&Warning::active_lookup(&LookupError::platform("no route")));

            let record = framed.next().await.unwrap();
            assert!(record.starts_with(r#"{"code":"EACTIVEERR""#));
            assert!(record.ends_with('}'));
        }
    }
}
