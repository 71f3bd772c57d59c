//! Monitoring subscriptions.
//!
//! A [`Subscription`] is the receiving end of a reader's event stream.
//! Events are delivered over a channel, so a subscriber can never run
//! inside the reader's own state update, and a subscriber that goes away
//! simply stops receiving: dropping the subscription detaches it.

use crate::types::{ReaderEvent, TagReading};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::mpsc;

type CancelFn = Box<dyn FnOnce() + Send + Sync>;

/// Live event stream from one reader.
///
/// # Examples
///
/// ```no_run
/// use tagbridge_hardware::{MockReader, RfidReader};
///
/// # async fn example() -> tagbridge_hardware::Result<()> {
/// let reader = MockReader::new();
/// let mut events = reader.start_monitoring().await?;
///
/// while let Some(event) = events.recv().await {
///     println!("{} {}", event.kind, event.item.id);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Subscription {
    events: mpsc::UnboundedReceiver<ReaderEvent>,
    cancel: Option<CancelFn>,
}

impl Subscription {
    /// Wrap a receiver; `cancel` runs once when the subscription ends.
    pub(crate) fn new(
        events: mpsc::UnboundedReceiver<ReaderEvent>,
        cancel: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            events,
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the reader stops monitoring.
    pub async fn recv(&mut self) -> Option<ReaderEvent> {
        self.events.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<ReaderEvent> {
        self.events.try_recv().ok()
    }

    /// Take every event that is already queued.
    pub fn drain(&mut self) -> Vec<ReaderEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }

    /// Detach from the reader. Equivalent to dropping the subscription.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("queued", &self.events.len())
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Compute the events that turn `previous` into `current`.
///
/// Removals come first, then additions and updates in `current` order.
/// Timestamps are ignored when deciding whether a tag changed.
pub(crate) fn diff_snapshots(
    previous: &HashMap<String, TagReading>,
    current: &[TagReading],
) -> Vec<ReaderEvent> {
    let mut events: Vec<ReaderEvent> = previous
        .values()
        .filter(|old| !current.iter().any(|tag| tag.id == old.id))
        .cloned()
        .map(ReaderEvent::removed)
        .collect();

    for tag in current {
        match previous.get(&tag.id) {
            None => events.push(ReaderEvent::added(tag.clone())),
            Some(old) if old.differs_from(tag) => events.push(ReaderEvent::updated(tag.clone())),
            Some(_) => {}
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReaderEventKind;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn snapshot(tags: &[TagReading]) -> HashMap<String, TagReading> {
        tags.iter().map(|tag| (tag.id.clone(), tag.clone())).collect()
    }

    #[test]
    fn test_drop_runs_cancel_once() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let subscription = Subscription::new(rx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        subscription.unsubscribe();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drain_collects_queued_events() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscription = Subscription::new(rx, || {});

        tx.send(ReaderEvent::added(TagReading::new("A"))).unwrap();
        tx.send(ReaderEvent::removed(TagReading::new("A"))).unwrap();

        let events = subscription.drain();
        assert_eq!(events.len(), 2);
        assert!(subscription.try_recv().is_none());
    }

    #[test]
    fn test_diff_detects_all_kinds() {
        let before = snapshot(&[
            TagReading::new("A").with_rssi(-50),
            TagReading::new("B").with_rssi(-60),
        ]);
        let after = vec![
            TagReading::new("A").with_rssi(-45),
            TagReading::new("C").with_rssi(-40),
        ];

        let events = diff_snapshots(&before, &after);
        let summary: Vec<_> = events
            .iter()
            .map(|event| (event.kind, event.item.id.as_str()))
            .collect();

        assert_eq!(
            summary,
            vec![
                (ReaderEventKind::Removed, "B"),
                (ReaderEventKind::Updated, "A"),
                (ReaderEventKind::Added, "C"),
            ]
        );
    }

    #[test]
    fn test_diff_of_identical_snapshots_is_empty() {
        let tags = vec![TagReading::new("A").with_secured(true)];
        assert!(diff_snapshots(&snapshot(&tags), &tags).is_empty());
    }
}
