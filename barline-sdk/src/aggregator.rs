//! The single writer of the slot -> segment table.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use barline_types::{Segment, Severity, Snapshot};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use crate::error::{SchedulerError, UnknownSlot};

/// Diagnostic state of one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotStatus {
    pub name: String,
    /// Severity of the current segment, `None` before the first update.
    pub severity: Option<Severity>,
    pub last_update: Option<SystemTime>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    /// The slot's loop has ended (provider reported unavailable).
    pub stopped: bool,
}

impl SlotStatus {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            severity: None,
            last_update: None,
            last_error: None,
            consecutive_failures: 0,
            stopped: false,
        }
    }
}

#[derive(Debug)]
struct SlotEntry {
    segment: Option<Segment>,
    status: SlotStatus,
}

#[derive(Debug, Default)]
struct Inner {
    slots: Vec<SlotEntry>,
    index: HashMap<String, usize>,
    sequence: u64,
    subscribers: Vec<mpsc::UnboundedSender<Arc<Snapshot>>>,
}

impl Inner {
    fn position(&self, slot: &str) -> Result<usize, UnknownSlot> {
        self.index
            .get(slot)
            .copied()
            .ok_or_else(|| UnknownSlot(slot.to_string()))
    }
}

/// Holds the latest segment of every slot and publishes snapshots.
///
/// Slots keep the order in which they were registered. Every [`update`]
/// produces a new immutable snapshot with a sequence number one higher than
/// the previous one, and hands it to every subscriber before the lock is
/// released, so subscribers observe snapshots in sequence order.
///
/// [`update`]: Aggregator::update
#[derive(Debug)]
pub struct Aggregator {
    inner: Mutex<Inner>,
    current: watch::Sender<Arc<Snapshot>>,
}

impl Aggregator {
    /// Create an aggregator with no slots.
    pub fn new() -> Self {
        let (current, _) = watch::channel(Arc::new(Snapshot::empty()));
        Self {
            inner: Mutex::new(Inner::default()),
            current,
        }
    }

    /// Create an aggregator with the given slots, in display order.
    pub fn with_slots<I, S>(slots: I) -> Result<Self, SchedulerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let aggregator = Self::new();
        for slot in slots {
            aggregator.register(slot.as_ref())?;
        }
        Ok(aggregator)
    }

    /// Append a slot at the end of the display order.
    pub fn register(&self, slot: &str) -> Result<(), SchedulerError> {
        let mut inner = self.inner.lock();
        if inner.index.contains_key(slot) {
            return Err(SchedulerError::DuplicateSlot(slot.to_string()));
        }
        let position = inner.slots.len();
        inner.slots.push(SlotEntry {
            segment: None,
            status: SlotStatus::new(slot),
        });
        inner.index.insert(slot.to_string(), position);
        Ok(())
    }

    /// Number of registered slots.
    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace a slot's segment and publish the resulting snapshot.
    pub fn update(&self, slot: &str, segment: Segment) -> Result<Arc<Snapshot>, UnknownSlot> {
        self.store(slot, segment, true)
    }

    /// Like [`update`], but for a segment re-rendered from a retained value:
    /// the slot's `last_update` is left alone.
    ///
    /// [`update`]: Aggregator::update
    pub fn republish(&self, slot: &str, segment: Segment) -> Result<Arc<Snapshot>, UnknownSlot> {
        self.store(slot, segment, false)
    }

    fn store(&self, slot: &str, segment: Segment, fresh: bool) -> Result<Arc<Snapshot>, UnknownSlot> {
        let mut inner = self.inner.lock();
        let position = inner.position(slot)?;

        let entry = &mut inner.slots[position];
        entry.status.severity = Some(segment.severity);
        if fresh {
            entry.status.last_update = Some(SystemTime::now());
        }
        entry.segment = Some(segment);

        inner.sequence += 1;
        let snapshot = Arc::new(
            Snapshot::builder()
                .sequence(inner.sequence)
                .segments(inner.slots.iter().filter_map(|s| s.segment.clone()))
                .build(),
        );

        inner
            .subscribers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
        self.current.send_replace(snapshot.clone());

        Ok(snapshot)
    }

    /// Record a failed poll. Returns the length of the current failure streak.
    pub fn record_failure(&self, slot: &str, error: &str) -> Result<u32, UnknownSlot> {
        let mut inner = self.inner.lock();
        let position = inner.position(slot)?;
        let status = &mut inner.slots[position].status;
        status.last_error = Some(error.to_string());
        status.consecutive_failures += 1;
        Ok(status.consecutive_failures)
    }

    /// Record a successful poll, ending any failure streak.
    pub fn record_success(&self, slot: &str) -> Result<(), UnknownSlot> {
        let mut inner = self.inner.lock();
        let position = inner.position(slot)?;
        let status = &mut inner.slots[position].status;
        status.last_error = None;
        status.consecutive_failures = 0;
        Ok(())
    }

    /// Mark a slot's loop as ended.
    pub fn mark_stopped(&self, slot: &str) -> Result<(), UnknownSlot> {
        let mut inner = self.inner.lock();
        let position = inner.position(slot)?;
        inner.slots[position].status.stopped = true;
        Ok(())
    }

    /// The latest snapshot.
    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.current.borrow().clone()
    }

    /// Receive every snapshot published from now on, in order.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Arc<Snapshot>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().subscribers.push(tx);
        rx
    }

    /// Watch only the latest snapshot, skipping intermediate ones.
    pub fn watch(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.current.subscribe()
    }

    /// Status of every slot in display order.
    pub fn slot_status(&self) -> Vec<SlotStatus> {
        self.inner
            .lock()
            .slots
            .iter()
            .map(|s| s.status.clone())
            .collect()
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(slot: &str, text: &str) -> Segment {
        Segment::new(slot, text, Severity::Good)
    }

    #[test]
    fn duplicate_slot_is_rejected() {
        let result = Aggregator::with_slots(["disk", "clock", "disk"]);
        assert!(matches!(result, Err(SchedulerError::DuplicateSlot(name)) if name == "disk"));
    }

    #[test]
    fn unknown_slot_is_an_error() {
        let agg = Aggregator::with_slots(["disk"]).unwrap();
        assert_eq!(
            agg.update("gpu", seg("gpu", "?")),
            Err(UnknownSlot("gpu".into()))
        );
        assert!(agg.record_failure("gpu", "boom").is_err());
    }

    #[test]
    fn republish_keeps_last_update() {
        let agg = Aggregator::with_slots(["disk"]).unwrap();
        agg.update("disk", seg("disk", "D: 1")).unwrap();
        let updated = agg.slot_status()[0].last_update;
        assert!(updated.is_some());

        std::thread::sleep(std::time::Duration::from_millis(5));
        let snapshot = agg.republish("disk", seg("disk", "D: 1")).unwrap();
        assert_eq!(snapshot.sequence, 2);
        assert_eq!(agg.slot_status()[0].last_update, updated);
    }

    #[test]
    fn starts_with_empty_snapshot() {
        let agg = Aggregator::with_slots(["a", "b"]).unwrap();
        let snapshot = agg.current_snapshot();
        assert_eq!(snapshot.sequence, 0);
        assert!(snapshot.is_empty());
        assert_eq!(agg.len(), 2);
    }

    #[test]
    fn snapshots_follow_declared_order() {
        let agg = Aggregator::with_slots(["usb", "disk", "clock"]).unwrap();
        agg.update("clock", seg("clock", "12:00")).unwrap();
        agg.update("usb", seg("usb", "USB")).unwrap();
        let snapshot = agg.update("disk", seg("disk", "D")).unwrap();

        let slots: Vec<_> = snapshot.iter().map(|s| s.slot.as_str()).collect();
        assert_eq!(slots, vec!["usb", "disk", "clock"]);
    }

    #[test]
    fn sequence_strictly_increases() {
        let agg = Aggregator::with_slots(["a"]).unwrap();
        let mut last = 0;
        for i in 0..5 {
            let snapshot = agg.update("a", seg("a", &i.to_string())).unwrap();
            assert!(snapshot.sequence > last);
            last = snapshot.sequence;
        }
        assert_eq!(agg.current_snapshot().sequence, last);
    }

    #[test]
    fn suppressed_slot_is_elided_and_can_reappear() {
        let agg = Aggregator::with_slots(["wifi", "clock"]).unwrap();
        agg.update("clock", seg("clock", "12:00")).unwrap();
        agg.update("wifi", seg("wifi", "W: up")).unwrap();

        let hidden = agg.update("wifi", Segment::suppressed("wifi")).unwrap();
        assert!(hidden.get("wifi").is_none());
        assert_eq!(hidden.len(), 1);

        let shown = agg.update("wifi", seg("wifi", "W: up")).unwrap();
        assert_eq!(shown.get("wifi").unwrap().text, "W: up");

        // Suppression never unregisters the slot
        assert_eq!(agg.slot_status().len(), 2);
    }

    #[test]
    fn subscriber_sees_every_snapshot_in_order() {
        let agg = Aggregator::with_slots(["a", "b"]).unwrap();
        let mut rx = agg.subscribe();

        for i in 0..10 {
            let slot = if i % 2 == 0 { "a" } else { "b" };
            agg.update(slot, seg(slot, &i.to_string())).unwrap();
        }

        let mut sequences = Vec::new();
        while let Ok(snapshot) = rx.try_recv() {
            sequences.push(snapshot.sequence);
        }
        assert_eq!(sequences, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let agg = Aggregator::with_slots(["a"]).unwrap();
        drop(agg.subscribe());
        agg.update("a", seg("a", "x")).unwrap();
        assert!(agg.inner.lock().subscribers.is_empty());
    }

    #[test]
    fn failure_streaks() {
        let agg = Aggregator::with_slots(["disk"]).unwrap();
        assert_eq!(agg.record_failure("disk", "timeout").unwrap(), 1);
        assert_eq!(agg.record_failure("disk", "timeout").unwrap(), 2);

        let status = &agg.slot_status()[0];
        assert_eq!(status.consecutive_failures, 2);
        assert_eq!(status.last_error.as_deref(), Some("timeout"));

        agg.record_success("disk").unwrap();
        let status = &agg.slot_status()[0];
        assert_eq!(status.consecutive_failures, 0);
        assert!(status.last_error.is_none());
    }

    #[test]
    fn failures_do_not_emit_snapshots() {
        let agg = Aggregator::with_slots(["disk"]).unwrap();
        let mut rx = agg.subscribe();
        agg.record_failure("disk", "eio").unwrap();
        agg.mark_stopped("disk").unwrap();
        assert!(rx.try_recv().is_err());
        assert!(agg.slot_status()[0].stopped);
    }

    #[test]
    fn status_tracks_severity() {
        let agg = Aggregator::with_slots(["disk"]).unwrap();
        assert_eq!(agg.slot_status()[0].severity, None);
        agg.update("disk", Segment::new("disk", "D", Severity::Bad))
            .unwrap();
        let status = &agg.slot_status()[0];
        assert_eq!(status.severity, Some(Severity::Bad));
        assert!(status.last_update.is_some());
    }

    #[tokio::test]
    async fn watch_sees_latest() {
        let agg = Aggregator::with_slots(["a"]).unwrap();
        let mut rx = agg.watch();
        agg.update("a", seg("a", "1")).unwrap();
        agg.update("a", seg("a", "2")).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().sequence, 2);
    }
}
