//! Preview state and navigation logic.

use std::sync::Arc;
use std::time::Instant;

use barline_sdk::{Aggregator, Segment, SlotStatus, Snapshot};
use tokio::sync::watch;

use crate::theme::Theme;

/// State of the terminal preview.
///
/// Follows the aggregator's latest snapshot and its per-slot status table.
pub struct App {
    pub running: bool,
    pub show_help: bool,

    pub snapshot: Arc<Snapshot>,
    pub slots: Vec<SlotStatus>,
    pub last_update: Option<Instant>,

    pub selected: usize,
    pub separator: String,
    pub theme: Theme,

    snapshots: watch::Receiver<Arc<Snapshot>>,
    aggregator: Arc<Aggregator>,
}

impl App {
    pub fn new(aggregator: Arc<Aggregator>, separator: impl Into<String>, theme: Theme) -> Self {
        let snapshots = aggregator.watch();
        Self {
            running: true,
            show_help: false,
            snapshot: aggregator.current_snapshot(),
            slots: aggregator.slot_status(),
            last_update: None,
            selected: 0,
            separator: separator.into(),
            theme,
            snapshots,
            aggregator,
        }
    }

    /// Pick up the latest snapshot and slot status.
    ///
    /// Returns true if a new snapshot arrived since the last call.
    pub fn refresh(&mut self) -> bool {
        self.slots = self.aggregator.slot_status();
        if self.selected >= self.slots.len() {
            self.selected = self.slots.len().saturating_sub(1);
        }

        match self.snapshots.has_changed() {
            Ok(true) => {
                self.snapshot = self.snapshots.borrow_and_update().clone();
                self.last_update = Some(Instant::now());
                true
            }
            _ => false,
        }
    }

    /// The visible segment of a slot, if any.
    pub fn segment(&self, slot: &str) -> Option<&Segment> {
        self.snapshot.get(slot)
    }

    pub fn selected_status(&self) -> Option<&SlotStatus> {
        self.slots.get(self.selected)
    }

    pub fn select_next(&mut self) {
        let max = self.slots.len().saturating_sub(1);
        self.selected = (self.selected + 1).min(max);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.slots.len().saturating_sub(1);
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the preview to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }
}
