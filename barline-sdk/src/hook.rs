//! Side effects on severity changes.

use barline_types::{Segment, Severity};

/// A change of severity on one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<'a> {
    pub slot: &'a str,
    /// `None` for the first segment a slot produces.
    pub from: Option<Severity>,
    pub to: Severity,
    pub segment: &'a Segment,
}

/// Called by the scheduler after evaluation when a slot's severity changes.
///
/// Hooks run inline on the slot's task and must not block; spawn anything
/// slow. They cannot change the segment.
pub trait TransitionHook: Send + Sync {
    fn on_transition(&self, transition: &Transition<'_>);
}
