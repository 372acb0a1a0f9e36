//! # barline-sdk
//!
//! The scheduling core of barline: polls providers on independent
//! schedules, maps their readings to colored segments through rules, and
//! publishes ordered snapshots of the whole bar.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use async_trait::async_trait;
//! use barline_sdk::{
//!     shutdown_channel, Outcome, Output, Provider, ProviderError, Rule, Scheduler, Slot, Template,
//! };
//! use barline_types::{LoadAverage, ProviderKind, RawValue, Severity};
//!
//! struct Load;
//!
//! #[async_trait]
//! impl Provider for Load {
//!     fn kind(&self) -> ProviderKind {
//!         ProviderKind::LoadAverage
//!     }
//!
//!     async fn poll(&self) -> Result<RawValue, ProviderError> {
//!         Ok(RawValue::Load(LoadAverage { one: 0.5, five: 0.4, fifteen: 0.3 }))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (output, mut rx) = Output::channel(16);
//!     let mut scheduler = Scheduler::builder().sink(Box::new(output)).build();
//!
//!     let rule = Rule::new(Outcome::show(Template::parse("C: {load1:.2}").unwrap(), Severity::Good));
//!     scheduler
//!         .register(Slot::polled("load", Arc::new(Load), Duration::from_secs(5)).rule(rule))
//!         .unwrap();
//!
//!     let (_trigger, shutdown) = shutdown_channel();
//!     tokio::spawn(scheduler.run(shutdown));
//!
//!     while let Some(snapshot) = rx.recv().await {
//!         println!("{}", snapshot.text(" | "));
//!     }
//! }
//! ```
//!
//! ## Guarantees
//!
//! - **Isolation**: every slot runs in its own task; a hung provider only
//!   affects its own slot, bounded by the poll timeout
//! - **Ordering**: snapshot sequence numbers strictly increase, and sinks
//!   see every snapshot in that order
//! - **Stale-but-shown**: a failed poll keeps the last good value on screen

mod aggregator;
mod error;
mod hook;
mod output;
mod provider;
mod rule;
mod scheduler;
mod shutdown;
mod template;

pub use aggregator::{Aggregator, SlotStatus};
pub use error::{ProviderError, RuleError, SchedulerError, SinkError, UnknownSlot};
pub use hook::{Transition, TransitionHook};
pub use output::{publish, Output, Sink, TCP_CONNECT_TIMEOUT, TCP_RECONNECT_BACKOFF};
pub use provider::{Provider, PushProvider, UpdateSender};
pub use rule::{parse_size, CompareOp, Condition, Literal, Outcome, Predicate, Rule};
pub use scheduler::{
    Scheduler, SchedulerBuilder, Slot, Source, DEFAULT_PUSH_RESTART_DELAY, MAX_DEFAULT_TIMEOUT,
};
pub use shutdown::{shutdown_channel, Shutdown, ShutdownTrigger};
pub use template::{Template, TemplateError};

// Re-export types for convenience
pub use barline_types::{RawValue, Segment, Severity, Snapshot};
