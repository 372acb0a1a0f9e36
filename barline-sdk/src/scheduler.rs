//! The Scheduler: one task per slot, feeding the aggregator.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use barline_types::{ProviderKind, RawValue, Segment, Severity};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::aggregator::Aggregator;
use crate::error::{ProviderError, SchedulerError};
use crate::hook::{Transition, TransitionHook};
use crate::output::{publish, Sink};
use crate::provider::{Provider, PushProvider, UpdateSender};
use crate::rule::{Outcome, Rule};
use crate::shutdown::{shutdown_channel, Shutdown};

/// Upper bound on the default per-poll timeout.
pub const MAX_DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause before restarting a push provider that ended.
pub const DEFAULT_PUSH_RESTART_DELAY: Duration = Duration::from_secs(5);

const PUSH_BUFFER: usize = 16;

/// Where a slot's values come from.
#[derive(Clone)]
pub enum Source {
    /// Polled on a fixed interval.
    Poll {
        provider: Arc<dyn Provider>,
        interval: Duration,
        timeout: Duration,
    },
    /// Reports changes itself.
    Push(Arc<dyn PushProvider>),
}

impl Source {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Source::Poll { provider, .. } => provider.kind(),
            Source::Push(provider) => provider.kind(),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Poll {
                provider,
                interval,
                timeout,
            } => f
                .debug_struct("Poll")
                .field("kind", &provider.kind())
                .field("interval", interval)
                .field("timeout", timeout)
                .finish(),
            Source::Push(provider) => f.debug_tuple("Push").field(&provider.kind()).finish(),
        }
    }
}

/// A registered bar entry: a provider, its rule and optional hook.
#[derive(Clone)]
pub struct Slot {
    name: String,
    source: Source,
    rule: Rule,
    hook: Option<Arc<dyn TransitionHook>>,
    stale_after: Option<u32>,
}

impl Slot {
    /// A slot polled every `interval`.
    ///
    /// The poll timeout defaults to the interval, capped at ten seconds.
    pub fn polled(name: impl Into<String>, provider: Arc<dyn Provider>, interval: Duration) -> Self {
        Self::with_source(
            name,
            Source::Poll {
                provider,
                interval,
                timeout: interval.min(MAX_DEFAULT_TIMEOUT),
            },
        )
    }

    /// A slot fed by a push provider.
    pub fn pushed(name: impl Into<String>, provider: Arc<dyn PushProvider>) -> Self {
        Self::with_source(name, Source::Push(provider))
    }

    fn with_source(name: impl Into<String>, source: Source) -> Self {
        Self {
            name: name.into(),
            source,
            rule: Rule::new(Outcome::Suppress),
            hook: None,
            stale_after: None,
        }
    }

    /// Set the rule that maps raw values to segments.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rule = rule;
        self
    }

    /// Override the poll timeout. Ignored for push slots.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        if let Source::Poll { timeout: t, .. } = &mut self.source {
            *t = timeout;
        }
        self
    }

    /// Attach a severity transition hook.
    pub fn hook(mut self, hook: Arc<dyn TransitionHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Escalate failure logging after this many consecutive failures.
    pub fn stale_after(mut self, failures: u32) -> Self {
        self.stale_after = Some(failures);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Source {
        &self.source
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("hook", &self.hook.is_some())
            .field("stale_after", &self.stale_after)
            .finish()
    }
}

/// Runs every registered slot on its own cadence.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use async_trait::async_trait;
/// use barline_sdk::{shutdown_channel, Output, Provider, ProviderError, Scheduler, Slot};
/// use barline_types::{ProviderKind, RawValue};
///
/// struct Hello;
///
/// #[async_trait]
/// impl Provider for Hello {
///     fn kind(&self) -> ProviderKind {
///         ProviderKind::Clock
///     }
///
///     async fn poll(&self) -> Result<RawValue, ProviderError> {
///         Ok(RawValue::Clock("hello".into()))
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let (output, _rx) = Output::channel(16);
///     let mut scheduler = Scheduler::builder().sink(Box::new(output)).build();
///     scheduler
///         .register(Slot::polled("hello", Arc::new(Hello), Duration::from_secs(1)))
///         .unwrap();
///
///     let (trigger, shutdown) = shutdown_channel();
///     tokio::spawn(async move {
///         tokio::time::sleep(Duration::from_secs(5)).await;
///         trigger.trigger();
///     });
///     scheduler.run(shutdown).await.unwrap();
/// }
/// ```
pub struct Scheduler {
    aggregator: Arc<Aggregator>,
    slots: Vec<Slot>,
    sinks: Vec<Box<dyn Sink>>,
    push_restart_delay: Duration,
}

impl Scheduler {
    /// Create a scheduler with default settings and no sinks.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for configuring the scheduler.
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    /// Register a slot. Registration order is display order.
    pub fn register(&mut self, slot: Slot) -> Result<(), SchedulerError> {
        slot.rule
            .validate(slot.source.kind())
            .map_err(|source| SchedulerError::Rule {
                slot: slot.name.clone(),
                source,
            })?;
        self.aggregator.register(&slot.name)?;
        self.slots.push(slot);
        Ok(())
    }

    /// The aggregator slots report into.
    pub fn aggregator(&self) -> Arc<Aggregator> {
        self.aggregator.clone()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Run every slot until `shutdown` fires or a sink fails.
    pub async fn run(self, mut shutdown: Shutdown) -> Result<(), SchedulerError> {
        let Scheduler {
            aggregator,
            slots,
            mut sinks,
            push_restart_delay,
        } = self;

        // Subscribe before any slot can publish
        let snapshots = (!sinks.is_empty()).then(|| aggregator.subscribe());
        let (stop, slot_shutdown) = shutdown_channel();

        info!(slots = slots.len(), "starting slots");
        let mut tasks = JoinSet::new();
        for slot in slots {
            let runner = SlotRunner::new(&slot, aggregator.clone());
            let shutdown = slot_shutdown.clone();
            match slot.source {
                Source::Poll {
                    provider,
                    interval,
                    timeout,
                } => {
                    tasks.spawn(run_polled(runner, provider, interval, timeout, shutdown));
                }
                Source::Push(provider) => {
                    tasks.spawn(run_pushed(runner, provider, push_restart_delay, shutdown));
                }
            }
        }

        let result = match snapshots {
            None => {
                shutdown.wait().await;
                Ok(())
            }
            Some(snapshots) => tokio::select! {
                _ = shutdown.wait() => Ok(()),
                result = publish(snapshots, &mut sinks) => result.map_err(SchedulerError::from),
            },
        };

        stop.trigger();
        while tasks.join_next().await.is_some() {}

        match &result {
            Ok(()) => info!("all slots stopped"),
            Err(e) => warn!(error = %e, "stopped after sink failure"),
        }
        result
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("slots", &self.slots)
            .field("sinks", &self.sinks.len())
            .field("push_restart_delay", &self.push_restart_delay)
            .finish()
    }
}

/// Builder for configuring a Scheduler.
#[derive(Default)]
pub struct SchedulerBuilder {
    sinks: Vec<Box<dyn Sink>>,
    push_restart_delay: Option<Duration>,
}

impl SchedulerBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink.
    ///
    /// Multiple sinks can be added; each snapshot goes to all of them in order.
    pub fn sink(mut self, sink: Box<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Set the delay before a push provider is restarted.
    ///
    /// Defaults to 5 seconds if not specified.
    pub fn push_restart_delay(mut self, delay: Duration) -> Self {
        self.push_restart_delay = Some(delay);
        self
    }

    /// Build the scheduler.
    pub fn build(self) -> Scheduler {
        Scheduler {
            aggregator: Arc::new(Aggregator::new()),
            slots: Vec::new(),
            sinks: self.sinks,
            push_restart_delay: self.push_restart_delay.unwrap_or(DEFAULT_PUSH_RESTART_DELAY),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Per-slot state: the retained raw value and the last severity shown.
struct SlotRunner {
    name: String,
    rule: Rule,
    hook: Option<Arc<dyn TransitionHook>>,
    stale_after: Option<u32>,
    aggregator: Arc<Aggregator>,
    last_raw: Option<RawValue>,
    last_severity: Option<Severity>,
    escalated: bool,
}

impl SlotRunner {
    fn new(slot: &Slot, aggregator: Arc<Aggregator>) -> Self {
        Self {
            name: slot.name.clone(),
            rule: slot.rule.clone(),
            hook: slot.hook.clone(),
            stale_after: slot.stale_after,
            aggregator,
            last_raw: None,
            last_severity: None,
            escalated: false,
        }
    }

    /// Evaluate one poll outcome and publish exactly one update.
    fn apply(&mut self, outcome: Result<RawValue, ProviderError>) -> Flow {
        match outcome {
            Ok(raw) => {
                if let Err(e) = self.aggregator.record_success(&self.name) {
                    warn!(slot = %self.name, error = %e, "status not recorded");
                }
                if self.escalated {
                    info!(slot = %self.name, "provider recovered");
                    self.escalated = false;
                }
                let segment = self.rule.evaluate(&self.name, &raw);
                self.last_raw = Some(raw);
                self.publish(segment, true);
                Flow::Continue
            }
            Err(error @ ProviderError::Unavailable(_)) => {
                warn!(slot = %self.name, %error, "provider unavailable, stopping slot");
                if let Err(e) = self.aggregator.record_failure(&self.name, &error.to_string()) {
                    warn!(slot = %self.name, error = %e, "status not recorded");
                }
                self.last_raw = Some(RawValue::Unavailable);
                self.publish(Segment::suppressed(&self.name), true);
                if let Err(e) = self.aggregator.mark_stopped(&self.name) {
                    warn!(slot = %self.name, error = %e, "status not recorded");
                }
                Flow::Stop
            }
            Err(error) => {
                let failures = match self.aggregator.record_failure(&self.name, &error.to_string()) {
                    Ok(failures) => failures,
                    Err(e) => {
                        warn!(slot = %self.name, error = %e, "status not recorded");
                        0
                    }
                };
                match self.stale_after {
                    Some(limit) if failures >= limit && !self.escalated => {
                        warn!(slot = %self.name, failures, %error, "provider keeps failing, showing stale value");
                        self.escalated = true;
                    }
                    _ => debug!(slot = %self.name, failures, %error, "poll failed"),
                }

                let segment = match &self.last_raw {
                    Some(raw) => self.rule.evaluate(&self.name, raw),
                    None => Segment::suppressed(&self.name),
                };
                self.publish(segment, false);
                Flow::Continue
            }
        }
    }

    /// `fresh` is false when the segment comes from a retained value.
    fn publish(&mut self, segment: Segment, fresh: bool) {
        if self.last_severity != Some(segment.severity) {
            if let Some(hook) = &self.hook {
                hook.on_transition(&Transition {
                    slot: &self.name,
                    from: self.last_severity,
                    to: segment.severity,
                    segment: &segment,
                });
            }
            self.last_severity = Some(segment.severity);
        }

        let result = if fresh {
            self.aggregator.update(&self.name, segment)
        } else {
            self.aggregator.republish(&self.name, segment)
        };
        if let Err(e) = result {
            warn!(slot = %self.name, error = %e, "update rejected");
        }
    }
}

async fn run_polled(
    mut runner: SlotRunner,
    provider: Arc<dyn Provider>,
    interval: Duration,
    timeout: Duration,
    mut shutdown: Shutdown,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            _ = ticker.tick() => {}
        }

        let outcome = tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            result = tokio::time::timeout(timeout, provider.poll()) => {
                result.unwrap_or(Err(ProviderError::Timeout(timeout)))
            }
        };

        if runner.apply(outcome) == Flow::Stop {
            break;
        }
    }
    debug!(slot = %runner.name, "slot loop ended");
}

async fn run_pushed(
    mut runner: SlotRunner,
    provider: Arc<dyn PushProvider>,
    restart_delay: Duration,
    mut shutdown: Shutdown,
) {
    loop {
        let (updates, mut rx) = UpdateSender::channel(PUSH_BUFFER);
        let run = provider.run(updates);
        tokio::pin!(run);

        let result = loop {
            tokio::select! {
                biased;
                _ = shutdown.wait() => return,
                Some(raw) = rx.recv() => {
                    if runner.apply(Ok(raw)) == Flow::Stop {
                        return;
                    }
                }
                result = &mut run => break result,
            }
        };

        // Values sent just before the provider returned
        while let Ok(raw) = rx.try_recv() {
            if runner.apply(Ok(raw)) == Flow::Stop {
                return;
            }
        }

        match result {
            Ok(()) => debug!(slot = %runner.name, "push provider ended"),
            Err(error) => {
                if runner.apply(Err(error)) == Flow::Stop {
                    return;
                }
            }
        }

        tokio::select! {
            biased;
            _ = shutdown.wait() => return,
            _ = tokio::time::sleep(restart_delay) => {
                debug!(slot = %runner.name, "restarting push provider");
            }
        }
    }
}
