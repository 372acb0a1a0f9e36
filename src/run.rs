//! Running the scheduler next to a foreground loop.

use std::sync::Arc;

use anyhow::Result;
use barline_sdk::{Scheduler, Shutdown, ShutdownTrigger};

/// Run `scheduler` in the background and `foreground` on a blocking thread.
///
/// `foreground` gets a listener for the shutdown signal and should return
/// once it fires. The signal fires when the foreground returns, and also as
/// soon as the scheduler stops on its own (a sink failed), so neither side
/// outlives the other. A scheduler error takes precedence over a
/// foreground one.
pub async fn run_alongside<F>(
    scheduler: Scheduler,
    trigger: Arc<ShutdownTrigger>,
    shutdown: Shutdown,
    foreground: F,
) -> Result<()>
where
    F: FnOnce(Shutdown) -> Result<()> + Send + 'static,
{
    let listener = trigger.subscribe();

    let stop = trigger.clone();
    let running = tokio::spawn(async move {
        let result = scheduler.run(shutdown).await;
        if let Err(ref e) = result {
            tracing::error!(error = %e, "scheduler stopped");
        }
        stop.trigger();
        result
    });

    let foreground = tokio::task::spawn_blocking(move || foreground(listener)).await?;

    trigger.trigger();
    running.await??;
    foreground
}
