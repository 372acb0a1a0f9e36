//! Running a command when a slot changes severity.

use std::collections::HashSet;

use barline_sdk::{Severity, Transition, TransitionHook};
use tokio::process::Command;

use crate::config::NotifyConfig;

/// Spawns a command (e.g. `notify-send`) when a slot enters one of the
/// configured severities.
///
/// The command sees `BARLINE_SLOT`, `BARLINE_SEVERITY`, `BARLINE_PREVIOUS`
/// and `BARLINE_TEXT` in its environment. It runs detached; a failure is
/// logged and never affects the slot.
#[derive(Debug, Clone)]
pub struct CommandHook {
    on: HashSet<Severity>,
    program: String,
    args: Vec<String>,
}

impl CommandHook {
    /// `None` when the command is empty.
    pub fn new(on: impl IntoIterator<Item = Severity>, command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            on: on.into_iter().collect(),
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn from_config(config: &NotifyConfig) -> Option<Self> {
        Self::new(config.on.iter().copied(), &config.command)
    }

    /// Whether this transition should run the command.
    pub fn fires_on(&self, transition: &Transition<'_>) -> bool {
        self.on.contains(&transition.to)
    }

    fn command(&self, transition: &Transition<'_>) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .env("BARLINE_SLOT", transition.slot)
            .env("BARLINE_SEVERITY", transition.to.as_str())
            .env(
                "BARLINE_PREVIOUS",
                transition.from.map(|s| s.as_str()).unwrap_or(""),
            )
            .env("BARLINE_TEXT", &transition.segment.text)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null());
        command
    }
}

impl TransitionHook for CommandHook {
    fn on_transition(&self, transition: &Transition<'_>) {
        if !self.fires_on(transition) {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(slot = transition.slot, "no runtime to run notify command on");
            return;
        };

        let mut command = self.command(transition);
        let program = self.program.clone();
        let slot = transition.slot.to_string();
        runtime.spawn(async move {
            match command.status().await {
                Ok(status) if status.success() => {
                    tracing::debug!(slot = %slot, program = %program, "notify command ran");
                }
                Ok(status) => {
                    tracing::warn!(slot = %slot, program = %program, %status, "notify command failed");
                }
                Err(e) => {
                    tracing::warn!(slot = %slot, program = %program, error = %e, "notify command could not start");
                }
            }
        });
    }
}
