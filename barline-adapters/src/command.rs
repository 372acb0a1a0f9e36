//! Running small helper programs.

use std::io;

use tokio::process::Command;

use crate::AdapterError;

/// Run a program and return its stdout.
///
/// A missing binary is [`AdapterError::NotFound`]; a non-zero exit is
/// [`AdapterError::Command`].
pub(crate) async fn output(program: &str, args: &[&str]) -> Result<String, AdapterError> {
    let out = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => AdapterError::NotFound(program.to_string()),
            _ => AdapterError::Command {
                program: program.to_string(),
                reason: e.to_string(),
            },
        })?;

    if !out.status.success() {
        return Err(AdapterError::Command {
            program: program.to_string(),
            reason: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}
