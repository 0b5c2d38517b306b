//! Shell hook runner
//!
//! Runs operator-supplied commands before and after the transfer. Hook
//! failures are deliberately non-fatal: a failing command is surfaced at
//! warning level and the sequence continues, matching the tool's historical
//! behavior. A malformed hook value is the one recoverable configuration
//! error: it is reported and the hook stage is skipped entirely.

use std::process::Command;

use crate::config::Hooks;
use crate::error::DeployError;
use crate::ui;

/// Execute the hook commands for one stage, in list order, synchronously.
pub fn run_hooks(stage: &'static str, hooks: &Hooks) {
    let commands = match hooks {
        Hooks::Unset => return,
        Hooks::Invalid => {
            ui::error(&DeployError::HookConfigInvalid { stage }.to_string());
            return;
        }
        Hooks::Commands(commands) => commands,
    };

    for command in commands {
        ui::info(&format!("Running {stage} hook: {command}"));
        match shell_command(command).status() {
            Ok(status) if status.success() => {}
            Ok(status) => {
                ui::warn(&format!(
                    "{stage} hook '{command}' exited with {status}; continuing"
                ));
            }
            Err(err) => {
                ui::warn(&format!(
                    "{stage} hook '{command}' could not be started: {err}; continuing"
                ));
            }
        }
    }
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
