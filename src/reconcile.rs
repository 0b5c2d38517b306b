//! Remote-state reconciliation
//!
//! Before any file is uploaded the remote target path must be resolved to a
//! known state: created if absent, rejected if it exists as something other
//! than a directory, or cleared if it is one. Upload never proceeds into a
//! target whose prior state was not resolved.

use crate::config::DeployConfig;
use crate::error::{DeployError, DeployResult};
use crate::prompt::PromptGateway;
use crate::transfer::{RemoteState, RemoteTransport};
use crate::ui;

/// Decide and mutate the state of `config.remote_path` ahead of the upload.
pub fn reconcile(
    transport: &mut dyn RemoteTransport,
    prompt: &mut dyn PromptGateway,
    config: &DeployConfig,
) -> DeployResult<()> {
    match transport.probe(&config.remote_path)? {
        RemoteState::Absent => {
            let create = prompt.confirm("The remote path does not exist, create the directory?", true)?;
            if !create {
                return Err(DeployError::Aborted);
            }
            transport.make_dir_all(&config.remote_path)
        }
        RemoteState::NotDirectory => Err(DeployError::RemotePathConflict {
            path: config.remote_path.clone(),
        }),
        RemoteState::Directory => {
            if config.always_overwrite {
                ui::info("Emptying the remote directory (always_overwrite is set)...");
                return transport.remove_dir_all(&config.remote_path);
            }

            let empty = prompt.confirm("Do you need to empty the remote directory first?", true)?;
            if !empty {
                // Uploading over unknown leftovers has ambiguous semantics
                return Err(DeployError::Aborted);
            }
            transport.remove_dir_all(&config.remote_path)
        }
    }
}
