//! skiff - interactive SFTP deployment tool
//!
//! Skiff synchronizes a local production directory to a remote server over
//! SFTP, driven by a small persisted JSON configuration and interactive
//! prompts. One run is strictly sequential: validate the config, run any
//! before-deploy hooks, connect, reconcile the remote target directory,
//! upload, run after-deploy hooks.

pub mod config;
pub mod deploy;
pub mod error;
pub mod hooks;
pub mod prompt;
pub mod reconcile;
pub mod transfer;
pub mod ui;

// Re-exports for convenience
pub use config::{ConfigStore, DeployConfig, Hooks, CONFIG_FILE};
pub use deploy::{CreateMode, Deployer};
pub use error::{DeployError, DeployResult};
pub use prompt::{PromptGateway, TermPrompt};
pub use reconcile::reconcile;
pub use transfer::{RemoteState, RemoteTransport, TransferEngine, UploadEvent};
