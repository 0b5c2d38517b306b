//! Deployment orchestrator
//!
//! Composes the config store, prompt gateway, hook runner, reconciler and
//! transfer engine into the two workflows behind the CLI:
//!
//! - `run`:  resolve config -> validate fields -> validate local path ->
//!           before hooks -> connect -> reconcile -> upload -> disconnect ->
//!           after hooks -> done
//! - `init`: interactive config creation, optionally followed by a run that
//!           reuses the in-memory config.
//!
//! Every fallible step returns a typed error; `main` is the only place an
//! exit code is produced. The remote connection is closed on every path out
//! of the transfer section.

use std::path::Path;

use crate::config::{ConfigStore, DeployConfig, Hooks, CONFIG_FILE};
use crate::error::{DeployError, DeployResult};
use crate::hooks::run_hooks;
use crate::prompt::{PromptGateway, TermPrompt};
use crate::reconcile::reconcile;
use crate::transfer::{RemoteTransport, TransferEngine};
use crate::ui;

/// How interactive config creation was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    /// Fallback from `deploy run` when no config file exists
    Normal,
    /// `deploy init`
    Direct,
}

pub struct Deployer<P: PromptGateway> {
    store: ConfigStore,
    prompt: P,
}

impl Deployer<TermPrompt> {
    /// Deployer rooted at the process working directory with terminal prompts.
    pub fn current_dir() -> std::io::Result<Self> {
        Ok(Self::with_parts(ConfigStore::current_dir()?, TermPrompt))
    }
}

impl<P: PromptGateway> Deployer<P> {
    pub fn with_parts(store: ConfigStore, prompt: P) -> Self {
        Self { store, prompt }
    }

    /// `skiff deploy run`: full run with config load.
    pub fn run(&mut self) -> DeployResult<()> {
        let config = if self.store.exists() {
            ui::info("Checking config file...");
            self.store.load()?
        } else {
            ui::error(&format!("Cannot find {CONFIG_FILE} in the current path."));
            match self.create_config(CreateMode::Normal)? {
                Some(config) => config,
                None => return Ok(()),
            }
        };
        self.deploy(&config)
    }

    /// `skiff deploy init`: create the config, then optionally deploy with it.
    pub fn init(&mut self) -> DeployResult<()> {
        match self.create_config(CreateMode::Direct)? {
            Some(config) => self.deploy(&config),
            None => Ok(()),
        }
    }

    /// Interactive config creation.
    ///
    /// Returns `Some(config)` when the operator chose to deploy immediately,
    /// `None` when creation succeeded and no deployment should follow.
    fn create_config(&mut self, mode: CreateMode) -> DeployResult<Option<DeployConfig>> {
        match mode {
            CreateMode::Normal => {
                if !self
                    .prompt
                    .confirm("Do you want to create a deploy config file?", true)?
                {
                    return Err(DeployError::Aborted);
                }
            }
            CreateMode::Direct => {
                if self.store.exists()
                    && !self.prompt.confirm(
                        &format!("{CONFIG_FILE} already exists, overwrite it?"),
                        false,
                    )?
                {
                    return Err(DeployError::Aborted);
                }
            }
        }

        ui::info("Now we need some information for deploying.");
        let host = self.prompt.input("Hostname", None)?;
        let port = self.prompt.port("Port", 22)?;
        let username = self.prompt.input("Login username", Some("root"))?;
        let password = self.prompt.password("Login password")?;
        let local_path = self.prompt.input("Local production directory", None)?;
        let remote_path = self.prompt.input("Remote directory", None)?;
        let always_overwrite = self
            .prompt
            .confirm("Always empty the remote directory without asking?", false)?;

        let config = DeployConfig {
            host,
            port,
            username,
            password,
            local_path,
            remote_path,
            always_overwrite,
            shell_before_deploy: Hooks::Unset,
            shell_after_deploy: Hooks::Unset,
        };

        ui::info("Here is what you entered:");
        ui::info(&format!("  host:             {}", config.host));
        ui::info(&format!("  port:             {}", config.port));
        ui::info(&format!("  username:         {}", config.username));
        ui::info(&format!(
            "  password:         {}",
            ui::mask_secret(&config.password)
        ));
        ui::info(&format!("  local_path:       {}", config.local_path));
        ui::info(&format!("  remote_path:      {}", config.remote_path));
        ui::info(&format!("  always_overwrite: {}", config.always_overwrite));

        let confirmed = self.prompt.confirm("Is everything right?", true)?;
        // The file is written whichever way the answer went
        self.store.save(&config)?;
        self.store.append_to_ignore_file();
        ui::success("Config file created.");
        if !confirmed {
            return Err(DeployError::Aborted);
        }

        if self
            .prompt
            .confirm("Deploy your files immediately with this config?", true)?
        {
            Ok(Some(config))
        } else {
            Ok(None)
        }
    }

    /// One deployment run against an already-resolved config.
    fn deploy(&mut self, config: &DeployConfig) -> DeployResult<()> {
        config.validate()?;
        config.check_local_path()?;

        run_hooks("before-deploy", &config.shell_before_deploy);

        ui::info(&format!("Connecting to {}:{}...", config.host, config.port));
        let engine = TransferEngine::connect(config)?;
        self.deploy_with_engine(engine, config)?;

        run_hooks("after-deploy", &config.shell_after_deploy);

        ui::success("Your files are deployed.");
        Ok(())
    }

    /// Reconcile and upload over an open connection, closing it on every
    /// path. A transfer error takes precedence over a disconnect error.
    fn deploy_with_engine<T: RemoteTransport>(
        &mut self,
        mut engine: TransferEngine<T>,
        config: &DeployConfig,
    ) -> DeployResult<()> {
        let transferred = self.reconcile_and_upload(&mut engine, config);
        let closed = engine.finish();
        transferred?;
        closed
    }

    fn reconcile_and_upload<T: RemoteTransport>(
        &mut self,
        engine: &mut TransferEngine<T>,
        config: &DeployConfig,
    ) -> DeployResult<()> {
        reconcile(engine.transport_mut(), &mut self.prompt, config)?;
        engine.upload_dir(
            Path::new(&config.local_path),
            &config.remote_path,
            &mut |event| {
                ui::info(&format!("Uploaded: {}", event.source.display()));
            },
        )
    }
}
