//! skiff CLI - deploy production files to a server over SFTP
//!
//! Usage: skiff deploy <run|init>

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use skiff::{ui, Deployer};

/// skiff - interactive SFTP deployment tool
#[derive(Parser, Debug)]
#[command(name = "skiff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Deploy production files to a server over SFTP
    Deploy {
        #[command(subcommand)]
        operation: DeployOp,
    },
}

#[derive(Subcommand, Debug)]
enum DeployOp {
    /// Run a deployment with the config file in the current directory
    Run,
    /// Create a deploy config file interactively
    Init,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // The single point mapping a terminal outcome to an exit code
            ui::error(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

fn real_main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Deploy { operation } => {
            ui::banner();
            let mut deployer = Deployer::current_dir()?;
            match operation {
                DeployOp::Run => deployer.run()?,
                DeployOp::Init => deployer.init()?,
            }
        }
    }

    Ok(())
}
