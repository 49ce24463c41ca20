//! CLI argument parsing for blueprint-lock.
//!
//! Uses clap derive macros; the implementations live in `commands`.

use crate::config::Overrides;
use clap::{Args, Parser, Subcommand};

/// Take, inspect and release Apstra blueprint mutexes.
///
/// A blueprint mutex signals exclusive access to a blueprint. Cooperating
/// tools take it before changing the blueprint and release it afterwards.
#[derive(Parser, Debug)]
#[command(name = "blueprint-lock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection options shared by all commands.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Apstra URL, e.g. `https://<user>:<password>@apstra.example.com:443/`.
    /// Falls back to APSTRA_URL.
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Disable TLS certificate validation.
    #[arg(long, global = true)]
    pub tls_validation_disabled: bool,

    /// Skip locking; every lock request succeeds without touching Apstra.
    #[arg(long, global = true)]
    pub mutex_disabled: bool,
}

impl From<&GlobalArgs> for Overrides {
    fn from(args: &GlobalArgs) -> Self {
        Self {
            url: args.url.clone(),
            tls_validation_disabled: args.tls_validation_disabled,
            mutex_disabled: args.mutex_disabled,
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Lock a blueprint and leave it locked.
    ///
    /// Prints the owner identity needed to unlock it later.
    Lock(LockArgs),

    /// Release a blueprint lock.
    Unlock(UnlockArgs),

    /// Show who holds a blueprint lock.
    Status(StatusArgs),

    /// Lock a blueprint, run a command, then release the lock.
    Run(RunArgs),
}

/// Arguments for the `lock` command.
#[derive(Args, Debug)]
pub struct LockArgs {
    /// Blueprint ID
    pub blueprint_id: String,

    /// Owner identity; a random one is generated when omitted.
    #[arg(long)]
    pub owner: Option<String>,

    /// Free-text details stored with the lock.
    #[arg(long)]
    pub details: Option<String>,

    /// Give up after this many seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Evict the current holder instead of waiting.
    #[arg(long, conflicts_with = "timeout")]
    pub force: bool,
}

/// Arguments for the `unlock` command.
#[derive(Args, Debug)]
pub struct UnlockArgs {
    /// Blueprint ID
    pub blueprint_id: String,

    /// Owner identity used when the lock was taken.
    #[arg(long, required_unless_present = "force", conflicts_with = "force")]
    pub owner: Option<String>,

    /// Release the lock regardless of who holds it.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `status` command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Blueprint ID
    pub blueprint_id: String,
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Blueprint ID
    pub blueprint_id: String,

    /// Give up waiting for the lock after this many seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Command to run while the lock is held.
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
