//! Command implementations.
//!
//! `dispatch` connects to Apstra; the command bodies only see an
//! [`ApstraClientTrait`] and a writer for their report.

use crate::cli::{Command, LockArgs, RunArgs, StatusArgs, UnlockArgs};
use crate::config::Config;
use anyhow::{Context, Result, bail};
use apstra_client::{ApstraClient, ApstraClientTrait};
use blueprint_mutex::{
    BlueprintLocker, BlueprintMutex, DEFAULT_DETAILS, LockMessage, MutexHandle, TryLock, lock,
};
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Dispatch a parsed command.
pub async fn dispatch(command: Command, config: &Config, cancel: &CancellationToken) -> Result<ExitCode> {
    let mut out = std::io::stdout();
    match command {
        Command::Lock(args) => {
            if config.mutex_disabled {
                warn!("Blueprint mutex disabled, not locking {}", args.blueprint_id);
                return Ok(ExitCode::SUCCESS);
            }
            lock_cmd(args, connect(config).await?, cancel, &mut out).await?;
        }
        Command::Unlock(args) => {
            if config.mutex_disabled {
                warn!("Blueprint mutex disabled, not unlocking {}", args.blueprint_id);
                return Ok(ExitCode::SUCCESS);
            }
            unlock_cmd(args, connect(config).await?, &mut out).await?;
        }
        Command::Status(args) => status_cmd(args, connect(config).await?, &mut out).await?,
        Command::Run(args) => {
            let client = if config.mutex_disabled {
                // never used: a disabled locker makes no API calls
                Arc::new(new_client(config)?)
            } else {
                connect(config).await?
            };
            let code = run_cmd(args, client, !config.mutex_disabled, cancel).await?;
            return Ok(ExitCode::from(code));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn new_client(config: &Config) -> Result<ApstraClient> {
    ApstraClient::new(
        config.url.clone(),
        config.username.clone(),
        config.password.clone(),
        config.tls_validation_disabled,
    )
    .context("unable to create client")
}

async fn connect(config: &Config) -> Result<Arc<ApstraClient>> {
    let client = new_client(config)?;
    client.login().await.context("apstra login failure")?;
    Ok(Arc::new(client))
}

fn deadline(timeout: Option<u64>) -> Option<Instant> {
    timeout.map(|secs| Instant::now() + Duration::from_secs(secs))
}

async fn ensure_blueprint<C: ApstraClientTrait + ?Sized>(client: &C, blueprint_id: &str) -> Result<()> {
    if !client.blueprint_exists(blueprint_id).await? {
        bail!("blueprint {} not found", blueprint_id);
    }
    Ok(())
}

async fn lock_cmd<C, W>(args: LockArgs, client: Arc<C>, cancel: &CancellationToken, out: &mut W) -> Result<()>
where
    C: ApstraClientTrait + ?Sized,
    W: Write,
{
    ensure_blueprint(client.as_ref(), &args.blueprint_id).await?;

    let mut message = LockMessage::generate();
    if let Some(owner) = args.owner {
        message.owner = owner;
    }
    message.details = args.details.unwrap_or_else(|| DEFAULT_DETAILS.to_string());

    let mut mutex = BlueprintMutex::new(client, args.blueprint_id);
    mutex.set_message(&message)?;

    if args.force {
        match mutex.try_lock(true).await? {
            TryLock::Acquired => {}
            TryLock::Contended(holder) => bail!(
                "blueprint {} was locked again while forcing: {}",
                mutex.blueprint_id(),
                holder.unwrap_or_default()
            ),
        }
    } else {
        lock(&mutex, cancel, deadline(args.timeout))
            .await
            .with_context(|| format!("error locking blueprint {:?} mutex", mutex.blueprint_id()))?;
    }

    writeln!(out, "locked blueprint {} as owner {}", mutex.blueprint_id(), message.owner)?;
    Ok(())
}

async fn unlock_cmd<C, W>(args: UnlockArgs, client: Arc<C>, out: &mut W) -> Result<()>
where
    C: ApstraClientTrait + ?Sized,
    W: Write,
{
    let mut mutex = BlueprintMutex::new(client, args.blueprint_id);

    if args.force {
        mutex.clear_unsafely().await?;
        writeln!(out, "cleared blueprint {} mutex", mutex.blueprint_id())?;
        return Ok(());
    }

    let owner = args.owner.unwrap_or_default();
    mutex.set_message(&LockMessage::new(owner, ""))?;
    let released = mutex
        .unlock()
        .await
        .with_context(|| format!("error unlocking blueprint {:?} mutex", mutex.blueprint_id()))?;

    if released {
        writeln!(out, "unlocked blueprint {}", mutex.blueprint_id())?;
    } else {
        writeln!(out, "blueprint {} was not locked", mutex.blueprint_id())?;
    }
    Ok(())
}

async fn status_cmd<C, W>(args: StatusArgs, client: Arc<C>, out: &mut W) -> Result<()>
where
    C: ApstraClientTrait + ?Sized,
    W: Write,
{
    let mutex = BlueprintMutex::new(client, args.blueprint_id);
    let id = mutex.blueprint_id();

    match mutex.holder().await? {
        None => writeln!(out, "blueprint {}: unlocked", id)?,
        Some(raw) => match LockMessage::decode(&raw) {
            Ok(holder) => writeln!(out, "blueprint {}: locked by {} ({})", id, holder.owner, holder.details)?,
            Err(_) => writeln!(out, "blueprint {}: locked: {}", id, raw)?,
        },
    }
    Ok(())
}

/// Hold the lock while the child runs; returns the exit status to report
async fn run_cmd<C: ApstraClientTrait + ?Sized>(
    args: RunArgs,
    client: Arc<C>,
    enabled: bool,
    cancel: &CancellationToken,
) -> Result<u8> {
    let Some((program, program_args)) = args.command.split_first() else {
        bail!("no command given");
    };

    let locker = BlueprintLocker::new(client, enabled);
    locker
        .lock_blueprint(&args.blueprint_id, cancel, deadline(args.timeout))
        .await
        .with_context(|| format!("error locking blueprint {:?} mutex", args.blueprint_id))?;
    info!("Running {} while holding blueprint {}", program, args.blueprint_id);

    let status = tokio::process::Command::new(program)
        .args(program_args)
        .status()
        .await;

    for (id, e) in locker.release_all().await {
        warn!("error unlocking blueprint {:?} mutex: {}", id, e);
    }

    let status = status.with_context(|| format!("failed to run {}", program))?;
    Ok(exit_status(status.code()))
}

/// Child exit code as a process exit status; signals and out-of-range codes map to 1
fn exit_status(code: Option<i32>) -> u8 {
    code.and_then(|c| u8::try_from(c).ok()).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apstra_client::MockApstraClient;
    use blueprint_mutex::MUTEX_TAG_PREFIX;

    async fn client_with_blueprint(id: &str) -> Arc<MockApstraClient> {
        let client = Arc::new(MockApstraClient::new("http://test-apstra"));
        client.add_blueprint(id).await;
        client
    }

    async fn hold(client: &MockApstraClient, id: &str, owner: &str) {
        let message = LockMessage::new(owner, "applying").encode().unwrap();
        client.add_tag(format!("{}{}", MUTEX_TAG_PREFIX, id), message).await;
    }

    async fn holder_owner(client: &MockApstraClient, id: &str) -> Option<String> {
        let tag = client
            .get_tag_by_label(&format!("{}{}", MUTEX_TAG_PREFIX, id))
            .await
            .unwrap()?;
        Some(LockMessage::decode(&tag.description.unwrap_or_default()).unwrap().owner)
    }

    fn output(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    fn lock_args(id: &str, owner: &str, force: bool) -> LockArgs {
        LockArgs {
            blueprint_id: id.to_string(),
            owner: Some(owner.to_string()),
            details: None,
            timeout: None,
            force,
        }
    }

    fn run_args(id: &str, command: &[&str]) -> RunArgs {
        RunArgs {
            blueprint_id: id.to_string(),
            timeout: None,
            command: command.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_exit_status_mapping() {
        assert_eq!(exit_status(Some(0)), 0);
        assert_eq!(exit_status(Some(3)), 3);
        assert_eq!(exit_status(Some(300)), 1);
        assert_eq!(exit_status(Some(-1)), 1);
        assert_eq!(exit_status(None), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_from_timeout() {
        assert!(deadline(None).is_none());
        let at = deadline(Some(5)).unwrap();
        assert_eq!(at - Instant::now(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_lock_prints_owner() {
        let client = client_with_blueprint("bp-1").await;
        let mut out = Vec::new();

        lock_cmd(lock_args("bp-1", "ci-42", false), Arc::clone(&client), &CancellationToken::new(), &mut out)
            .await
            .unwrap();

        assert_eq!(output(out), "locked blueprint bp-1 as owner ci-42\n");
        assert_eq!(holder_owner(&client, "bp-1").await.as_deref(), Some("ci-42"));
    }

    #[tokio::test]
    async fn test_lock_missing_blueprint_fails() {
        let client = Arc::new(MockApstraClient::new("http://test-apstra"));
        let mut out = Vec::new();

        let err = lock_cmd(lock_args("bp-9", "ci-42", false), client, &CancellationToken::new(), &mut out)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("bp-9 not found"));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_lock_force_evicts_foreign_holder() {
        let client = client_with_blueprint("bp-1").await;
        hold(&client, "bp-1", "someone-else").await;
        let mut out = Vec::new();

        lock_cmd(lock_args("bp-1", "ci-42", true), Arc::clone(&client), &CancellationToken::new(), &mut out)
            .await
            .unwrap();

        assert_eq!(holder_owner(&client, "bp-1").await.as_deref(), Some("ci-42"));
        assert_eq!(client.list_tags().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lock_times_out_on_foreign_holder() {
        let client = client_with_blueprint("bp-1").await;
        hold(&client, "bp-1", "someone-else").await;
        let mut args = lock_args("bp-1", "ci-42", false);
        args.timeout = Some(2);
        let mut out = Vec::new();

        let result = lock_cmd(args, Arc::clone(&client), &CancellationToken::new(), &mut out).await;

        assert!(result.is_err());
        assert_eq!(holder_owner(&client, "bp-1").await.as_deref(), Some("someone-else"));
    }

    #[tokio::test]
    async fn test_unlock_refuses_foreign_holder() {
        let client = client_with_blueprint("bp-1").await;
        hold(&client, "bp-1", "someone-else").await;
        let args = UnlockArgs {
            blueprint_id: "bp-1".to_string(),
            owner: Some("ci-42".to_string()),
            force: false,
        };
        let mut out = Vec::new();

        let err = unlock_cmd(args, Arc::clone(&client), &mut out).await.unwrap_err();

        assert!(err.to_string().contains("error unlocking blueprint"));
        assert_eq!(holder_owner(&client, "bp-1").await.as_deref(), Some("someone-else"));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_unlock_by_owner_and_when_free() {
        let client = client_with_blueprint("bp-1").await;
        hold(&client, "bp-1", "ci-42").await;
        let args = || UnlockArgs {
            blueprint_id: "bp-1".to_string(),
            owner: Some("ci-42".to_string()),
            force: false,
        };
        let mut out = Vec::new();

        unlock_cmd(args(), Arc::clone(&client), &mut out).await.unwrap();
        unlock_cmd(args(), Arc::clone(&client), &mut out).await.unwrap();

        assert_eq!(output(out), "unlocked blueprint bp-1\nblueprint bp-1 was not locked\n");
        assert!(holder_owner(&client, "bp-1").await.is_none());
    }

    #[tokio::test]
    async fn test_unlock_force_clears_foreign_holder() {
        let client = client_with_blueprint("bp-1").await;
        hold(&client, "bp-1", "someone-else").await;
        let args = UnlockArgs {
            blueprint_id: "bp-1".to_string(),
            owner: None,
            force: true,
        };
        let mut out = Vec::new();

        unlock_cmd(args, Arc::clone(&client), &mut out).await.unwrap();

        assert_eq!(output(out), "cleared blueprint bp-1 mutex\n");
        assert!(holder_owner(&client, "bp-1").await.is_none());
    }

    #[tokio::test]
    async fn test_status_reports_holder() {
        let client = client_with_blueprint("bp-1").await;
        let status = |id: &str| StatusArgs {
            blueprint_id: id.to_string(),
        };
        let mut out = Vec::new();

        status_cmd(status("bp-1"), Arc::clone(&client), &mut out).await.unwrap();
        hold(&client, "bp-1", "ci-42").await;
        status_cmd(status("bp-1"), Arc::clone(&client), &mut out).await.unwrap();
        client.add_tag(format!("{}bp-2", MUTEX_TAG_PREFIX), "manual lock").await;
        status_cmd(status("bp-2"), Arc::clone(&client), &mut out).await.unwrap();

        assert_eq!(
            output(out),
            "blueprint bp-1: unlocked\n\
             blueprint bp-1: locked by ci-42 (applying)\n\
             blueprint bp-2: locked: manual lock\n"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_releases_lock_and_reports_child_status() {
        let client = client_with_blueprint("bp-1").await;

        let code = run_cmd(
            run_args("bp-1", &["sh", "-c", "exit 3"]),
            Arc::clone(&client),
            true,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(code, 3);
        assert!(client.list_tags().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_releases_lock_when_child_fails_to_start() {
        let client = client_with_blueprint("bp-1").await;

        let result = run_cmd(
            run_args("bp-1", &["/nonexistent/blueprint-lock-test-binary"]),
            Arc::clone(&client),
            true,
            &CancellationToken::new(),
        )
        .await;

        assert!(result.is_err());
        assert!(client.list_tags().await.unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_with_mutex_disabled_skips_api() {
        let client = Arc::new(MockApstraClient::new("http://test-apstra"));

        let code = run_cmd(run_args("bp-1", &["true"]), Arc::clone(&client), false, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(code, 0);
        assert_eq!(client.call_count(), 0);
    }
}
