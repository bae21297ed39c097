use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use upload_session::{UploadFile, UploadSessionManager, UploadState};
use utils::output_bytes;
use vault_client::{BearerCredentialHelper, FileLibraryClient, NoopCredentialHelper, RemoteClient};
use vault_config::VaultConfig;
use vault_logging::{LoggingConfig, init_logging};
use vault_types::file_listing::{SortBy, StorageLevel, StorageUsage, filter_files_by_search, sort_files};
use vault_types::FileRecord;

use crate::console_observer::ConsoleObserver;
use crate::constants::{
    CLI_PROGRAM, CURRENT_VERSION, DEFAULT_STORAGE_QUOTA, FILEVAULT_PASSWORD_ENV, FILEVAULT_TOKEN_ENV,
};

#[derive(Subcommand, Debug)]
#[non_exhaustive]
enum Command {
    /// Sign in and print the session token.
    Login(CredentialsArg),

    /// Create an account.
    Register(CredentialsArg),

    /// Upload one or more files, printing progress as they go.
    Upload(UploadArg),

    /// List the files in the library.
    List(ListArg),

    /// Delete a file by id.
    Delete(DeleteArg),

    /// Check that the backend is reachable.
    Health,
}

#[derive(Args, Debug)]
struct CredentialsArg {
    #[clap(long)]
    email: String,

    /// The account password.
    #[clap(long, env = FILEVAULT_PASSWORD_ENV, hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct UploadArg {
    /// Files to upload.
    #[clap(required = true)]
    paths: Vec<PathBuf>,

    /// Maximum number of files transferring at once; 0 for no limit.
    #[clap(long)]
    concurrency: Option<usize>,
}

#[derive(Args, Debug)]
struct ListArg {
    /// Sort key: name, date or size.
    #[clap(long, default_value = "date")]
    sort: SortBy,

    /// Reverse the sort order.
    #[clap(long)]
    desc: bool,

    /// Only show files whose name or type contains this text.
    #[clap(long)]
    search: Option<String>,

    /// Storage quota in bytes for the usage summary.
    #[clap(long, default_value_t = DEFAULT_STORAGE_QUOTA)]
    quota: u64,
}

#[derive(Args, Debug)]
struct DeleteArg {
    file_id: String,
}

#[derive(Args, Debug)]
struct CliOverrides {
    /// The API endpoint, e.g. http://localhost:5000/api.  Defaults to FILEVAULT_CLIENT_ENDPOINT.
    #[clap(long)]
    endpoint: Option<String>,

    /// Session token from "login".
    #[clap(long, env = FILEVAULT_TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,

    /// Write logs to this file or directory instead of stderr.
    #[clap(long)]
    log: Option<PathBuf>,
}

/// Command line client for a FileVault backend.
#[derive(Parser, Debug)]
#[clap(name = CLI_PROGRAM, version = CURRENT_VERSION, propagate_version = true)]
pub struct VaultApp {
    #[clap(flatten)]
    overrides: CliOverrides,

    #[clap(subcommand)]
    command: Command,
}

impl VaultApp {
    pub async fn run(self) -> Result<()> {
        let mut config = VaultConfig::new();
        if let Some(endpoint) = self.overrides.endpoint.clone() {
            config = config.with_endpoint(endpoint);
        }
        if let Some(log) = &self.overrides.log {
            config.log.dest = Some(log.to_string_lossy().into_owned());
        }

        init_logging(LoggingConfig::from_config(&config, format!("{CLI_PROGRAM} {CURRENT_VERSION}")));
        info!(command = self.command.name(), endpoint = %config.client.endpoint, "running command");

        self.command.run(&config, self.overrides.token).await
    }
}

impl Command {
    async fn run(self, config: &VaultConfig, token: Option<String>) -> Result<()> {
        match self {
            Command::Login(args) => login_command(config, args).await,
            Command::Register(args) => register_command(config, args).await,
            Command::Upload(args) => upload_command(config, require_token(token)?, args).await,
            Command::List(args) => list_command(config, require_token(token)?, args).await,
            Command::Delete(args) => delete_command(config, require_token(token)?, args).await,
            Command::Health => health_command(config).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Command::Login(_) => "login",
            Command::Register(_) => "register",
            Command::Upload(_) => "upload",
            Command::List(_) => "list",
            Command::Delete(_) => "delete",
            Command::Health => "health",
        }
    }
}

fn require_token(token: Option<String>) -> Result<String> {
    token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| anyhow!("not signed in: pass --token or set {FILEVAULT_TOKEN_ENV} (see \"{CLI_PROGRAM} login\")"))
}

fn anonymous_client(config: &VaultConfig) -> Result<RemoteClient> {
    Ok(RemoteClient::from_config(NoopCredentialHelper::new(), config)?)
}

fn authorized_client(config: &VaultConfig, token: String) -> Result<RemoteClient> {
    Ok(RemoteClient::from_config(BearerCredentialHelper::new(token, CLI_PROGRAM), config)?)
}

async fn login_command(config: &VaultConfig, args: CredentialsArg) -> Result<()> {
    let session = anonymous_client(config)?.login(&args.email, &args.password).await?;
    println!("Signed in as {} ({})", session.email, session.user_id);
    println!("export {FILEVAULT_TOKEN_ENV}={}", session.token);
    Ok(())
}

async fn register_command(config: &VaultConfig, args: CredentialsArg) -> Result<()> {
    let user_id = anonymous_client(config)?.register(&args.email, &args.password).await?;
    println!("Created account {} ({user_id}); sign in with \"{CLI_PROGRAM} login\".", args.email);
    Ok(())
}

async fn upload_command(config: &VaultConfig, token: String, args: UploadArg) -> Result<()> {
    let mut config = config.clone();
    if let Some(concurrency) = args.concurrency {
        config = config.with_max_concurrent_uploads(concurrency);
    }

    let mut files = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        let file = UploadFile::from_path(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        files.push(file);
    }

    let manager = UploadSessionManager::connect(
        &config.client.endpoint,
        token,
        Arc::new(ConsoleObserver::default()),
        &config,
    )?;
    manager.submit(files);
    manager.wait_idle().await;

    let sessions = manager.sessions();
    let failed = sessions.iter().filter(|s| s.state == UploadState::Failed).count();
    let uploaded: u64 = sessions
        .iter()
        .filter(|s| s.state == UploadState::Completed)
        .map(|s| s.file_size)
        .sum();
    println!("{} of {} files uploaded ({})", sessions.len() - failed, sessions.len(), output_bytes(uploaded));

    if failed > 0 {
        bail!("{failed} upload(s) failed");
    }
    Ok(())
}

async fn list_command(config: &VaultConfig, token: String, args: ListArg) -> Result<()> {
    let files = authorized_client(config, token)?.list_files().await?;

    let shown = match &args.search {
        Some(query) => filter_files_by_search(&files, query),
        None => files.clone(),
    };
    for file in sort_files(&shown, args.sort, !args.desc) {
        println!("{}", file_line(&file));
    }

    let usage = StorageUsage::from_records(&files, args.quota);
    println!("{}", usage_line(&usage, shown.len(), files.len()));
    Ok(())
}

async fn delete_command(config: &VaultConfig, token: String, args: DeleteArg) -> Result<()> {
    authorized_client(config, token)?.delete_file(&args.file_id).await?;
    println!("Deleted {}", args.file_id);
    Ok(())
}

async fn health_command(config: &VaultConfig) -> Result<()> {
    let health = anonymous_client(config)?.health().await?;
    match health.timestamp {
        Some(ts) => println!("{}: {} at {ts}", config.client.endpoint, health.status),
        None => println!("{}: {}", config.client.endpoint, health.status),
    }
    Ok(())
}

fn file_line(file: &FileRecord) -> String {
    format!(
        "{}  {:<40}  {:>10}  {}  {}",
        file.id,
        file.name,
        output_bytes(file.size),
        file.upload_date.format("%Y-%m-%d %H:%M"),
        file.url
    )
}

fn usage_line(usage: &StorageUsage, shown: usize, total: usize) -> String {
    let warning = match usage.level() {
        StorageLevel::Normal => "",
        StorageLevel::Warning => " (storage almost full)",
        StorageLevel::Critical => " (storage critically full)",
    };
    format!(
        "{shown} of {total} files; {} of {} used ({:.1}%){warning}",
        output_bytes(usage.used),
        output_bytes(usage.total),
        usage.used_percent()
    )
}
