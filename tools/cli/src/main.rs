//! sharesweep - revoke public-link sharing on newly created Drive files.
//!
//! By default the process stays resident and audits the previous day's
//! file creations once a day.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sharesweep_audit::{AuditConfig, AuditJob, DailyScheduler, RunOutcome};
use sharesweep_drive::gdrive::{
    ActivityClient, ClientSecrets, CredentialProvider, DriveClient, TokenStore,
};

#[derive(Parser)]
#[command(name = "sharesweep")]
#[command(about = "Daily audit that revokes public links on newly created Drive files")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: per-user config dir, if present).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Only print the authorization URL instead of opening a browser.
    #[arg(long, global = true)]
    no_browser: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Stay resident and audit once a day (default).
    Daemon {
        /// Also run an audit immediately at startup.
        #[arg(long)]
        run_now: bool,
    },

    /// Run a single audit and exit.
    Once,

    /// Run the authorization flow and save the token.
    Login,

    /// Print shell completions.
    Completions {
        /// Target shell.
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; RUST_LOG takes precedence over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(Commands::Completions { shell }) = cli.command {
        clap_complete::generate(
            shell,
            &mut Cli::command(),
            "sharesweep",
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    let config = AuditConfig::resolve(cli.config.as_deref()).context("Failed to load config")?;

    let auth = AuthOptions {
        no_browser: cli.no_browser,
    };

    match cli.command.unwrap_or(Commands::Daemon { run_now: false }) {
        Commands::Daemon { run_now } => cmd_daemon(&config, auth, run_now).await,
        Commands::Once => cmd_once(&config, auth).await,
        Commands::Login => cmd_login(&config, auth).await,
        Commands::Completions { .. } => Ok(()),
    }
}

#[derive(Debug, Clone, Copy)]
struct AuthOptions {
    no_browser: bool,
}

async fn credential_provider(
    config: &AuditConfig,
    auth: AuthOptions,
) -> Result<CredentialProvider> {
    let secrets = ClientSecrets::load(&config.client_secrets_path)
        .await
        .with_context(|| {
            format!(
                "Failed to load client secrets from {}",
                config.client_secrets_path.display()
            )
        })?;

    let provider = CredentialProvider::new(
        secrets,
        TokenStore::new(&config.token_path),
        config.redirect_port,
    );

    if auth.no_browser {
        Ok(provider.with_url_handler(|url| {
            println!("Open this URL to authorize sharesweep: {}", url);
        }))
    } else {
        Ok(provider)
    }
}

/// Authenticate and wire the audit job to the Google clients.
async fn connect(config: &AuditConfig, auth: AuthOptions) -> Result<AuditJob> {
    let token_manager = credential_provider(config, auth)
        .await?
        .initialize()
        .await
        .context("Failed to authenticate")?;

    let activity = Arc::new(ActivityClient::new(token_manager.clone())?);
    let files = Arc::new(DriveClient::new(token_manager)?);

    Ok(AuditJob::new(activity, files).with_page_size(config.page_size))
}

/// Audit daily until interrupted.
async fn cmd_daemon(config: &AuditConfig, auth: AuthOptions, run_now: bool) -> Result<()> {
    let job = connect(config, auth).await?;
    let (scheduler, handle) = DailyScheduler::new(config.schedule);

    if run_now {
        handle.run_now().await?;
    }

    let shutdown = handle.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("Shutdown signal received");
        let _ = shutdown.shutdown().await;
    });

    let job = &job;
    scheduler
        .run(move || async move {
            job.run(&mut std::io::stdout()).await;
        })
        .await?;

    Ok(())
}

/// Single audit of the last 24 hours.
async fn cmd_once(config: &AuditConfig, auth: AuthOptions) -> Result<()> {
    let job = connect(config, auth).await?;

    match job.run(&mut std::io::stdout()).await {
        RunOutcome::Failed(detail) => anyhow::bail!("Audit failed: {}", detail),
        RunOutcome::NothingToAudit => println!("No file activity in the last day."),
        RunOutcome::Completed(_) => {}
    }

    Ok(())
}

/// Force a fresh authorization.
async fn cmd_login(config: &AuditConfig, auth: AuthOptions) -> Result<()> {
    credential_provider(config, auth)
        .await?
        .login()
        .await
        .context("Authorization failed")?;

    println!("Token saved to {}", config.token_path.display());
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
