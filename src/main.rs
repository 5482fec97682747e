use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;
use vcsgate_auth::{EnvSource, RefresherSet, TokenManager, TokenManagerConfig};
use vcsgate_config::Config;
use vcsgate_ops::VcsOperations;
use vcsgate_provider::builtin_registry;
use vcsgate_store::FileTokenStore;
use vcsgate_types::{ProviderId, RepoRef, TokenData, TokenSource, VcsError};

#[derive(Parser, Debug)]
#[command(name = "vcsgate", about = "vcsgate: credentials and API access for VCS hosts")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show credential status for every enabled provider.
    Status {
        /// Owner of the credentials (user, team, installation).
        #[arg(short, long)]
        source: TokenSource,
    },
    /// Store credentials obtained elsewhere.
    SetToken {
        #[arg(short, long)]
        source: TokenSource,
        /// github / gitlab / bitbucket / azure_devops.
        #[arg(short, long)]
        provider: ProviderId,
        #[arg(long)]
        token: String,
        #[arg(long)]
        refresh_token: Option<String>,
        /// Lifetime of the access token in seconds.
        #[arg(long)]
        expires_in: Option<u64>,
        #[arg(long)]
        scope: Option<String>,
    },
    /// Mark stored credentials unusable so the owner must re-authorize.
    Invalidate {
        #[arg(short, long)]
        source: TokenSource,
        #[arg(short, long)]
        provider: ProviderId,
    },
    /// Check the stored credentials against the host.
    Check {
        #[arg(short, long)]
        source: TokenSource,
        /// Defaults to the configured default provider.
        #[arg(short, long)]
        provider: Option<ProviderId>,
    },
    /// Print the normalized CI status of a pull request as JSON.
    Ci {
        #[arg(short, long)]
        source: TokenSource,
        #[arg(short, long)]
        provider: Option<ProviderId>,
        /// Repository as OWNER/NAME.
        #[arg(short, long)]
        repo: RepoRef,
        /// Pull request number.
        #[arg(long = "pr")]
        number: u64,
    },
    /// Verify a webhook signature against a saved payload.
    VerifyWebhook {
        #[arg(short, long)]
        provider: Option<ProviderId>,
        /// Signature header value, e.g. `sha256=<hex>`.
        #[arg(long)]
        signature: String,
        /// File holding the raw request body.
        #[arg(long, value_name = "FILE")]
        body: PathBuf,
        /// Shared secret; read from the provider's `webhook_secret_env` when omitted.
        #[arg(long)]
        secret: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("config error: {e}"))?;
    init_tracing(&config);

    let ops = build_operations(&config)?;
    match cli.command {
        Commands::Status { source } => cmd_status(&ops, &source).await,
        Commands::SetToken {
            source,
            provider,
            token,
            refresh_token,
            expires_in,
            scope,
        } => {
            let mut tokens = TokenData::new(token);
            if let Some(r) = refresh_token {
                tokens = tokens.with_refresh(r);
            }
            if let Some(secs) = expires_in {
                tokens = tokens.with_expiry(Duration::from_secs(secs));
            }
            if let Some(s) = scope {
                tokens = tokens.with_scope(s);
            }
            ops.manager().store_tokens(&source, provider, &tokens).await?;
            eprintln!("stored credentials for {source} on {provider}");
            Ok(())
        }
        Commands::Invalidate { source, provider } => {
            ops.manager().invalidate_tokens(&source, provider).await?;
            eprintln!("{source} on {provider} must re-authenticate");
            Ok(())
        }
        Commands::Check { source, provider } => {
            let status = ops.repos().check_connection(&source, provider).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        Commands::Ci {
            source,
            provider,
            repo,
            number,
        } => {
            let summary = ops
                .pull_requests()
                .ci_status(&source, provider, &repo, number)
                .await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Commands::VerifyWebhook {
            provider,
            signature,
            body,
            secret,
        } => cmd_verify_webhook(&ops, &config, provider, &signature, &body, secret),
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_operations(config: &Config) -> Result<VcsOperations> {
    let http = rquest::Client::new();
    let env = EnvSource::Process;
    let store = FileTokenStore::new(config.tokens_path.clone().unwrap_or_else(default_tokens_path));
    let manager = TokenManager::new(
        TokenManagerConfig::builder()
            .store(Arc::new(store))
            .refresher(Arc::new(RefresherSet::from_config(config, &http, &env)))
            .expiration_buffer(config.expiration_buffer())
            .default_provider(config.default_provider)
            .required_env_vars(config.required_env.clone())
            .on_refresh_failure(Arc::new(
                |source: &TokenSource, provider: ProviderId, error: &VcsError| {
                    tracing::warn!(%source, %provider, %error, "re-authorization required");
                },
            ))
            .env(env)
            .build(),
    )?;
    Ok(VcsOperations::new(
        Arc::new(manager),
        Arc::new(builtin_registry(config, &http)),
    ))
}

async fn cmd_status(ops: &VcsOperations, source: &TokenSource) -> Result<()> {
    for id in ops.registry().ids() {
        let status = if ops.manager().are_tokens_valid(source, id).await {
            "valid"
        } else {
            "re-authentication required"
        };
        println!("{id}: {status}");
    }
    Ok(())
}

fn cmd_verify_webhook(
    ops: &VcsOperations,
    config: &Config,
    provider: Option<ProviderId>,
    signature: &str,
    payload: &std::path::Path,
    secret: Option<String>,
) -> Result<()> {
    let id = provider.unwrap_or_else(|| ops.default_provider());
    let secret = match secret {
        Some(s) => s,
        None => {
            let var = config
                .provider(id)
                .webhook_secret_env
                .with_context(|| format!("no webhook secret configured for {id}"))?;
            EnvSource::Process
                .get(&var)
                .with_context(|| format!("{var} is not set"))?
        }
    };
    let body = std::fs::read(payload)
        .with_context(|| format!("reading {}", payload.display()))?;
    if !ops.webhooks().verify(Some(id), &body, signature, &secret)? {
        bail!("signature does not match payload");
    }
    println!("signature valid");
    Ok(())
}

fn default_tokens_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".vcsgate").join("tokens.json")
}
