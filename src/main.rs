use std::process::ExitCode;

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signedurl::models::AppConfig;
use signedurl::server;
use signedurl::services::{UrlSigner, Verdict};

#[derive(Parser)]
#[command(name = "signedurl")]
#[command(about = "Issue and verify signed, optionally expiring URLs")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server serving FILES_DIR behind the access gate
    Serve,
    /// Sign an absolute URL
    Sign {
        /// URL to sign (must not already carry a signature)
        url: String,

        /// Validity in seconds from now (defaults to DEFAULT_TTL)
        #[arg(long, conflicts_with_all = ["expires", "no_expiry"])]
        ttl: Option<i64>,

        /// Absolute expiry as Unix seconds
        #[arg(long, conflicts_with = "no_expiry")]
        expires: Option<i64>,

        /// Issue a link that never expires
        #[arg(long)]
        no_expiry: bool,
    },
    /// Verify a signed URL
    Verify {
        /// Signed URL to check
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) => run_server().await.map(|()| ExitCode::SUCCESS),
        Some(Commands::Sign {
            url,
            ttl,
            expires,
            no_expiry,
        }) => run_sign_command(&url, ttl, expires, no_expiry).map(|()| ExitCode::SUCCESS),
        Some(Commands::Verify { url }) => run_verify_command(&url),
        None => {
            run_status_command();
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Sign a URL and print it
fn run_sign_command(
    url: &str,
    ttl: Option<i64>,
    expires: Option<i64>,
    no_expiry: bool,
) -> anyhow::Result<()> {
    init_tracing("signedurl=warn");

    let config = AppConfig::load()?;
    let signer = UrlSigner::new(config.key()).with_validity(config.default_ttl);

    let expires_at = resolve_expiry(Utc::now(), no_expiry, expires, ttl, signer.validity())?;

    let signed = signer
        .sign_until(url, expires_at)
        .map_err(|e| anyhow!("Failed to sign {url}: {e}"))?;
    println!("{signed}");

    Ok(())
}

/// Pick the expiry of a new link.
///
/// `--no-expiry` wins over `--expires`, which wins over `--ttl`; with none of
/// them the configured default validity applies.
fn resolve_expiry(
    now: DateTime<Utc>,
    no_expiry: bool,
    expires: Option<i64>,
    ttl: Option<i64>,
    default_validity: Option<Duration>,
) -> anyhow::Result<Option<DateTime<Utc>>> {
    if no_expiry {
        return Ok(None);
    }
    if let Some(ts) = expires {
        return DateTime::from_timestamp(ts, 0)
            .map(Some)
            .ok_or_else(|| anyhow!("--expires out of range: {ts}"));
    }
    if let Some(secs) = ttl {
        return Duration::try_seconds(secs)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .map(Some)
            .ok_or_else(|| anyhow!("--ttl out of range: {secs}"));
    }
    match default_validity {
        Some(validity) => now
            .checked_add_signed(validity)
            .map(Some)
            .ok_or_else(|| anyhow!("DEFAULT_TTL out of range: {validity}")),
        None => Ok(None),
    }
}

/// Exit status of `verify`: 0 for a valid link, 1 otherwise
fn verify_exit_code(verdict: Verdict) -> u8 {
    match verdict {
        Verdict::Valid => 0,
        Verdict::InvalidSignature | Verdict::Expired => 1,
    }
}

/// Verify a URL, exiting with status 1 unless it is valid
fn run_verify_command(url: &str) -> anyhow::Result<ExitCode> {
    init_tracing("signedurl=warn");

    let config = AppConfig::load()?;
    let signer = UrlSigner::new(config.key());

    let verdict = signer
        .verify(url)
        .map_err(|e| anyhow!("Failed to verify {url}: {e}"))?;
    println!("{verdict}");

    Ok(ExitCode::from(verify_exit_code(verdict)))
}

/// Display status and configuration information
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let bind_addr = std::env::var("BIND_ADDR").ok();
    let base_url = std::env::var("BASE_URL").ok();
    let config_file = std::env::var("CONFIG_FILE").ok();
    let files_dir = std::env::var("FILES_DIR").ok();
    let default_ttl = std::env::var("DEFAULT_TTL").ok();
    let key_set = std::env::var("SIGNING_KEY").is_ok_and(|key| !key.is_empty());

    println!("signedurl v{VERSION}");
    println!("Signed, optionally expiring URLs\n");

    println!("Environment Variables:");
    println!(
        "  CONFIG_FILE = {}",
        config_file.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  BIND_ADDR   = {}",
        bind_addr.as_deref().unwrap_or("0.0.0.0:3000 (default)")
    );
    println!(
        "  BASE_URL    = {}",
        base_url.as_deref().unwrap_or("http://localhost:3000/ (default)")
    );
    println!(
        "  FILES_DIR   = {}",
        files_dir.as_deref().unwrap_or("./files (default)")
    );
    println!(
        "  DEFAULT_TTL = {}",
        default_ttl.as_deref().unwrap_or("3600 (default)")
    );
    println!(
        "  SIGNING_KEY = {}",
        if key_set { "(set)" } else { "(not set)" }
    );

    println!("\nCommands:");
    println!("  signedurl serve          Start the HTTP server");
    println!("  signedurl sign <URL>     Sign a URL");
    println!("  signedurl verify <URL>   Verify a signed URL");
    println!("\nRun 'signedurl --help' for more details.");
}

/// Run the HTTP server
async fn run_server() -> anyhow::Result<()> {
    init_tracing("signedurl=debug,tower_http=debug");

    let config = AppConfig::load()?;
    let bind_addr = config.bind_addr.clone();

    let state = server::create_app_state(config);
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "signedurl server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
