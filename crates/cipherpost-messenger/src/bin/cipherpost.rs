//! cipherpost: command-line front end for the encrypted message store.
//!
//! Every command prints JSON on stdout. Logs go to stderr (or `LOG_FILE`).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use cipherpost_core::{CredentialStore, EnvelopeSummary, MessageStore, MessengerConfig, Uuid};
use cipherpost_messenger::{open, FsMessenger};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "cipherpost")]
#[command(author, version, about = "Store-and-forward encrypted messaging")]
#[command(propagate_version = true)]
struct Cli {
    /// Data directory (overrides CIPHERPOST_DATA_DIR)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory layout
    Init,

    /// Register a new user and generate their keypair
    Register {
        /// Username (letters, digits, '_', '.', '-')
        #[arg(short, long)]
        username: String,

        #[command(flatten)]
        passphrase: PassphraseArg,
    },

    /// List registered users
    Users {
        /// List only the users this account can write to
        #[arg(short, long, requires = "passphrase")]
        user: Option<String>,

        /// Passphrase for --user
        #[arg(short, long, env = "CIPHERPOST_PASSPHRASE", hide_env_values = true)]
        passphrase: Option<String>,
    },

    /// Encrypt and store a message for another user
    Send {
        /// Sending user
        #[arg(short, long)]
        from: String,

        /// Recipient username
        #[arg(short, long)]
        to: String,

        /// Message text
        #[arg(short, long)]
        message: String,

        #[command(flatten)]
        passphrase: PassphraseArg,
    },

    /// List messages addressed to a user
    Inbox {
        #[arg(short, long)]
        user: String,

        #[command(flatten)]
        passphrase: PassphraseArg,
    },

    /// Decrypt and show one message
    Read {
        #[arg(short, long)]
        user: String,

        /// Message id (from `inbox`)
        #[arg(short, long)]
        id: Uuid,

        #[command(flatten)]
        passphrase: PassphraseArg,
    },
}

#[derive(clap::Args)]
struct PassphraseArg {
    /// Passphrase protecting the private key
    #[arg(short, long, env = "CIPHERPOST_PASSPHRASE", hide_env_values = true)]
    passphrase: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _log_guard = init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, daily rotation)
///   LOG_ANSI    - "true"/"false" override ANSI colors
///   RUST_LOG    - standard env filter (default: "cipherpost=info,cipherpost_messenger=info")
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cipherpost=info,cipherpost_messenger=info".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(ref path) = log_file {
        let path = std::path::Path::new(path);
        let file_dir = path.parent().unwrap_or(std::path::Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("cipherpost.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = MessengerConfig::from_env().context("loading configuration")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    // Opening initializes the layout, so `init` has nothing left to do
    let messenger = open(config).await?;
    match cli.command {
        Commands::Init => cmd_init(&messenger),
        Commands::Register {
            username,
            passphrase,
        } => cmd_register(&messenger, &username, &passphrase.passphrase).await,
        Commands::Users { user, passphrase } => {
            cmd_users(&messenger, user.as_deref(), passphrase.as_deref()).await
        }
        Commands::Send {
            from,
            to,
            message,
            passphrase,
        } => cmd_send(&messenger, &from, &passphrase.passphrase, &to, &message).await,
        Commands::Inbox { user, passphrase } => {
            cmd_inbox(&messenger, &user, &passphrase.passphrase).await
        }
        Commands::Read {
            user,
            id,
            passphrase,
        } => cmd_read(&messenger, &user, &passphrase.passphrase, id).await,
    }
}

fn cmd_init(messenger: &FsMessenger) -> anyhow::Result<()> {
    let layout = messenger.credentials().layout();
    info!(data_dir = %layout.root().display(), "data directory ready");
    print_json(&serde_json::json!({
        "data_dir": layout.root().to_string_lossy(),
        "users_index": layout.users_index().to_string_lossy(),
    }))
}

async fn cmd_register(messenger: &FsMessenger, username: &str, passphrase: &str) -> anyhow::Result<()> {
    messenger.register(username, passphrase).await?;
    let credential = messenger.credentials().get(username).await?;
    let fingerprint = cipherpost_crypto::import_public(&credential.public_key_pem)?.fingerprint();

    print_json(&serde_json::json!({
        "username": username,
        "fingerprint": fingerprint,
        "public_key": credential.public_key_pem,
    }))
}

async fn cmd_users(
    messenger: &FsMessenger,
    user: Option<&str>,
    passphrase: Option<&str>,
) -> anyhow::Result<()> {
    let users = match (user, passphrase) {
        (Some(user), Some(passphrase)) => {
            let session = messenger.login(user, passphrase).await?;
            let users = messenger.recipients(&session).await?;
            messenger.logout(session);
            users
        }
        _ => messenger.credentials().list().await?,
    };
    print_json(&serde_json::json!({ "users": users }))
}

async fn cmd_send(
    messenger: &FsMessenger,
    from: &str,
    passphrase: &str,
    to: &str,
    message: &str,
) -> anyhow::Result<()> {
    if message.is_empty() {
        bail!("message must not be empty");
    }
    let session = messenger.login(from, passphrase).await?;
    let id = messenger.send(&session, to, message).await?;
    messenger.logout(session);

    print_json(&serde_json::json!({
        "id": id,
        "from": from,
        "to": to,
    }))
}

async fn cmd_inbox(messenger: &FsMessenger, user: &str, passphrase: &str) -> anyhow::Result<()> {
    let session = messenger.login(user, passphrase).await?;
    let inbox = messenger.inbox(&session).await?;
    messenger.logout(session);

    let unread = inbox.iter().filter(|e| !e.read).count();
    let messages: Vec<serde_json::Value> = inbox.iter().map(summary_json).collect();
    print_json(&serde_json::json!({
        "user": user,
        "unread": unread,
        "messages": messages,
    }))
}

async fn cmd_read(
    messenger: &FsMessenger,
    user: &str,
    passphrase: &str,
    id: Uuid,
) -> anyhow::Result<()> {
    let session = messenger.login(user, passphrase).await?;
    let result = messenger.read(&session, id).await;
    messenger.logout(session);
    let text = result?;

    let envelope = messenger.messages().get(id).await?;
    print_json(&serde_json::json!({
        "id": id,
        "from": envelope.sender,
        "sent_at": envelope.sent_at().map(|t| t.to_rfc3339()),
        "message": text,
    }))
}

fn summary_json(summary: &EnvelopeSummary) -> serde_json::Value {
    serde_json::json!({
        "id": summary.id,
        "from": summary.sender,
        "sent_at": summary.sent_at().map(|t| t.to_rfc3339()),
        "read": summary.read,
    })
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
