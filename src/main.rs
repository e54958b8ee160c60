mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use mailwatch::core::config::ConnectionConfig;
use mailwatch::infrastructure::logging::init_logging;
use mailwatch::infrastructure::session::ImapTlsSession;
use mailwatch::services::connection::{MailServerConnection, SessionConnection};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("mailwatch")?;

    let cli = Cli::parse();
    let config = ConnectionConfig::from_env().context("Failed to load mailbox configuration")?;

    match cli.command {
        Commands::Watch {
            interval,
            timeout,
            output,
            once,
        } => {
            watch(
                config,
                Duration::from_secs(interval),
                Duration::from_secs(timeout),
                output,
                once,
            )
            .await
        }
        Commands::Latest { count, unseen } => latest(config, count, unseen).await,
    }
}

async fn watch(
    config: ConnectionConfig,
    interval: Duration,
    timeout: Duration,
    output: PathBuf,
    once: bool,
) -> Result<()> {
    info!("Watching {} on {}:{}", config.mailbox, config.host, config.port);

    let session = ImapTlsSession::connect(config)
        .await
        .context("Failed to establish the initial IMAP session")?;
    let mut checkpoint = SessionConnection::new(session)
        .create_checkpoint()
        .await
        .context("Failed to create checkpoint")?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping after the current cycle");
            signal_cancel.cancel();
        }
    });

    checkpoint
        .monitor_with_cancel(
            move |batch| {
                for mail in batch {
                    info!(
                        "New mail uid={} from={} subject={:?}",
                        mail.uid(),
                        mail.from_address()
                            .map(|a| a.to_string())
                            .unwrap_or_else(|| "(unknown)".to_string()),
                        mail.subject()
                    );
                    match mail.save_to_file(&output) {
                        Ok(path) => info!("Saved to {:?}", path),
                        Err(e) => error!("Failed to save mail uid={}: {}", mail.uid(), e),
                    }
                }
                once
            },
            interval,
            timeout,
            cancel,
        )
        .await
        .context("Monitoring terminated with an error")?;

    Ok(())
}

async fn latest(config: ConnectionConfig, count: usize, unseen: bool) -> Result<()> {
    let session = ImapTlsSession::connect(config)
        .await
        .context("Failed to establish the IMAP session")?;
    let mut connection = SessionConnection::new(session);

    let mails = if unseen {
        connection
            .latest_unseen_mail()
            .await
            .context("Failed to load unseen mail")?
    } else {
        connection
            .latest_mail_by_count(count)
            .await
            .context("Failed to load the latest mail")?
    };

    if mails.is_empty() {
        println!("no mail found");
    }
    for mail in &mails {
        println!(
            "{:>6}  {}  {}  {}",
            mail.uid(),
            mail.reception_datetime().format("%Y-%m-%d %H:%M:%S"),
            mail.from_address()
                .map(|a| a.to_string())
                .unwrap_or_else(|| "(unknown)".to_string()),
            mail.subject()
        );
    }

    connection.disconnect().await;
    Ok(())
}
