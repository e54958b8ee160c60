use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mailwatch")]
#[command(about = "Checkpoint-based IMAP mailbox monitor", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Watch the mailbox and save newly arrived mail as .eml files
    Watch {
        /// Seconds between poll cycles
        #[arg(long, default_value = "10")]
        interval: u64,

        /// Overall monitoring deadline in seconds
        #[arg(long, default_value = "3600")]
        timeout: u64,

        /// Directory where new mail is saved
        #[arg(short, long, value_name = "DIR", default_value = "mail")]
        output: PathBuf,

        /// Stop after the first batch of new mail
        #[arg(long, default_value = "false")]
        once: bool,
    },
    /// Print the newest messages in the mailbox
    Latest {
        /// Number of messages to print
        #[arg(short, long, default_value = "10")]
        count: usize,

        /// Print unseen messages instead of the newest ones
        #[arg(long, default_value = "false")]
        unseen: bool,
    },
}
