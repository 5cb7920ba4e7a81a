use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "repovault")]
#[command(about = "Scheduled Bitbucket repository backups to object storage", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute one backup run immediately and exit
    Run,

    /// Run the weekday scheduler loop
    Serve {
        /// Execute one run immediately before entering the schedule
        #[arg(long)]
        immediate: bool,
    },

    /// Show recent run history
    History {
        /// Number of runs to show
        #[arg(long, default_value_t = 10)]
        limit: i64,

        /// Include per-repository rows for each run
        #[arg(long)]
        detail: bool,
    },
}
