use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "skufy")]
#[command(author, version, about = "Telegram bot for the Skufy Marketing community", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot together with the payment webhook server
    Run {
        /// Do not start the payment webhook server
        #[arg(long)]
        no_webhook: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
