//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    ad_groups::AdGroupCommands, auth::AuthCommands, brand::BrandArgs, campaigns::CampaignCommands,
    completions::CompletionsArgs, impression_share::ImpressionShareCommands,
    keywords::KeywordCommands, optimize::OptimizeCommands, reports::ReportCommands,
};

#[derive(Parser)]
#[command(name = "asa")]
#[command(author, version, about = "Apple Search Ads CLI")]
#[command(long_about = "Manage Apple Search Ads campaigns, ad groups and keywords, pull reports, \
and run brand, expansion and bid optimization workflows.

Credentials are read from the environment, a .env file or ~/.config/asa/config.yaml:

  export ASA_CLIENT_ID=SEARCHADS.xxx
  export ASA_TEAM_ID=SEARCHADS.xxx
  export ASA_KEY_ID=xxx
  export ASA_ORG_ID=1234567
  export ASA_PRIVATE_KEY_PATH=/path/to/private-key.pem")]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,

    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    pub version: Option<bool>,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Path to a .env file with ASA_* credentials
    #[arg(long, global = true, default_value = ".env")]
    pub env_file: PathBuf,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check and show API credentials
    #[command(subcommand)]
    Auth(AuthCommands),

    /// Campaign management
    #[command(subcommand)]
    Campaigns(CampaignCommands),

    /// Ad group management
    #[command(subcommand, name = "ad-groups")]
    AdGroups(AdGroupCommands),

    /// Keyword and negative keyword management
    #[command(subcommand)]
    Keywords(KeywordCommands),

    /// Performance reports
    #[command(subcommand)]
    Reports(ReportCommands),

    /// Create exact-match brand campaigns across countries
    Brand(BrandArgs),

    /// Bid checks, market expansion and bid reviews
    #[command(subcommand)]
    Optimize(OptimizeCommands),

    /// Search term impression share analysis
    #[command(subcommand, name = "impression-share")]
    ImpressionShare(ImpressionShareCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Output format for list and get commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON (for programming)
    Json,
    /// CSV (for spreadsheets)
    Csv,
}
