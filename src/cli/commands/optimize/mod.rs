//! `asa optimize` command - Campaign optimization workflows

mod bid_check;
mod bid_review;
mod expand;

use clap::Subcommand;
use miette::Result;

use crate::cli::GlobalOpts;

pub use bid_check::BidCheckArgs;
pub use bid_review::BidReviewArgs;
pub use expand::ExpandArgs;

#[derive(Subcommand, Debug)]
pub enum OptimizeCommands {
    /// Find ad groups whose default bid lags their keyword bids
    BidCheck(BidCheckArgs),

    /// Copy campaigns into a new market as a SKAG campaign
    Expand(ExpandArgs),

    /// Estimate keyword bid strength from recent performance
    BidReview(BidReviewArgs),
}

pub fn run(cmd: OptimizeCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        OptimizeCommands::BidCheck(args) => bid_check::run(args, global),
        OptimizeCommands::Expand(args) => expand::run(args, global),
        OptimizeCommands::BidReview(args) => bid_review::run(args, global),
    }
}
