//! `asa optimize bid-check` - Ad group vs keyword bid discrepancies

use console::style;
use miette::Result;
use tracing::warn;

use crate::api::models::{AdGroup, AdGroupUpdate, Campaign, Keyword, Money};
use crate::cli::commands::utils::{connect, enabled_ad_groups, enabled_campaigns, with_spinner};
use crate::cli::helpers::{ellipsize, format_bid, round2};
use crate::cli::output::{self, Spinner};
use crate::cli::table::print_table;
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct BidCheckArgs {
    /// Minimum percentage difference to flag
    #[arg(long, short = 't', default_value_t = 20.0)]
    pub threshold: f64,

    /// Apply every suggested bid without prompting
    #[arg(long)]
    pub auto_fix: bool,

    /// Show discrepancies without changing anything
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

/// An ad group whose keywords bid well above its default bid
#[derive(Debug, Clone, PartialEq)]
pub struct BidDiscrepancy {
    pub campaign_id: i64,
    pub campaign_name: String,
    pub ad_group_id: i64,
    pub ad_group_name: String,
    pub ad_group_bid: f64,
    pub keyword_avg_bid: f64,
    pub keyword_min_bid: f64,
    pub keyword_max_bid: f64,
    pub keyword_count: usize,
    pub currency: String,
}

impl BidDiscrepancy {
    /// Percentage the keyword average sits above the ad group bid
    pub fn difference_pct(&self) -> f64 {
        if self.ad_group_bid == 0.0 {
            return 0.0;
        }
        (self.keyword_avg_bid - self.ad_group_bid) / self.ad_group_bid * 100.0
    }

    pub fn suggested_bid(&self) -> f64 {
        round2(self.keyword_avg_bid)
    }
}

/// Compare an ad group's default bid against its keyword bids
///
/// Returns a discrepancy when the default is positive and the keyword
/// average is at least `threshold` percent higher.
pub fn check_ad_group(
    campaign: &Campaign,
    ad_group: &AdGroup,
    keywords: &[Keyword],
    threshold: f64,
) -> Option<BidDiscrepancy> {
    let default_bid = ad_group.default_bid_amount.as_ref()?;
    let bids: Vec<f64> = keywords
        .iter()
        .filter_map(|kw| kw.bid_amount.as_ref().map(Money::value))
        .collect();
    if bids.is_empty() || default_bid.value() <= 0.0 {
        return None;
    }

    let discrepancy = BidDiscrepancy {
        campaign_id: campaign.id,
        campaign_name: campaign.name.clone(),
        ad_group_id: ad_group.id,
        ad_group_name: ad_group.name.clone(),
        ad_group_bid: default_bid.value(),
        keyword_avg_bid: bids.iter().sum::<f64>() / bids.len() as f64,
        keyword_min_bid: bids.iter().copied().fold(f64::INFINITY, f64::min),
        keyword_max_bid: bids.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        keyword_count: bids.len(),
        currency: default_bid.currency.clone(),
    };
    (discrepancy.difference_pct() >= threshold).then_some(discrepancy)
}

/// Answer to the per-discrepancy prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Apply,
    Custom,
    Skip,
    Quit,
}

impl Action {
    pub fn parse(input: &str) -> Option<Action> {
        match input.trim().to_lowercase().as_str() {
            "" | "apply" | "a" => Some(Action::Apply),
            "custom" | "c" => Some(Action::Custom),
            "skip" | "s" => Some(Action::Skip),
            "quit" | "q" => Some(Action::Quit),
            _ => None,
        }
    }
}

fn scan(client: &crate::api::Client, threshold: f64) -> Result<Vec<BidDiscrepancy>> {
    let campaigns = with_spinner("Scanning enabled campaigns...", || enabled_campaigns(client))?;
    output::info(format!("Found {} enabled campaigns", campaigns.len()));
    println!();

    let mut found = Vec::new();
    for campaign in &campaigns {
        let _spinner = Spinner::start(format!("Scanning {}...", campaign.name));
        let ad_groups = match enabled_ad_groups(client, campaign.id) {
            Ok(ad_groups) => ad_groups,
            Err(e) => {
                warn!(campaign_id = campaign.id, error = %e, "skipping campaign");
                continue;
            }
        };

        for ad_group in &ad_groups {
            let keywords = match client.keywords(campaign.id, ad_group.id).all() {
                Ok(keywords) => keywords,
                Err(e) => {
                    warn!(ad_group_id = ad_group.id, error = %e, "skipping ad group");
                    continue;
                }
            };
            if let Some(d) = check_ad_group(campaign, ad_group, &keywords, threshold) {
                found.push(d);
            }
        }
    }

    found.sort_by(|a, b| b.difference_pct().total_cmp(&a.difference_pct()));
    Ok(found)
}

fn discrepancy_row(d: &BidDiscrepancy) -> Vec<String> {
    vec![
        ellipsize(&d.campaign_name, 25),
        ellipsize(&d.ad_group_name, 20),
        format_bid(d.ad_group_bid, &d.currency),
        format_bid(d.keyword_avg_bid, &d.currency),
        format!("+{:.0}%", d.difference_pct()),
        d.keyword_count.to_string(),
    ]
}

fn print_discrepancies(discrepancies: &[BidDiscrepancy]) {
    let rows: Vec<Vec<String>> = discrepancies.iter().map(discrepancy_row).collect();
    println!();
    print_table(
        &format!("Bid Discrepancies Found ({} ad groups)", discrepancies.len()),
        &["Campaign", "Ad Group", "Ad Group Bid", "Keyword Avg", "Diff %", "Keywords"],
        &rows,
    );
    println!();
}

fn print_details(d: &BidDiscrepancy) {
    println!("{} {}", style("Campaign:").bold(), d.campaign_name);
    println!("{} {}", style("Ad Group:").bold(), d.ad_group_name);
    println!();
    println!("  Current ad group bid:  {}", style(format_bid(d.ad_group_bid, &d.currency)).dim());
    println!("  Keyword average bid:   {}", style(format_bid(d.keyword_avg_bid, &d.currency)).yellow());
    println!(
        "  Keyword range:         {} - {}",
        format_bid(d.keyword_min_bid, &d.currency),
        format_bid(d.keyword_max_bid, &d.currency)
    );
    println!("  Difference:            {}", style(format!("+{:.0}%", d.difference_pct())).red());
    println!();
}

/// Ask what to do; None means stop processing
fn choose_bid(d: &BidDiscrepancy) -> Result<Option<Option<f64>>> {
    println!(
        "{} {}",
        style("Suggested new bid:").bold(),
        format_bid(d.suggested_bid(), &d.currency)
    );
    println!();

    let answer = output::prompt("Action [apply/custom/skip/quit]", Some("apply"))?;
    match Action::parse(&answer) {
        Some(Action::Quit) => {
            output::info("Quitting...");
            Ok(None)
        }
        Some(Action::Skip) => {
            output::dim("Skipped");
            println!();
            Ok(Some(None))
        }
        Some(Action::Custom) => {
            let raw = output::prompt(&format!("Enter new bid ({})", d.currency), None)?;
            match raw.parse::<f64>() {
                Ok(bid) if bid > 0.0 => Ok(Some(Some(bid))),
                _ => {
                    output::warning("Invalid bid amount, skipping");
                    Ok(Some(None))
                }
            }
        }
        Some(Action::Apply) => Ok(Some(Some(d.suggested_bid()))),
        None => {
            output::warning(format!("Unknown action '{}', skipping", answer));
            Ok(Some(None))
        }
    }
}

pub fn run(args: BidCheckArgs, global: &GlobalOpts) -> Result<()> {
    let client = connect(global)?;
    let discrepancies = scan(&client, args.threshold)?;

    if discrepancies.is_empty() {
        output::success(format!(
            "No bid discrepancies found above {}% threshold",
            args.threshold
        ));
        return Ok(());
    }

    print_discrepancies(&discrepancies);

    if args.dry_run {
        output::info("Dry run mode - no changes will be made");
        return Ok(());
    }

    let mut changes = 0;
    for (i, d) in discrepancies.iter().enumerate() {
        output::rule(&format!("{}/{}", i + 1, discrepancies.len()));
        println!();
        print_details(d);

        let new_bid = if args.auto_fix {
            d.suggested_bid()
        } else {
            match choose_bid(d)? {
                None => break,
                Some(None) => continue,
                Some(Some(bid)) => bid,
            }
        };

        let update = AdGroupUpdate {
            default_bid_amount: Some(Money::new(new_bid, &d.currency)),
            ..Default::default()
        };
        with_spinner("Updating ad group bid...", || {
            client.ad_groups(d.campaign_id).update(d.ad_group_id, &update)
        })?;
        output::success(format!(
            "Updated bid: {} → {}",
            format_bid(d.ad_group_bid, &d.currency),
            format_bid(new_bid, &d.currency)
        ));
        changes += 1;
        println!();
    }

    println!();
    if changes > 0 {
        output::result_panel(
            "Optimization Complete",
            &[
                ("Discrepancies found", discrepancies.len().to_string()),
                ("Changes made", changes.to_string()),
            ],
        );
    } else {
        output::info("No changes made");
    }
    Ok(())
}
