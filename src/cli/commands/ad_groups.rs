//! `asa ad-groups` command - Ad group management

use clap::Subcommand;
use miette::Result;

use crate::api::models::{AdGroup, AdGroupUpdate, Money, Status};
use crate::api::selector::Selector;
use crate::cli::commands::utils::{confirm_destructive, connect, with_spinner};
use crate::cli::output;
use crate::cli::table::{print_json, CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum AdGroupCommands {
    /// List ad groups in a campaign
    List(ListArgs),

    /// Show one ad group
    Get(GetArgs),

    /// Pause an ad group
    Pause(AdGroupRef),

    /// Enable a paused ad group
    Enable(AdGroupRef),

    /// Set the default bid for an ad group
    SetBid(SetBidArgs),

    /// Delete an ad group (cannot be undone)
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Campaign ID
    pub campaign_id: i64,

    /// Filter by status
    #[arg(long, short = 's', ignore_case = true)]
    pub status: Option<Status>,

    /// Maximum number of results
    #[arg(long, short = 'l', default_value_t = 100)]
    pub limit: u32,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct AdGroupRef {
    /// Campaign ID
    pub campaign_id: i64,

    /// Ad group ID
    pub ad_group_id: i64,
}

#[derive(clap::Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub target: AdGroupRef,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct SetBidArgs {
    #[command(flatten)]
    pub target: AdGroupRef,

    /// New default bid amount
    pub bid: f64,

    /// Currency code
    #[arg(long, short = 'c', default_value = "USD")]
    pub currency: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub target: AdGroupRef,

    /// Skip confirmation
    #[arg(long, short = 'f')]
    pub force: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID"),
    ColumnDef::new("name", "Name"),
    ColumnDef::new("status", "Status"),
    ColumnDef::new("serving_status", "Serving"),
    ColumnDef::new("default_bid", "Default Bid"),
    ColumnDef::new("search_match", "Search Match"),
];

pub fn run(cmd: AdGroupCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        AdGroupCommands::List(args) => run_list(args, global),
        AdGroupCommands::Get(args) => run_get(args, global),
        AdGroupCommands::Pause(target) => set_status(target, Status::Paused, global),
        AdGroupCommands::Enable(target) => set_status(target, Status::Enabled, global),
        AdGroupCommands::SetBid(args) => run_set_bid(args, global),
        AdGroupCommands::Delete(args) => run_delete(args, global),
    }
}

fn search_match_label(opt_in: bool) -> &'static str {
    if opt_in {
        "OPT_IN"
    } else {
        "OPT_OUT"
    }
}

fn ad_group_row(ad_group: &AdGroup) -> TableRow {
    TableRow::new()
        .cell("id", CellValue::Id(ad_group.id))
        .cell("name", CellValue::text(&ad_group.name))
        .cell("status", CellValue::status(ad_group.status))
        .cell(
            "serving_status",
            ad_group
                .serving_status
                .map(CellValue::status)
                .unwrap_or(CellValue::Empty),
        )
        .cell("default_bid", CellValue::Money(ad_group.default_bid_amount.clone()))
        .cell(
            "search_match",
            CellValue::text(search_match_label(ad_group.automated_keywords_opt_in)),
        )
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let client = connect(global)?;
    let ad_groups = client.ad_groups(args.campaign_id);
    let page = with_spinner("Fetching ad groups...", || match args.status {
        Some(status) => ad_groups.find(&Selector::new().where_eq("status", status).limit(args.limit)),
        None => ad_groups.list(args.limit),
    })?;

    if page.data.is_empty() {
        output::warning("No ad groups found");
        return Ok(());
    }

    let rows: Vec<TableRow> = page.data.iter().map(ad_group_row).collect();
    let title = format!("Ad Groups ({} total)", page.total());
    TableFormatter::new(COLUMNS, title).output(&rows, args.format)
}

fn run_get(args: GetArgs, global: &GlobalOpts) -> Result<()> {
    let client = connect(global)?;
    let ad_group = with_spinner("Fetching ad group...", || {
        client.ad_groups(args.target.campaign_id).get(args.target.ad_group_id)
    })?;

    match args.format {
        OutputFormat::Json => print_json(&ad_group),
        format => TableFormatter::new(COLUMNS, "").output(&[ad_group_row(&ad_group)], format),
    }
}

fn set_status(target: AdGroupRef, status: Status, global: &GlobalOpts) -> Result<()> {
    let client = connect(global)?;
    let (verb, done) = match status {
        Status::Paused => ("Pausing", "paused"),
        _ => ("Enabling", "enabled"),
    };
    let update = AdGroupUpdate {
        status: Some(status),
        ..Default::default()
    };
    let ad_group = with_spinner(&format!("{} ad group...", verb), || {
        client.ad_groups(target.campaign_id).update(target.ad_group_id, &update)
    })?;
    output::success(format!("Ad group '{}' {}", ad_group.name, done));
    Ok(())
}

fn run_set_bid(args: SetBidArgs, global: &GlobalOpts) -> Result<()> {
    let client = connect(global)?;
    let update = AdGroupUpdate {
        default_bid_amount: Some(Money::new(args.bid, &args.currency)),
        ..Default::default()
    };
    let ad_group = with_spinner("Updating default bid...", || {
        client
            .ad_groups(args.target.campaign_id)
            .update(args.target.ad_group_id, &update)
    })?;

    let bid = ad_group
        .default_bid_amount
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string());
    output::result_panel(
        "Default Bid Updated",
        &[("Ad Group", ad_group.name.clone()), ("Default Bid", bid)],
    );
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let client = connect(global)?;
    let ad_groups = client.ad_groups(args.target.campaign_id);
    let ad_group = with_spinner("Fetching ad group...", || ad_groups.get(args.target.ad_group_id))?;

    let prompt = format!("Are you sure you want to delete ad group '{}'?", ad_group.name);
    if !confirm_destructive(args.force, &prompt)? {
        return Ok(());
    }

    with_spinner("Deleting ad group...", || ad_groups.delete(args.target.ad_group_id))?;
    output::success(format!("Ad group '{}' deleted", ad_group.name));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ad_group_row() {
        let ad_group = AdGroup {
            id: 5,
            campaign_id: 1,
            name: "Exact - Calculator".to_string(),
            status: Status::Enabled,
            default_bid_amount: Some(Money::new(1.25, "USD")),
            automated_keywords_opt_in: false,
            ..Default::default()
        };
        let row = ad_group_row(&ad_group);
        assert_eq!(row.get("default_bid").unwrap().raw(), "1.25 USD");
        assert_eq!(row.get("search_match").unwrap().raw(), "OPT_OUT");
        assert_eq!(search_match_label(true), "OPT_IN");
    }
}
