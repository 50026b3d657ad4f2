//! `asa campaigns` command - Campaign management

use chrono::Duration;
use clap::Subcommand;
use miette::{miette, Result};
use std::collections::HashMap;

use crate::api::models::{Campaign, CampaignUpdate, Money, Status};
use crate::api::reports::ReportRequest;
use crate::api::selector::Selector;
use crate::cli::commands::utils::{confirm_destructive, connect, with_spinner};
use crate::cli::helpers::today;
use crate::cli::output;
use crate::cli::table::{print_json, CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum CampaignCommands {
    /// List campaigns (enabled only unless --all or --status)
    List(ListArgs),

    /// Show one campaign
    Get(GetArgs),

    /// Pause a campaign
    Pause(IdArg),

    /// Enable a paused campaign
    Enable(IdArg),

    /// Update daily and/or total budget
    SetBudget(SetBudgetArgs),

    /// Delete a campaign (cannot be undone)
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long, short = 's', ignore_case = true)]
    pub status: Option<Status>,

    /// Show all campaigns including paused
    #[arg(long, short = 'a', conflicts_with = "status")]
    pub all: bool,

    /// Include 7-day spend (requires a report call)
    #[arg(long, short = 'w')]
    pub with_spend: bool,

    /// Maximum number of results
    #[arg(long, short = 'l', default_value_t = 100)]
    pub limit: u32,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct GetArgs {
    /// Campaign ID
    pub campaign_id: i64,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct IdArg {
    /// Campaign ID
    pub campaign_id: i64,
}

#[derive(clap::Args, Debug)]
pub struct SetBudgetArgs {
    /// Campaign ID
    pub campaign_id: i64,

    /// Daily budget amount
    #[arg(long, short = 'd')]
    pub daily: Option<f64>,

    /// Total budget amount
    #[arg(long, short = 't')]
    pub total: Option<f64>,

    /// Currency code
    #[arg(long, short = 'c', default_value = "USD")]
    pub currency: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Campaign ID
    pub campaign_id: i64,

    /// Skip confirmation
    #[arg(long, short = 'f')]
    pub force: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID"),
    ColumnDef::new("name", "Name"),
    ColumnDef::new("status", "Status"),
    ColumnDef::new("serving_status", "Serving"),
    ColumnDef::new("daily_budget", "Daily Budget"),
    ColumnDef::new("countries", "Countries"),
];

const COLUMNS_WITH_SPEND: &[ColumnDef] = &[
    ColumnDef::new("id", "ID"),
    ColumnDef::new("name", "Name"),
    ColumnDef::new("status", "Status"),
    ColumnDef::new("serving_status", "Serving"),
    ColumnDef::new("daily_budget", "Daily Budget"),
    ColumnDef::new("spend_7d", "Spend (7d)"),
    ColumnDef::new("countries", "Countries"),
];

pub fn run(cmd: CampaignCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CampaignCommands::List(args) => run_list(args, global),
        CampaignCommands::Get(args) => run_get(args, global),
        CampaignCommands::Pause(args) => set_status(args.campaign_id, Status::Paused, global),
        CampaignCommands::Enable(args) => set_status(args.campaign_id, Status::Enabled, global),
        CampaignCommands::SetBudget(args) => run_set_budget(args, global),
        CampaignCommands::Delete(args) => run_delete(args, global),
    }
}

/// First three countries, then "..."
pub(crate) fn countries_summary(countries: &[String]) -> String {
    let mut shown = countries.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
    if countries.len() > 3 {
        shown.push_str("...");
    }
    shown
}

fn campaign_row(campaign: &Campaign, spend: Option<&Money>) -> TableRow {
    TableRow::new()
        .cell("id", CellValue::Id(campaign.id))
        .cell("name", CellValue::text(&campaign.name))
        .cell("status", CellValue::status(campaign.status))
        .cell(
            "serving_status",
            campaign
                .serving_status
                .map(CellValue::status)
                .unwrap_or(CellValue::Empty),
        )
        .cell("daily_budget", CellValue::Money(campaign.daily_budget_amount.clone()))
        .cell("spend_7d", CellValue::Money(spend.cloned()))
        .cell("countries", CellValue::text(countries_summary(&campaign.countries_or_regions)))
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let client = connect(global)?;

    let filter = match (args.status, args.all) {
        (Some(status), _) => Some(status),
        (None, true) => None,
        (None, false) => Some(Status::Enabled),
    };

    let page = with_spinner("Fetching campaigns...", || match filter {
        Some(status) => client
            .campaigns()
            .find(&Selector::new().where_eq("status", status).limit(args.limit)),
        None => client.campaigns().list(args.limit),
    })?;

    if page.data.is_empty() {
        output::warning("No campaigns found");
        return Ok(());
    }

    let mut spend_by_campaign: HashMap<i64, Money> = HashMap::new();
    if args.with_spend {
        let end = today();
        let request = ReportRequest::new(end - Duration::days(7), end);
        let report = with_spinner("Fetching 7-day spend data...", || client.reports().campaigns(&request))?;
        for row in &report.rows {
            if let (Some(id), Some(spend)) = (row.metadata.campaign_id, row.metrics().local_spend) {
                spend_by_campaign.insert(id, spend);
            }
        }
    }

    let rows: Vec<TableRow> = page
        .data
        .iter()
        .map(|c| campaign_row(c, spend_by_campaign.get(&c.id)))
        .collect();

    let status_label = filter.map(|s| s.to_string()).unwrap_or_else(|| "all".to_string());
    let title = format!("Campaigns ({} {})", page.total(), status_label);
    let columns = if args.with_spend { COLUMNS_WITH_SPEND } else { COLUMNS };
    TableFormatter::new(columns, title).output(&rows, args.format)
}

fn run_get(args: GetArgs, global: &GlobalOpts) -> Result<()> {
    let client = connect(global)?;
    let campaign = with_spinner("Fetching campaign...", || client.campaigns().get(args.campaign_id))?;

    match args.format {
        OutputFormat::Json => print_json(&campaign),
        format => TableFormatter::new(COLUMNS, "").output(&[campaign_row(&campaign, None)], format),
    }
}

fn set_status(campaign_id: i64, status: Status, global: &GlobalOpts) -> Result<()> {
    let client = connect(global)?;
    let (verb, done) = match status {
        Status::Paused => ("Pausing", "paused"),
        _ => ("Enabling", "enabled"),
    };
    let update = CampaignUpdate {
        status: Some(status),
        ..Default::default()
    };
    let campaign = with_spinner(&format!("{} campaign...", verb), || {
        client.campaigns().update(campaign_id, &update)
    })?;
    output::success(format!("Campaign '{}' {}", campaign.name, done));
    Ok(())
}

/// Build the budget update; at least one amount is required
fn budget_update(daily: Option<f64>, total: Option<f64>, currency: &str) -> Result<CampaignUpdate> {
    if daily.is_none() && total.is_none() {
        return Err(miette!("Specify at least --daily or --total budget"));
    }
    Ok(CampaignUpdate {
        daily_budget_amount: daily.map(|d| Money::new(d, currency)),
        budget_amount: total.map(|t| Money::new(t, currency)),
        ..Default::default()
    })
}

fn run_set_budget(args: SetBudgetArgs, global: &GlobalOpts) -> Result<()> {
    let update = budget_update(args.daily, args.total, &args.currency)?;
    let client = connect(global)?;
    let campaign = with_spinner("Updating budget...", || {
        client.campaigns().update(args.campaign_id, &update)
    })?;

    let mut pairs = vec![("Campaign", campaign.name.clone())];
    if let Some(daily) = &campaign.daily_budget_amount {
        pairs.push(("Daily Budget", daily.to_string()));
    }
    if let Some(total) = &campaign.budget_amount {
        pairs.push(("Total Budget", total.to_string()));
    }
    output::result_panel("Budget Updated", &pairs);
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let client = connect(global)?;
    let campaign = with_spinner("Fetching campaign...", || client.campaigns().get(args.campaign_id))?;

    let prompt = format!("Are you sure you want to delete campaign '{}'?", campaign.name);
    if !confirm_destructive(args.force, &prompt)? {
        return Ok(());
    }

    with_spinner("Deleting campaign...", || client.campaigns().delete(args.campaign_id))?;
    output::success(format!("Campaign '{}' deleted", campaign.name));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countries_summary() {
        let codes = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(countries_summary(&codes(&["US"])), "US");
        assert_eq!(countries_summary(&codes(&["US", "CA", "GB"])), "US, CA, GB");
        assert_eq!(countries_summary(&codes(&["US", "CA", "GB", "AU"])), "US, CA, GB...");
        assert_eq!(countries_summary(&[]), "");
    }

    #[test]
    fn test_budget_update_requires_an_amount() {
        let err = budget_update(None, None, "USD").unwrap_err();
        assert_eq!(err.to_string(), "Specify at least --daily or --total budget");

        let update = budget_update(Some(100.0), None, "eur").unwrap();
        assert_eq!(update.daily_budget_amount, Some(Money::new(100.0, "EUR")));
        assert!(update.budget_amount.is_none());
        assert!(update.status.is_none());
    }

    #[test]
    fn test_campaign_row_cells() {
        let campaign = Campaign {
            id: 9,
            name: "Chippy - US - Generic - EM".to_string(),
            status: Status::Paused,
            countries_or_regions: vec!["US".to_string()],
            ..Default::default()
        };
        let row = campaign_row(&campaign, None);
        assert_eq!(row.get("id").unwrap().raw(), "9");
        assert_eq!(row.get("status").unwrap().raw(), "PAUSED");
        assert_eq!(row.get("daily_budget").unwrap().raw(), "");
        assert_eq!(row.get("serving_status").unwrap().raw(), "");
    }
}
