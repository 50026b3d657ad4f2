//! `asa keywords` command - Targeting and negative keyword management

use clap::Subcommand;
use miette::{miette, Result};

use crate::api::models::{
    Keyword, KeywordCreate, KeywordStatus, KeywordUpdate, MatchType, Money, NegativeKeyword,
    NegativeKeywordCreate,
};
use crate::api::selector::Selector;
use crate::api::NegativeScope;
use crate::cli::commands::utils::{confirm_destructive, connect, with_spinner};
use crate::cli::output;
use crate::cli::table::{print_json, CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum KeywordCommands {
    /// List keywords in an ad group
    List(ListArgs),

    /// Show one keyword
    Get(GetArgs),

    /// Add a targeting keyword
    Add(AddArgs),

    /// Pause a keyword
    Pause(KeywordRef),

    /// Enable a paused keyword
    Enable(KeywordRef),

    /// Set a keyword's bid
    SetBid(SetBidArgs),

    /// Delete a keyword (cannot be undone)
    Delete(DeleteArgs),

    /// Campaign and ad group negative keywords
    #[command(subcommand)]
    Negatives(NegativeCommands),
}

#[derive(Subcommand, Debug)]
pub enum NegativeCommands {
    /// List negative keywords
    List(NegativeListArgs),

    /// Add a negative keyword
    Add(NegativeAddArgs),

    /// Delete a negative keyword
    Delete(NegativeDeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Campaign ID
    pub campaign_id: i64,

    /// Ad group ID
    pub ad_group_id: i64,

    /// Filter by status
    #[arg(long, short = 's', ignore_case = true)]
    pub status: Option<KeywordStatus>,

    /// Filter by match type
    #[arg(long, short = 'm', ignore_case = true)]
    pub match_type: Option<MatchType>,

    /// Maximum number of results
    #[arg(long, short = 'l', default_value_t = 100)]
    pub limit: u32,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct KeywordRef {
    /// Campaign ID
    pub campaign_id: i64,

    /// Ad group ID
    pub ad_group_id: i64,

    /// Keyword ID
    pub keyword_id: i64,
}

#[derive(clap::Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub target: KeywordRef,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Campaign ID
    pub campaign_id: i64,

    /// Ad group ID
    pub ad_group_id: i64,

    /// Keyword text
    pub text: String,

    /// Match type
    #[arg(long, short = 'm', ignore_case = true, default_value_t = MatchType::Exact)]
    pub match_type: MatchType,

    /// Bid amount (ad group default when omitted)
    #[arg(long, short = 'b')]
    pub bid: Option<f64>,

    /// Currency code
    #[arg(long, short = 'c', default_value = "USD")]
    pub currency: String,
}

#[derive(clap::Args, Debug)]
pub struct SetBidArgs {
    #[command(flatten)]
    pub target: KeywordRef,

    /// New bid amount
    pub bid: f64,

    /// Currency code
    #[arg(long, short = 'c', default_value = "USD")]
    pub currency: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub target: KeywordRef,

    /// Skip confirmation
    #[arg(long, short = 'f')]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct NegativeListArgs {
    /// Campaign ID
    pub campaign_id: i64,

    /// Ad group ID (ad group level negatives)
    #[arg(long, short = 'a')]
    pub ad_group: Option<i64>,

    /// Maximum number of results
    #[arg(long, short = 'l', default_value_t = 100)]
    pub limit: u32,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct NegativeAddArgs {
    /// Campaign ID
    pub campaign_id: i64,

    /// Negative keyword text
    pub text: String,

    /// Ad group ID (ad group level negative)
    #[arg(long, short = 'a')]
    pub ad_group: Option<i64>,

    /// Match type
    #[arg(long, short = 'm', ignore_case = true, default_value_t = MatchType::Exact)]
    pub match_type: MatchType,
}

#[derive(clap::Args, Debug)]
pub struct NegativeDeleteArgs {
    /// Campaign ID
    pub campaign_id: i64,

    /// Negative keyword ID
    pub keyword_id: i64,

    /// Ad group ID (ad group level negative)
    #[arg(long, short = 'a')]
    pub ad_group: Option<i64>,

    /// Skip confirmation
    #[arg(long, short = 'f')]
    pub force: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID"),
    ColumnDef::new("text", "Text"),
    ColumnDef::new("match_type", "Match Type"),
    ColumnDef::new("status", "Status"),
    ColumnDef::new("bid", "Bid"),
];

const NEGATIVE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID"),
    ColumnDef::new("text", "Text"),
    ColumnDef::new("match_type", "Match Type"),
    ColumnDef::new("status", "Status"),
];

pub fn run(cmd: KeywordCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        KeywordCommands::List(args) => run_list(args, global),
        KeywordCommands::Get(args) => run_get(args, global),
        KeywordCommands::Add(args) => run_add(args, global),
        KeywordCommands::Pause(target) => set_status(target, KeywordStatus::Paused, global),
        KeywordCommands::Enable(target) => set_status(target, KeywordStatus::Active, global),
        KeywordCommands::SetBid(args) => run_set_bid(args, global),
        KeywordCommands::Delete(args) => run_delete(args, global),
        KeywordCommands::Negatives(cmd) => match cmd {
            NegativeCommands::List(args) => run_negative_list(args, global),
            NegativeCommands::Add(args) => run_negative_add(args, global),
            NegativeCommands::Delete(args) => run_negative_delete(args, global),
        },
    }
}

fn keyword_row(keyword: &Keyword) -> TableRow {
    TableRow::new()
        .cell("id", CellValue::Id(keyword.id))
        .cell("text", CellValue::text(&keyword.text))
        .cell("match_type", CellValue::text(keyword.match_type.as_str()))
        .cell("status", CellValue::status(keyword.status))
        .cell("bid", CellValue::Money(keyword.bid_amount.clone()))
}

fn negative_row(negative: &NegativeKeyword) -> TableRow {
    TableRow::new()
        .cell("id", CellValue::Id(negative.id))
        .cell("text", CellValue::text(&negative.text))
        .cell("match_type", CellValue::text(negative.match_type.as_str()))
        .cell(
            "status",
            negative.status.as_deref().map(CellValue::status).unwrap_or(CellValue::Empty),
        )
}

/// Selector for the list filters, or None when no filter was given
fn filter_selector(status: Option<KeywordStatus>, match_type: Option<MatchType>, limit: u32) -> Option<Selector> {
    if status.is_none() && match_type.is_none() {
        return None;
    }
    let mut selector = Selector::new().limit(limit);
    if let Some(status) = status {
        selector = selector.where_eq("status", status);
    }
    if let Some(match_type) = match_type {
        selector = selector.where_eq("matchType", match_type);
    }
    Some(selector)
}

/// Bulk endpoints answer with a list; single-item commands want the first
fn single<T>(items: Vec<T>, what: &str) -> Result<T> {
    items
        .into_iter()
        .next()
        .ok_or_else(|| miette!("The API returned no {}", what))
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let client = connect(global)?;
    let keywords = client.keywords(args.campaign_id, args.ad_group_id);
    let selector = filter_selector(args.status, args.match_type, args.limit);
    let page = with_spinner("Fetching keywords...", || match &selector {
        Some(selector) => keywords.find(selector),
        None => keywords.list(args.limit),
    })?;

    if page.data.is_empty() {
        output::warning("No keywords found");
        return Ok(());
    }

    let rows: Vec<TableRow> = page.data.iter().map(keyword_row).collect();
    let title = format!("Keywords ({} total)", page.total());
    TableFormatter::new(COLUMNS, title).output(&rows, args.format)
}

fn run_get(args: GetArgs, global: &GlobalOpts) -> Result<()> {
    let client = connect(global)?;
    let t = &args.target;
    let keyword = with_spinner("Fetching keyword...", || {
        client.keywords(t.campaign_id, t.ad_group_id).get(t.keyword_id)
    })?;

    match args.format {
        OutputFormat::Json => print_json(&keyword),
        format => TableFormatter::new(COLUMNS, "").output(&[keyword_row(&keyword)], format),
    }
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let client = connect(global)?;
    let create = KeywordCreate {
        text: args.text.clone(),
        match_type: args.match_type,
        bid_amount: args.bid.map(|b| Money::new(b, &args.currency)),
    };
    let created = with_spinner("Adding keyword...", || {
        client.keywords(args.campaign_id, args.ad_group_id).create(&[create])
    })?;
    let keyword = single(created, "keyword")?;

    output::result_panel(
        "Keyword Added",
        &[
            ("ID", keyword.id.to_string()),
            ("Text", keyword.text.clone()),
            ("Match Type", keyword.match_type.to_string()),
        ],
    );
    Ok(())
}

fn update_one(target: &KeywordRef, update: KeywordUpdate, message: &str, global: &GlobalOpts) -> Result<Keyword> {
    let client = connect(global)?;
    let updated = with_spinner(message, || {
        client
            .keywords(target.campaign_id, target.ad_group_id)
            .update(&[update])
    })?;
    single(updated, "keyword")
}

fn set_status(target: KeywordRef, status: KeywordStatus, global: &GlobalOpts) -> Result<()> {
    let (verb, done) = match status {
        KeywordStatus::Paused => ("Pausing", "paused"),
        _ => ("Enabling", "enabled"),
    };
    let update = KeywordUpdate {
        id: target.keyword_id,
        status: Some(status),
        ..Default::default()
    };
    let keyword = update_one(&target, update, &format!("{} keyword...", verb), global)?;
    output::success(format!("Keyword '{}' {}", keyword.text, done));
    Ok(())
}

fn run_set_bid(args: SetBidArgs, global: &GlobalOpts) -> Result<()> {
    let update = KeywordUpdate {
        id: args.target.keyword_id,
        bid_amount: Some(Money::new(args.bid, &args.currency)),
        ..Default::default()
    };
    let keyword = update_one(&args.target, update, "Updating keyword bid...", global)?;

    let bid = keyword
        .bid_amount
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string());
    output::result_panel("Keyword Bid Updated", &[("Keyword", keyword.text.clone()), ("Bid", bid)]);
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let client = connect(global)?;
    let t = &args.target;
    let keywords = client.keywords(t.campaign_id, t.ad_group_id);
    let keyword = with_spinner("Fetching keyword...", || keywords.get(t.keyword_id))?;

    let prompt = format!("Are you sure you want to delete keyword '{}'?", keyword.text);
    if !confirm_destructive(args.force, &prompt)? {
        return Ok(());
    }

    with_spinner("Deleting keyword...", || keywords.delete(t.keyword_id))?;
    output::success(format!("Keyword '{}' deleted", keyword.text));
    Ok(())
}

fn run_negative_list(args: NegativeListArgs, global: &GlobalOpts) -> Result<()> {
    let client = connect(global)?;
    let scope = NegativeScope::new(args.campaign_id, args.ad_group);
    let page = with_spinner("Fetching negative keywords...", || client.negatives(scope).list(args.limit))?;

    let level = scope.label();
    if page.data.is_empty() {
        output::warning(format!("No {} negative keywords found", level.to_lowercase()));
        return Ok(());
    }

    let rows: Vec<TableRow> = page.data.iter().map(negative_row).collect();
    let title = format!("{} Negative Keywords ({} total)", level, page.total());
    TableFormatter::new(NEGATIVE_COLUMNS, title).output(&rows, args.format)
}

fn run_negative_add(args: NegativeAddArgs, global: &GlobalOpts) -> Result<()> {
    let client = connect(global)?;
    let scope = NegativeScope::new(args.campaign_id, args.ad_group);
    let create = NegativeKeywordCreate {
        text: args.text.clone(),
        match_type: args.match_type,
    };
    let message = format!("Adding negative keyword at {} level...", scope.label().to_lowercase());
    let created = with_spinner(&message, || client.negatives(scope).create(&[create]))?;
    let negative = single(created, "negative keyword")?;

    output::result_panel(
        "Negative Keyword Added",
        &[
            ("Level", scope.label().to_string()),
            ("Text", negative.text.clone()),
            ("Match Type", negative.match_type.to_string()),
        ],
    );
    Ok(())
}

fn run_negative_delete(args: NegativeDeleteArgs, global: &GlobalOpts) -> Result<()> {
    if !confirm_destructive(args.force, "Are you sure you want to delete this negative keyword?")? {
        return Ok(());
    }

    let client = connect(global)?;
    let scope = NegativeScope::new(args.campaign_id, args.ad_group);
    with_spinner("Deleting negative keyword...", || {
        client.negatives(scope).delete(&[args.keyword_id])
    })?;
    output::success("Negative keyword deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_selector() {
        assert!(filter_selector(None, None, 100).is_none());

        let selector = filter_selector(Some(KeywordStatus::Active), Some(MatchType::Exact), 50).unwrap();
        let v = serde_json::to_value(&selector).unwrap();
        assert_eq!(
            v["conditions"],
            json!([
                {"field": "status", "operator": "EQUALS", "values": ["ACTIVE"]},
                {"field": "matchType", "operator": "EQUALS", "values": ["EXACT"]}
            ])
        );
        assert_eq!(v["pagination"]["limit"], 50);
    }

    #[test]
    fn test_single() {
        assert_eq!(single(vec![3, 4], "keyword").unwrap(), 3);
        let err = single(Vec::<i32>::new(), "keyword").unwrap_err();
        assert_eq!(err.to_string(), "The API returned no keyword");
    }

    #[test]
    fn test_keyword_row() {
        let keyword = Keyword {
            id: 11,
            ad_group_id: 2,
            text: "pdf scanner".to_string(),
            match_type: MatchType::Broad,
            status: KeywordStatus::Active,
            ..Default::default()
        };
        let row = keyword_row(&keyword);
        assert_eq!(row.get("match_type").unwrap().raw(), "BROAD");
        assert_eq!(row.get("status").unwrap().raw(), "ACTIVE");
        assert_eq!(row.get("bid").unwrap().display(), "-");
    }
}
