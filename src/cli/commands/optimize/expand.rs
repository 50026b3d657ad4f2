//! `asa optimize expand` - Expand campaigns to a new market
//!
//! Builds a single-keyword-ad-group campaign for a target country from the
//! keywords that earned impressions in one or more source campaigns over the
//! last 90 days. Bids are averaged when a keyword appears in several sources.

use chrono::Duration;
use console::style;
use miette::{miette, Result};
use std::collections::HashMap;
use tracing::warn;

use crate::api::models::{
    AdGroupCreate, Campaign, CampaignCreate, KeywordCreate, MatchType, Money, NegativeKeywordCreate,
    Status,
};
use crate::api::reports::{Granularity, ReportRequest, ReportRow};
use crate::api::resources::NegativeScope;
use crate::api::{wait_for, Client};
use crate::cli::commands::campaigns::countries_summary;
use crate::cli::commands::utils::{connect, with_spinner};
use crate::cli::helpers::{format_number, parse_selection, round2, title_case, today, truncate_str};
use crate::cli::output::{self, Spinner};
use crate::cli::table::print_table;
use crate::cli::GlobalOpts;
use crate::core::naming::{CampaignName, MatchCode};

const LOOKBACK_DAYS: i64 = 90;
const DEFAULT_BUDGET: f64 = 100.0;
const MAX_AD_GROUP_NAME: usize = 200;
const PLAN_PREVIEW: usize = 20;

#[derive(clap::Args, Debug)]
pub struct ExpandArgs {
    /// Source campaign IDs (interactive selection when omitted)
    pub source_campaigns: Vec<i64>,

    /// Target country code (e.g. CA, DE, FR)
    #[arg(long, short = 'c')]
    pub country: Option<String>,

    /// Only offer campaigns of this type (Generic, Competitor, Brand)
    #[arg(long = "type", short = 't')]
    pub campaign_type: Option<String>,

    /// Only offer campaigns with this match code (EM or BM)
    #[arg(long = "match", short = 'm')]
    pub match_code: Option<String>,

    /// Name for the new campaign (derived from the source when omitted)
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Daily budget (average of the sources when omitted)
    #[arg(long, short = 'b')]
    pub budget: Option<f64>,

    /// Preview the plan without creating anything
    #[arg(long)]
    pub dry_run: bool,

    /// Don't add cross-negative keywords
    #[arg(long)]
    pub skip_negatives: bool,

    /// Create the campaign in PAUSED state
    #[arg(long, short = 'p')]
    pub paused: bool,
}

/// Impressions and observed bids for one keyword across sources
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordStats {
    pub impressions: u64,
    pub bids: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordPlan {
    pub text: String,
    pub bid: f64,
    pub currency: String,
    /// Number of bids the average was taken over
    pub source_count: usize,
    pub impressions: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdGroupPlan {
    pub name: String,
    pub keyword: KeywordPlan,
    pub negatives: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignPlan {
    pub name: String,
    pub country: String,
    pub adam_id: i64,
    pub daily_budget: f64,
    pub currency: String,
    pub ad_groups: Vec<AdGroupPlan>,
}

impl CampaignPlan {
    pub fn negative_count(&self) -> usize {
        self.ad_groups.iter().map(|ag| ag.negatives.len()).sum()
    }
}

/// Fold a keyword report into the per-keyword stats
///
/// Only rows with impressions count; keyword text is lowercased.
pub fn collect_keywords(rows: &[ReportRow], stats: &mut HashMap<String, KeywordStats>) {
    for row in rows {
        let Some(keyword) = &row.metadata.keyword else { continue };
        let impressions = row.metrics().impressions.unwrap_or(0);
        if impressions == 0 {
            continue;
        }
        let entry = stats.entry(keyword.to_lowercase()).or_default();
        entry.impressions += impressions;
        if let Some(bid) = &row.metadata.bid_amount {
            entry.bids.push(bid.value());
        }
    }
}

/// Keywords with at least one bid, most impressions first
pub fn keyword_plans(stats: &HashMap<String, KeywordStats>, currency: &str) -> Vec<KeywordPlan> {
    let mut plans: Vec<KeywordPlan> = stats
        .iter()
        .filter(|(_, s)| !s.bids.is_empty())
        .map(|(text, s)| KeywordPlan {
            text: text.clone(),
            bid: round2(s.bids.iter().sum::<f64>() / s.bids.len() as f64),
            currency: currency.to_string(),
            source_count: s.bids.len(),
            impressions: s.impressions,
        })
        .collect();
    plans.sort_by(|a, b| b.impressions.cmp(&a.impressions).then_with(|| a.text.cmp(&b.text)));
    plans
}

/// `Exact - <Title Case keyword>`, shortened to 197 chars plus "..."
pub fn expanded_ad_group_name(keyword: &str) -> String {
    truncate_str(&format!("Exact - {}", title_case(keyword)), MAX_AD_GROUP_NAME)
}

pub fn plan_name(name: Option<&str>, source_name: &str, country: &str) -> String {
    match (name, CampaignName::parse(source_name)) {
        (Some(name), _) => name.to_string(),
        (None, Some(parsed)) => parsed.with_country(country),
        (None, None) => format!("{} - {}", source_name, country),
    }
}

pub fn plan_budget(budget: Option<f64>, sources: &[Campaign]) -> f64 {
    if let Some(budget) = budget {
        return budget;
    }
    let budgets: Vec<f64> = sources
        .iter()
        .filter_map(|c| c.daily_budget_amount.as_ref().map(Money::value))
        .collect();
    if budgets.is_empty() {
        DEFAULT_BUDGET
    } else {
        budgets.iter().sum::<f64>() / budgets.len() as f64
    }
}

/// One ad group per keyword; each excludes every other keyword unless
/// negatives are skipped
pub fn ad_group_plans(keywords: Vec<KeywordPlan>, skip_negatives: bool) -> Vec<AdGroupPlan> {
    let texts: Vec<String> = keywords.iter().map(|k| k.text.clone()).collect();
    keywords
        .into_iter()
        .map(|keyword| {
            let negatives = if skip_negatives {
                Vec::new()
            } else {
                texts.iter().filter(|t| **t != keyword.text).cloned().collect()
            };
            AdGroupPlan {
                name: expanded_ad_group_name(&keyword.text),
                keyword,
                negatives,
            }
        })
        .collect()
}

/// Campaigns that follow the naming convention, filtered and ordered for
/// selection: by app, then type, then country
pub fn selectable_campaigns(
    campaigns: Vec<Campaign>,
    campaign_type: Option<&str>,
    match_code: Option<MatchCode>,
) -> Vec<(Campaign, CampaignName)> {
    let mut selectable: Vec<(Campaign, CampaignName)> = campaigns
        .into_iter()
        .filter_map(|c| CampaignName::parse(&c.name).map(|parsed| (c, parsed)))
        .filter(|(_, parsed)| {
            campaign_type.map_or(true, |t| parsed.campaign_type.eq_ignore_ascii_case(t))
                && match_code.map_or(true, |m| parsed.match_code == m)
        })
        .collect();
    selectable.sort_by(|(_, a), (_, b)| {
        (&a.app_name, &a.campaign_type, &a.country).cmp(&(&b.app_name, &b.campaign_type, &b.country))
    });
    selectable
}

fn select_interactive(
    client: &Client,
    campaign_type: Option<&str>,
    match_code: Option<MatchCode>,
) -> Result<Vec<Campaign>> {
    let campaigns = with_spinner("Loading campaigns...", || client.campaigns().all())?;
    let selectable = selectable_campaigns(campaigns, campaign_type, match_code);
    if selectable.is_empty() {
        return Ok(Vec::new());
    }

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut previous: Option<(&str, &str)> = None;
    for (i, (campaign, parsed)) in selectable.iter().enumerate() {
        let group = (parsed.app_name.as_str(), parsed.campaign_type.as_str());
        if previous.is_some_and(|p| p != group) {
            rows.push(vec!["·".to_string(); 7]);
        }
        previous = Some(group);
        rows.push(vec![
            (i + 1).to_string(),
            truncate_str(&parsed.app_name, 20),
            parsed.country.clone(),
            parsed.campaign_type.clone(),
            parsed.match_code.to_string(),
            campaign.status.to_string(),
            campaign.id.to_string(),
        ]);
    }

    println!();
    print_table(
        "Available campaigns",
        &["#", "App", "Country", "Type", "Match", "Status", "ID"],
        &rows,
    );
    println!();
    output::dim("Enter campaign numbers separated by commas, ranges (1-3), or 'all'");
    let selection = output::prompt("Select campaigns", Some("all"))?;

    let picked = parse_selection(&selection, selectable.len());
    Ok(selectable
        .into_iter()
        .enumerate()
        .filter(|(i, _)| picked.contains(i))
        .map(|(_, (campaign, _))| campaign)
        .collect())
}

fn load_sources(client: &Client, ids: &[i64]) -> Result<Vec<Campaign>> {
    with_spinner("Loading source campaigns...", || {
        ids.iter().map(|id| client.campaigns().get(*id)).collect()
    })
}

fn print_plan(plan: &CampaignPlan, paused: bool, skip_negatives: bool) {
    println!();
    output::rule("Campaign Plan");
    println!();
    let mut overview = vec![
        ("Campaign Name", plan.name.clone()),
        ("Target Country", plan.country.clone()),
        ("Daily Budget", format!("{:.2} {}", plan.daily_budget, plan.currency)),
        ("Ad Groups", plan.ad_groups.len().to_string()),
        ("Status", if paused { "PAUSED" } else { "ENABLED" }.to_string()),
    ];
    if !skip_negatives {
        overview.push(("Cross-Negatives", plan.negative_count().to_string()));
    }
    for (label, value) in overview {
        println!("{:<16} {}", style(label).bold(), value);
    }
    println!();

    let mut rows: Vec<Vec<String>> = plan
        .ad_groups
        .iter()
        .take(PLAN_PREVIEW)
        .enumerate()
        .map(|(i, ag)| {
            vec![
                (i + 1).to_string(),
                truncate_str(&ag.name, 33),
                ag.keyword.text.clone(),
                format!("{:.2} {}", ag.keyword.bid, ag.keyword.currency),
                format_number(ag.keyword.impressions),
            ]
        })
        .collect();
    if plan.ad_groups.len() > PLAN_PREVIEW {
        rows.push(vec![
            "...".to_string(),
            format!("... and {} more", plan.ad_groups.len() - PLAN_PREVIEW),
            String::new(),
            String::new(),
            String::new(),
        ]);
    }
    print_table(
        "Ad Groups & Keywords (sorted by impressions)",
        &["#", "Ad Group", "Keyword", "Bid", "Impr (90d)"],
        &rows,
    );
    println!();
}

#[derive(Debug, Default)]
struct Created {
    ad_groups: usize,
    keywords: usize,
    negatives: usize,
}

fn create(client: &Client, plan: &CampaignPlan, status: Status) -> Result<(Campaign, Created)> {
    let body = CampaignCreate::search_results(
        &plan.name,
        plan.adam_id,
        vec![plan.country.clone()],
        Money::new(plan.daily_budget, &plan.currency),
        status,
    );
    let campaign = with_spinner("Creating campaign...", || client.campaigns().create(&body))?;
    output::success(format!("Created campaign: {} (ID: {})", campaign.name, campaign.id));
    wait_for(|| client.campaigns().get(campaign.id))?;

    let total = plan.ad_groups.len();
    output::info(format!("Creating {} ad groups...", total));

    let mut created = Created::default();
    for (i, ag_plan) in plan.ad_groups.iter().enumerate() {
        let bid = Money::new(ag_plan.keyword.bid, &ag_plan.keyword.currency);
        let spinner = Spinner::start(format!(
            "[{}/{}] Creating ad group: {}",
            i + 1,
            total,
            truncate_str(&ag_plan.name, 33)
        ));
        let ad_group = client
            .ad_groups(campaign.id)
            .create(&AdGroupCreate::exact(&ag_plan.name, bid.clone()))?;
        created.ad_groups += 1;
        drop(spinner);
        output::success(format!(
            "[{}/{}] Created ad group: {} (ID: {})",
            i + 1,
            total,
            ad_group.name,
            ad_group.id
        ));

        client.keywords(campaign.id, ad_group.id).create(&[KeywordCreate {
            text: ag_plan.keyword.text.clone(),
            match_type: MatchType::Exact,
            bid_amount: Some(bid),
        }])?;
        created.keywords += 1;

        if ag_plan.negatives.is_empty() {
            continue;
        }
        let negatives: Vec<NegativeKeywordCreate> = ag_plan
            .negatives
            .iter()
            .map(|text| NegativeKeywordCreate {
                text: text.clone(),
                match_type: MatchType::Exact,
            })
            .collect();
        match client
            .negatives(NegativeScope::new(campaign.id, Some(ad_group.id)))
            .create(&negatives)
        {
            Ok(added) => created.negatives += added.len(),
            Err(e) => warn!(ad_group_id = ad_group.id, error = %e, "negative keywords not created"),
        }
    }
    Ok((campaign, created))
}

pub fn run(args: ExpandArgs, global: &GlobalOpts) -> Result<()> {
    let match_code = match args.match_code.as_deref() {
        Some(raw) => Some(
            MatchCode::parse(raw).ok_or_else(|| miette!("Invalid match type '{}'. Use EM or BM", raw))?,
        ),
        None => None,
    };
    let client = connect(global)?;

    // Step 1: sources
    let sources = if args.source_campaigns.is_empty() {
        select_interactive(&client, args.campaign_type.as_deref(), match_code)?
    } else {
        load_sources(&client, &args.source_campaigns)?
    };
    let Some(first) = sources.first() else {
        return Err(miette!("No campaigns selected"));
    };

    println!();
    output::info(format!("Selected source campaigns ({}):", sources.len()));
    for c in &sources {
        println!("  • {} ({})", c.name, countries_summary(&c.countries_or_regions));
    }
    println!();

    // Step 2: target country
    let country = match args.country {
        Some(country) => country,
        None => output::prompt("Target country code (e.g. CA, DE, FR)", None)?,
    }
    .trim()
    .to_uppercase();

    let adam_id = first
        .adam_id
        .ok_or_else(|| miette!("Source campaign {} has no app (adam id)", first.id))?;
    let currency = first.currency();

    // Step 3: keywords with impressions in the lookback window
    let end = today();
    let request = ReportRequest::new(end - Duration::days(LOOKBACK_DAYS), end).granularity(Granularity::Daily);
    let mut stats: HashMap<String, KeywordStats> = HashMap::new();
    for campaign in &sources {
        let spinner = Spinner::start(format!(
            "Fetching keyword performance for {} ({} days)...",
            campaign.name, LOOKBACK_DAYS
        ));
        let report = client.reports().keywords(campaign.id, None, &request);
        drop(spinner);
        match report {
            Ok(report) => collect_keywords(&report.rows, &mut stats),
            Err(e) => output::warning(format!("Could not get report for {}: {}", campaign.name, e)),
        }
    }

    let keywords = keyword_plans(&stats, &currency);
    if keywords.is_empty() {
        return Err(miette!(
            "No keywords: no keywords with impressions found in last {} days",
            LOOKBACK_DAYS
        ));
    }
    let total_impressions: u64 = keywords.iter().map(|k| k.impressions).sum();
    output::info(format!(
        "Found {} keywords with {} impressions in last {} days",
        keywords.len(),
        format_number(total_impressions),
        LOOKBACK_DAYS
    ));

    // Step 4: plan
    let plan = CampaignPlan {
        name: plan_name(args.name.as_deref(), &first.name, &country),
        country,
        adam_id,
        daily_budget: plan_budget(args.budget, &sources),
        currency,
        ad_groups: ad_group_plans(keywords, args.skip_negatives),
    };
    print_plan(&plan, args.paused, args.skip_negatives);

    if args.dry_run {
        output::info("Dry run mode - no changes will be made");
        return Ok(());
    }

    if !output::confirm("Create this campaign?", true)? {
        output::info("Cancelled");
        return Ok(());
    }
    println!();

    let status = if args.paused { Status::Paused } else { Status::Enabled };
    let (campaign, created) = create(&client, &plan, status)?;

    println!();
    output::result_panel(
        "Campaign Created Successfully",
        &[
            ("Campaign ID", campaign.id.to_string()),
            ("Campaign Name", campaign.name.clone()),
            ("Target Country", plan.country.clone()),
            ("Ad Groups", created.ad_groups.to_string()),
            ("Keywords", created.keywords.to_string()),
            ("Negative Keywords", created.negatives.to_string()),
            ("Status", status.to_string()),
        ],
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::reports::{Metrics, RowMetadata};

    fn row(keyword: &str, impressions: u64, bid: Option<f64>) -> ReportRow {
        ReportRow {
            metadata: RowMetadata {
                keyword: Some(keyword.to_string()),
                bid_amount: bid.map(|b| Money::new(b, "USD")),
                ..Default::default()
            },
            total: Some(Metrics {
                impressions: Some(impressions),
                ..Default::default()
            }),
            granularity: Vec::new(),
        }
    }

    #[test]
    fn test_collect_keywords_merges_sources() {
        let mut stats = HashMap::new();
        collect_keywords(
            &[row("Chisel", 100, Some(1.0)), row("plane", 0, Some(3.0))],
            &mut stats,
        );
        collect_keywords(&[row("chisel", 50, Some(2.0)), row("saw", 10, None)], &mut stats);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats["chisel"].impressions, 150);
        assert_eq!(stats["chisel"].bids, vec![1.0, 2.0]);
        assert!(stats["saw"].bids.is_empty());
        assert!(!stats.contains_key("plane"));
    }

    #[test]
    fn test_keyword_plans_sorted_and_averaged() {
        let mut stats = HashMap::new();
        collect_keywords(
            &[
                row("chisel", 100, Some(1.0)),
                row("chisel", 50, Some(1.25)),
                row("router", 500, Some(2.0)),
                row("saw", 900, None),
            ],
            &mut stats,
        );
        let plans = keyword_plans(&stats, "CAD");
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].text, "router");
        assert_eq!(plans[1].text, "chisel");
        assert_eq!(plans[1].bid, 1.13);
        assert_eq!(plans[1].source_count, 2);
        assert_eq!(plans[1].currency, "CAD");
    }

    #[test]
    fn test_expanded_ad_group_name() {
        assert_eq!(expanded_ad_group_name("wood chisel"), "Exact - Wood Chisel");
        let name = expanded_ad_group_name(&"x".repeat(250));
        assert_eq!(name.chars().count(), 200);
        assert!(name.ends_with("..."));
    }

    #[test]
    fn test_plan_name_fallbacks() {
        assert_eq!(plan_name(Some("Custom"), "anything", "CA"), "Custom");
        assert_eq!(
            plan_name(None, "Chippy Tools - US - Generic - EM", "CA"),
            "Chippy Tools - CA - Generic - Exact Match"
        );
        assert_eq!(plan_name(None, "My Campaign", "CA"), "My Campaign - CA");
    }

    #[test]
    fn test_plan_budget() {
        let camp = |budget: Option<f64>| Campaign {
            daily_budget_amount: budget.map(|b| Money::new(b, "USD")),
            ..Default::default()
        };
        assert_eq!(plan_budget(Some(42.0), &[camp(Some(10.0))]), 42.0);
        assert_eq!(plan_budget(None, &[camp(Some(10.0)), camp(Some(30.0)), camp(None)]), 20.0);
        assert_eq!(plan_budget(None, &[camp(None)]), 100.0);
    }

    #[test]
    fn test_cross_negatives() {
        let kw = |text: &str| KeywordPlan {
            text: text.to_string(),
            bid: 1.0,
            currency: "USD".to_string(),
            source_count: 1,
            impressions: 1,
        };
        let plans = ad_group_plans(vec![kw("a"), kw("b"), kw("c")], false);
        assert_eq!(plans[0].negatives, vec!["b", "c"]);
        assert_eq!(plans[2].negatives, vec!["a", "b"]);
        assert_eq!(plans[1].name, "Exact - B");

        let plans = ad_group_plans(vec![kw("a"), kw("b")], true);
        assert!(plans.iter().all(|p| p.negatives.is_empty()));
    }

    #[test]
    fn test_selectable_campaigns_filters_and_orders() {
        let camp = |id: i64, name: &str| Campaign {
            id,
            name: name.to_string(),
            ..Default::default()
        };
        let campaigns = vec![
            camp(1, "Zeta - US - Generic - EM"),
            camp(2, "Alpha - GB - Generic - EM"),
            camp(3, "Alpha - AU - Generic - EM"),
            camp(4, "Alpha - US - Brand - EM"),
            camp(5, "Alpha - US - Generic - BM"),
            camp(6, "Not a convention name"),
        ];

        let all = selectable_campaigns(campaigns.clone(), None, None);
        let ids: Vec<i64> = all.iter().map(|(c, _)| c.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 5, 1]);

        let generic_em = selectable_campaigns(campaigns, Some("generic"), Some(MatchCode::Exact));
        let ids: Vec<i64> = generic_em.iter().map(|(c, _)| c.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }
}
