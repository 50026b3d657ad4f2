//! `asa brand` command - Brand protection campaigns
//!
//! Creates one exact-match campaign per country with a single-keyword ad
//! group for the brand name and each variant.

use console::style;
use dialoguer::{theme::ColorfulTheme, Select};
use miette::{miette, IntoDiagnostic, Result};

use crate::api::models::{AdGroup, AdGroupCreate, Campaign, CampaignCreate, KeywordCreate, MatchType, Money, Status};
use crate::api::{wait_for, Client};
use crate::cli::commands::utils::{connect, with_spinner};
use crate::cli::helpers::{clip, format_bid, title_case};
use crate::cli::output;
use crate::cli::table::print_table;
use crate::cli::GlobalOpts;
use crate::core::countries::{self, CountryIssue, Preset};
use crate::core::naming::{app_name_of, brand_campaign_name};

const DEFAULT_BUDGET: f64 = 50.0;
const DEFAULT_BID: f64 = 1.0;
const MAX_AD_GROUP_NAME: usize = 200;
/// Above this many campaigns the plan is summarized by region
const DETAILED_PLAN_LIMIT: usize = 10;

#[derive(clap::Args, Debug)]
pub struct BrandArgs {
    /// Brand name (prompted when omitted)
    pub brand_name: Option<String>,

    /// Brand name variant (repeatable)
    #[arg(long = "variant")]
    pub variants: Vec<String>,

    /// Target country code (repeatable)
    #[arg(long = "country", short = 'c')]
    pub countries: Vec<String>,

    /// Campaign ID to copy app, budget and bid from
    #[arg(long, short = 'r')]
    pub reference: Option<i64>,

    /// Daily budget per campaign
    #[arg(long, short = 'b')]
    pub budget: Option<f64>,

    /// Default bid
    #[arg(long)]
    pub bid: Option<f64>,

    /// Preview without creating
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Create campaigns in PAUSED status
    #[arg(long, short = 'p')]
    pub paused: bool,

    /// Include China (requires special business documentation)
    #[arg(long)]
    pub include_china: bool,
}

/// One campaign to create
#[derive(Debug, Clone, PartialEq)]
pub struct BrandPlan {
    pub name: String,
    pub country: String,
    pub adam_id: i64,
    pub keywords: Vec<String>,
    pub daily_budget: f64,
    pub default_bid: f64,
    pub currency: String,
}

/// An app found among existing campaigns
#[derive(Debug, Clone, PartialEq)]
pub struct AppChoice {
    pub adam_id: i64,
    pub name: String,
    pub currency: String,
}

/// Brand name plus variants, lowercased and deduplicated in order
pub fn brand_keywords(brand_name: Option<&str>, variants: &[String]) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for kw in brand_name.into_iter().chain(variants.iter().map(String::as_str)) {
        let kw = kw.trim().to_lowercase();
        if !kw.is_empty() && !keywords.contains(&kw) {
            keywords.push(kw);
        }
    }
    keywords
}

/// `Exact - <Title Case keyword>`, capped at the API's name limit
pub fn exact_ad_group_name(keyword: &str) -> String {
    clip(&format!("Exact - {}", title_case(keyword)), MAX_AD_GROUP_NAME)
}

/// Average default bid across ad groups that have one
pub fn average_default_bid(ad_groups: &[AdGroup]) -> Option<f64> {
    let bids: Vec<f64> = ad_groups
        .iter()
        .filter_map(|ag| ag.default_bid_amount.as_ref().map(Money::value))
        .collect();
    (!bids.is_empty()).then(|| bids.iter().sum::<f64>() / bids.len() as f64)
}

/// One entry per adam id, in the order campaigns were listed
pub fn apps_from_campaigns(campaigns: &[Campaign]) -> Vec<AppChoice> {
    let mut apps: Vec<AppChoice> = Vec::new();
    for campaign in campaigns {
        let Some(adam_id) = campaign.adam_id else { continue };
        if apps.iter().any(|a| a.adam_id == adam_id) {
            continue;
        }
        apps.push(AppChoice {
            adam_id,
            name: app_name_of(&campaign.name),
            currency: campaign.currency(),
        });
    }
    apps
}

pub fn plan_campaigns(
    app: &AppChoice,
    countries: &[String],
    keywords: &[String],
    daily_budget: f64,
    default_bid: f64,
) -> Vec<BrandPlan> {
    countries
        .iter()
        .map(|country| BrandPlan {
            name: brand_campaign_name(&app.name, country),
            country: country.clone(),
            adam_id: app.adam_id,
            keywords: keywords.to_vec(),
            daily_budget,
            default_bid,
            currency: app.currency.clone(),
        })
        .collect()
}

fn report_issues(issues: &[CountryIssue]) {
    for issue in issues {
        match issue {
            CountryIssue::Unknown(code) => output::warning(format!("Unknown country code: {}", code)),
            CountryIssue::ChinaExcluded => output::warning(
                "Skipping CN - China requires special business documentation. Use --include-china to include.",
            ),
        }
    }
}

fn prompt_keywords() -> Result<Vec<String>> {
    println!();
    let brand = output::prompt("Enter your brand name", None)?;
    let mut keywords = brand_keywords(Some(&brand), &[]);

    println!();
    output::dim("Enter brand name variants (common misspellings, abbreviations)");
    output::dim("Press Enter with no input when done");
    println!();

    loop {
        let variant = output::prompt_optional("Add variant (or press Enter to continue)")?.to_lowercase();
        if variant.is_empty() {
            break;
        }
        if keywords.contains(&variant) {
            output::warning(format!("Already added: {}", variant));
        } else {
            output::success(format!("Added: {}", variant));
            keywords.push(variant);
        }
    }
    Ok(keywords)
}

fn prompt_countries(include_china: bool) -> Result<Vec<String>> {
    println!();
    output::rule("Select Target Countries");
    println!();

    let mut items: Vec<String> = Preset::ALL
        .iter()
        .map(|p| {
            format!(
                "{:<8} {} ({})",
                p.key(),
                p.description(),
                p.countries(include_china).len()
            )
        })
        .collect();
    items.push("Enter country codes (e.g. US,GB,AU)".to_string());

    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a country preset")
        .items(&items)
        .default(0)
        .interact()
        .into_diagnostic()?;

    if let Some(preset) = Preset::ALL.get(choice) {
        return Ok(preset
            .countries(include_china)
            .into_iter()
            .map(str::to_string)
            .collect());
    }

    let raw = output::prompt("Country codes", None)?;
    if let Some(preset) = Preset::from_key(&raw) {
        return Ok(preset
            .countries(include_china)
            .into_iter()
            .map(str::to_string)
            .collect());
    }
    let (codes, issues) = countries::resolve_codes(raw.split(','), include_china);
    report_issues(&issues);
    Ok(codes)
}

fn prompt_app(client: &Client) -> Result<AppChoice> {
    println!();
    output::info("Select an app to create brand campaigns for:");
    let campaigns = with_spinner("Loading campaigns...", || client.campaigns().all())?;
    let apps = apps_from_campaigns(&campaigns);
    if apps.is_empty() {
        return Err(miette!(
            help = "Create at least one campaign for the app first",
            "No apps: no campaigns found to get app information from"
        ));
    }

    let items: Vec<String> = apps
        .iter()
        .map(|a| format!("{} {}", a.name, style(format!("({})", a.adam_id)).dim()))
        .collect();
    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select app")
        .items(&items)
        .default(0)
        .interact()
        .into_diagnostic()?;
    Ok(apps[choice].clone())
}

fn prompt_amount(label: &str, default: f64) -> Result<f64> {
    let raw = output::prompt(label, Some(&format!("{:.2}", default)))?;
    raw.parse::<f64>()
        .ok()
        .filter(|v| *v > 0.0)
        .ok_or_else(|| miette!("Invalid amount: '{}'", raw))
}

/// App, budget and bid taken from a reference campaign
struct Reference {
    app: AppChoice,
    budget: Option<f64>,
    bid: Option<f64>,
}

fn load_reference(client: &Client, campaign_id: i64) -> Result<Reference> {
    let (campaign, ad_groups) = with_spinner("Loading reference campaign...", || {
        let campaign = client.campaigns().get(campaign_id)?;
        let ad_groups = client.ad_groups(campaign_id).all()?;
        Ok((campaign, ad_groups))
    })?;

    let adam_id = campaign
        .adam_id
        .ok_or_else(|| miette!("Reference campaign {} has no app (adam id)", campaign_id))?;
    let reference = Reference {
        app: AppChoice {
            adam_id,
            name: app_name_of(&campaign.name),
            currency: campaign.currency(),
        },
        budget: campaign.daily_budget_amount.as_ref().map(Money::value),
        bid: average_default_bid(&ad_groups),
    };

    output::info(format!("Reference: {}", campaign.name));
    if let Some(budget) = reference.budget {
        let bid = reference
            .bid
            .map(|b| format!("{:.2}", b))
            .unwrap_or_else(|| "N/A".to_string());
        output::info(format!(
            "  Budget: {:.2} {cur}, Avg bid: {} {cur}",
            budget,
            bid,
            cur = reference.app.currency
        ));
    }
    Ok(reference)
}

fn print_plan(plans: &[BrandPlan], app: &AppChoice, keywords: &[String], paused: bool) {
    let Some(first) = plans.first() else { return };
    println!();
    output::rule("Brand Campaign Plan");
    println!();
    println!("{} {} (Adam ID: {})", style("App:").bold(), app.name, app.adam_id);
    println!("{} {}", style("Keywords:").bold(), keywords.join(", "));
    println!("{} {:.2} {}", style("Daily Budget:").bold(), first.daily_budget, first.currency);
    println!("{} {}", style("Default Bid:").bold(), format_bid(first.default_bid, &first.currency));
    println!("{} {}", style("Status:").bold(), if paused { "PAUSED" } else { "ENABLED" });
    println!();

    if plans.len() > DETAILED_PLAN_LIMIT {
        println!("{} {}", style("Campaigns to create:").bold(), plans.len());
        println!("{} {}", style("Ad groups per campaign:").bold(), keywords.len());
        println!("{} {}", style("Total ad groups:").bold(), plans.len() * keywords.len());
        println!();
        output::dim("Countries by region:");
        let codes: Vec<String> = plans.iter().map(|p| p.country.clone()).collect();
        for (region, members) in countries::group_by_region(&codes) {
            println!("  {}: {}", region, members.join(", "));
        }
    } else {
        let rows: Vec<Vec<String>> = plans
            .iter()
            .enumerate()
            .map(|(i, p)| {
                vec![
                    (i + 1).to_string(),
                    p.name.clone(),
                    format!("{} ({})", p.country, countries::country_name(&p.country)),
                    p.keywords.len().to_string(),
                ]
            })
            .collect();
        print_table(
            &format!("Campaigns to Create ({})", plans.len()),
            &["#", "Campaign Name", "Country", "Ad Groups"],
            &rows,
        );
    }
    println!();
}

#[derive(Debug, Default)]
struct Created {
    campaigns: usize,
    ad_groups: usize,
    keywords: usize,
}

fn create_plan(client: &Client, plan: &BrandPlan, status: Status, created: &mut Created) -> Result<()> {
    let body = CampaignCreate::search_results(
        &plan.name,
        plan.adam_id,
        vec![plan.country.clone()],
        Money::new(plan.daily_budget, &plan.currency),
        status,
    );
    let campaign = with_spinner("Creating campaign...", || client.campaigns().create(&body))?;
    output::success(format!("Created campaign (ID: {})", campaign.id));
    created.campaigns += 1;

    wait_for(|| client.campaigns().get(campaign.id))?;

    let bid = Money::new(plan.default_bid, &plan.currency);
    for keyword in &plan.keywords {
        let name = exact_ad_group_name(keyword);
        let ad_group = with_spinner(&format!("  Creating: {}...", name), || {
            client
                .ad_groups(campaign.id)
                .create(&AdGroupCreate::exact(&name, bid.clone()))
        })?;
        created.ad_groups += 1;

        client.keywords(campaign.id, ad_group.id).create(&[KeywordCreate {
            text: keyword.clone(),
            match_type: MatchType::Exact,
            bid_amount: Some(bid.clone()),
        }])?;
        created.keywords += 1;
        output::success(format!("  {} → '{}'", name, keyword));
    }
    Ok(())
}

pub fn run(args: BrandArgs, global: &GlobalOpts) -> Result<()> {
    let client = connect(global)?;

    // Step 1: keywords
    let keywords = if args.brand_name.is_some() || !args.variants.is_empty() {
        brand_keywords(args.brand_name.as_deref(), &args.variants)
    } else {
        prompt_keywords()?
    };
    if keywords.is_empty() {
        return Err(miette!("No keywords: at least one brand keyword is required"));
    }
    output::info(format!("Brand keywords ({}): {}", keywords.len(), keywords.join(", ")));

    // Step 2: countries
    let target_countries = if args.countries.is_empty() {
        prompt_countries(args.include_china)?
    } else {
        let (codes, issues) =
            countries::resolve_codes(args.countries.iter().map(String::as_str), args.include_china);
        report_issues(&issues);
        codes
    };
    if target_countries.is_empty() {
        return Err(miette!("No countries: no valid target countries selected"));
    }
    let preview: Vec<&str> = target_countries.iter().take(10).map(String::as_str).collect();
    let more = if target_countries.len() > 10 { "..." } else { "" };
    output::info(format!(
        "Target countries ({}): {}{}",
        target_countries.len(),
        preview.join(", "),
        more
    ));

    // Step 3: app (and reference values)
    let (app, ref_budget, ref_bid) = match args.reference {
        Some(id) => {
            let reference = load_reference(&client, id)?;
            (reference.app, reference.budget, reference.bid)
        }
        None => (prompt_app(&client)?, None, None),
    };

    // Step 4: budget and bid
    let mut budget = args.budget.or(ref_budget);
    let mut bid = args.bid.or(ref_bid);
    if budget.is_none() || bid.is_none() {
        println!();
        budget = Some(prompt_amount(
            &format!("Daily budget per campaign ({})", app.currency),
            budget.unwrap_or(DEFAULT_BUDGET),
        )?);
        bid = Some(prompt_amount(
            &format!("Default bid ({})", app.currency),
            bid.unwrap_or(DEFAULT_BID),
        )?);
    }
    let budget = budget.unwrap_or(DEFAULT_BUDGET);
    let bid = bid.unwrap_or(DEFAULT_BID);

    // Step 5-6: plan
    let plans = plan_campaigns(&app, &target_countries, &keywords, budget, bid);
    print_plan(&plans, &app, &keywords, args.paused);

    if args.dry_run {
        output::info("Dry run - no campaigns created");
        return Ok(());
    }

    // Step 7: confirm
    let total = budget * plans.len() as f64;
    println!("{}", style(format!("Total daily budget: {:.2} {}", total, app.currency)).yellow());
    println!();
    if !output::confirm(&format!("Create {} brand campaign(s)?", plans.len()), true)? {
        output::info("Cancelled");
        return Ok(());
    }

    // Step 8: create
    let status = if args.paused { Status::Paused } else { Status::Enabled };
    let mut created = Created::default();
    for (i, plan) in plans.iter().enumerate() {
        println!();
        println!(
            "{} Creating {}...",
            style(format!("[{}/{}]", i + 1, plans.len())).dim(),
            plan.name
        );
        create_plan(&client, plan, status, &mut created)?;
    }

    println!();
    output::result_panel(
        "Brand Campaigns Created",
        &[
            ("Campaigns", created.campaigns.to_string()),
            ("Ad Groups", created.ad_groups.to_string()),
            ("Keywords", created.keywords.to_string()),
            ("Status", status.to_string()),
        ],
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brand_keywords_dedup_in_order() {
        let variants = vec!["Chippy Tool".to_string(), "chippy tools".to_string(), "  ".to_string()];
        assert_eq!(
            brand_keywords(Some("Chippy Tools"), &variants),
            vec!["chippy tools", "chippy tool"]
        );
        assert_eq!(brand_keywords(None, &["ChipTools".to_string()]), vec!["chiptools"]);
        assert!(brand_keywords(None, &[]).is_empty());
    }

    #[test]
    fn test_exact_ad_group_name() {
        assert_eq!(exact_ad_group_name("chippy tools"), "Exact - Chippy Tools");
        let long = "a".repeat(300);
        assert_eq!(exact_ad_group_name(&long).chars().count(), 200);
    }

    #[test]
    fn test_average_default_bid() {
        let ag = |bid: Option<f64>| AdGroup {
            default_bid_amount: bid.map(|b| Money::new(b, "USD")),
            ..Default::default()
        };
        assert_eq!(average_default_bid(&[ag(Some(1.0)), ag(Some(2.0)), ag(None)]), Some(1.5));
        assert_eq!(average_default_bid(&[ag(None)]), None);
        assert_eq!(average_default_bid(&[]), None);
    }

    #[test]
    fn test_apps_from_campaigns_unique_by_adam_id() {
        let camp = |name: &str, adam: Option<i64>, cur: &str| Campaign {
            name: name.to_string(),
            adam_id: adam,
            daily_budget_amount: Some(Money::new(10.0, cur)),
            ..Default::default()
        };
        let campaigns = vec![
            camp("Chippy Tools - US - Generic - EM", Some(1), "USD"),
            camp("Chippy Tools - GB - Generic - EM", Some(1), "GBP"),
            camp("Legacy Campaign", None, "USD"),
            camp("Concrete Calc - Test", Some(2), "AUD"),
        ];
        let apps = apps_from_campaigns(&campaigns);
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].name, "Chippy Tools");
        assert_eq!(apps[0].currency, "USD");
        assert_eq!(apps[1].name, "Concrete Calc");
        assert_eq!(apps[1].currency, "AUD");
    }

    #[test]
    fn test_plan_campaigns() {
        let app = AppChoice {
            adam_id: 7,
            name: "Chippy Tools".to_string(),
            currency: "EUR".to_string(),
        };
        let plans = plan_campaigns(
            &app,
            &["DE".to_string(), "FR".to_string()],
            &["chippy".to_string()],
            25.0,
            0.8,
        );
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].name, "Chippy Tools - DE - Brand - EM");
        assert_eq!(plans[1].country, "FR");
        assert_eq!(plans[1].currency, "EUR");
        assert_eq!(plans[1].keywords, vec!["chippy"]);
    }
}
