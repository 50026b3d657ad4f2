//! `asa impression-share` command - Search term impression share analysis
//!
//! Every subcommand runs an impression share custom report over a window
//! ending yesterday. The API caps the lookback at 30 days.

use clap::Subcommand;
use console::style;
use miette::{miette, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::api::custom_reports::ImpressionShareRow;
use crate::api::models::{AdGroup, Campaign, Keyword, Money};
use crate::api::reports::Granularity;
use crate::api::Client;
use crate::cli::commands::utils::{connect, enabled_ad_groups, enabled_campaigns, with_spinner};
use crate::cli::helpers::{truncate_str, window_ending_yesterday};
use crate::cli::output;
use crate::cli::table::{print_table, write_csv_file};
use crate::cli::GlobalOpts;

const MAX_DAYS: u32 = 30;

#[derive(Subcommand, Debug)]
pub enum ImpressionShareCommands {
    /// Impression share per search term, lowest share first
    Analyze(AnalyzeArgs),

    /// Every report row, shown or exported
    Report(ReportArgs),

    /// Share overview by app and country
    Summary(SummaryArgs),

    /// Match search terms to your keywords and their bids
    Correlate(CorrelateArgs),
}

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// Number of days to analyze (max 30)
    #[arg(long, short = 'd', default_value_t = 7)]
    pub days: u32,

    /// Filter by country code (e.g. US, AU)
    #[arg(long, short = 'c')]
    pub country: Option<String>,

    /// Only search terms with share below this percent
    #[arg(long)]
    pub min_share: Option<f64>,

    /// Filter by search term (partial match)
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Filter by app name (partial match)
    #[arg(long, short = 'a')]
    pub app: Option<String>,

    /// Max rows to display (0 for all)
    #[arg(long, short = 'l', default_value_t = 100)]
    pub limit: usize,

    /// Export to CSV file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ReportArgs {
    /// Number of days to analyze (max 30)
    #[arg(long, short = 'd', default_value_t = 7)]
    pub days: u32,

    /// Save to CSV file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Filter by country code
    #[arg(long, short = 'c')]
    pub country: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SummaryArgs {
    /// Number of days to analyze (max 30)
    #[arg(long, short = 'd', default_value_t = 7)]
    pub days: u32,
}

#[derive(clap::Args, Debug)]
pub struct CorrelateArgs {
    /// Number of days to analyze (max 30)
    #[arg(long, short = 'd', default_value_t = 7)]
    pub days: u32,

    /// Country code (required)
    #[arg(long, short = 'c')]
    pub country: Option<String>,

    /// Only search terms with share below this percent
    #[arg(long)]
    pub min_share: Option<f64>,

    /// Only search terms not matched to a keyword
    #[arg(long, short = 'u', conflicts_with = "matched")]
    pub unmatched: bool,

    /// Only search terms matched to a keyword
    #[arg(long, short = 'm')]
    pub matched: bool,

    /// Max rows to display (0 for all)
    #[arg(long, short = 'l', default_value_t = 50)]
    pub limit: usize,

    /// Export to CSV file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(cmd: ImpressionShareCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ImpressionShareCommands::Analyze(args) => run_analyze(args, global),
        ImpressionShareCommands::Report(args) => run_report(args, global),
        ImpressionShareCommands::Summary(args) => run_summary(args, global),
        ImpressionShareCommands::Correlate(args) => run_correlate(args, global),
    }
}

// Share math and rendering

/// Share range as `low-high%`, in whole percents
pub fn share_range(low: Option<f64>, high: Option<f64>) -> String {
    if low.is_none() && high.is_none() {
        return "N/A".to_string();
    }
    let percent = |v: Option<f64>| v.filter(|v| *v != 0.0).map(|v| ((v * 100.0) as i64).to_string());
    format!(
        "{}-{}%",
        percent(low).unwrap_or_else(|| "0".to_string()),
        percent(high).unwrap_or_else(|| "?".to_string())
    )
}

/// ONE..FOUR as digits, GREATER_THAN_FOUR as `>4`
pub fn rank_display(rank: Option<&str>) -> String {
    match rank {
        None | Some("") => "N/A".to_string(),
        Some("ONE") => "1".to_string(),
        Some("TWO") => "2".to_string(),
        Some("THREE") => "3".to_string(),
        Some("FOUR") => "4".to_string(),
        Some("GREATER_THAN_FOUR") => ">4".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Midpoint of the share range; a missing high counts as the low
pub fn avg_share(low: Option<f64>, high: Option<f64>) -> f64 {
    if low.is_none() && high.is_none() {
        return 0.0;
    }
    let low = low.unwrap_or(0.0);
    let high = high.filter(|h| *h != 0.0).unwrap_or(low);
    (low + high) / 2.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareBucket {
    /// Below 30%
    Low,
    /// 30% to 50%
    Medium,
    /// 50% and up
    High,
}

impl ShareBucket {
    /// Bucket by high share; None when the high share is unknown
    pub fn of(high: Option<f64>) -> Option<ShareBucket> {
        let high = high.filter(|h| *h != 0.0)?;
        Some(if high < 0.3 {
            ShareBucket::Low
        } else if high < 0.5 {
            ShareBucket::Medium
        } else {
            ShareBucket::High
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl BucketCounts {
    pub fn tally<I>(highs: I) -> BucketCounts
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut counts = BucketCounts::default();
        for bucket in highs.into_iter().filter_map(ShareBucket::of) {
            match bucket {
                ShareBucket::Low => counts.low += 1,
                ShareBucket::Medium => counts.medium += 1,
                ShareBucket::High => counts.high += 1,
            }
        }
        counts
    }
}

fn styled_share(row: &ImpressionShareRow) -> String {
    let range = share_range(row.low_impression_share, row.high_impression_share);
    match ShareBucket::of(row.high_impression_share) {
        Some(ShareBucket::Low) => style(range).red().to_string(),
        Some(ShareBucket::Medium) => style(range).yellow().to_string(),
        _ => style(range).green().to_string(),
    }
}

fn opt_field<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn row_avg_share(row: &ImpressionShareRow) -> f64 {
    avg_share(row.low_impression_share, row.high_impression_share)
}

fn below_share(high: Option<f64>, min_share: Option<f64>) -> bool {
    match min_share {
        Some(percent) => high.is_some_and(|h| h < percent / 100.0),
        None => true,
    }
}

/// Keep the latest row per (search term, country)
pub fn latest_per_term(rows: Vec<ImpressionShareRow>) -> Vec<ImpressionShareRow> {
    let mut latest: BTreeMap<(String, String), ImpressionShareRow> = BTreeMap::new();
    for row in rows {
        let key = (row.search_term.clone(), row.country_or_region.clone());
        match latest.get(&key) {
            Some(existing) if existing.date >= row.date => {}
            _ => {
                latest.insert(key, row);
            }
        }
    }
    latest.into_values().collect()
}

/// Lowest average share first
fn sort_by_share(rows: &mut [ImpressionShareRow]) {
    rows.sort_by(|a, b| row_avg_share(a).total_cmp(&row_avg_share(b)));
}

// Shared command plumbing

fn cap_days(days: u32) -> u32 {
    if days > MAX_DAYS {
        output::warning(format!("Maximum lookback is {} days, using {}", MAX_DAYS, MAX_DAYS));
        MAX_DAYS
    } else {
        days
    }
}

fn fetch_rows(
    client: &Client,
    days: u32,
    country: Option<&str>,
    message: &str,
) -> Result<Vec<ImpressionShareRow>> {
    let (start, end) = window_ending_yesterday(days, true);
    let countries = country.map(|cc| vec![cc.to_uppercase()]);
    with_spinner(message, || {
        client
            .custom_reports()
            .impression_share(start, end, Granularity::Daily, countries.as_deref())
    })
}

fn display_limit(limit: usize, len: usize) -> usize {
    if limit == 0 {
        len
    } else {
        limit.min(len)
    }
}

fn print_share_table(rows: &[ImpressionShareRow], limit: usize) {
    let shown = display_limit(limit, rows.len());
    let table_rows: Vec<Vec<String>> = rows
        .iter()
        .take(shown)
        .map(|r| {
            vec![
                truncate_str(&r.app_name, 25),
                truncate_str(&r.search_term, 35),
                r.country_or_region.clone(),
                styled_share(r),
                rank_display(r.rank.as_deref()),
                r.search_popularity
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "N/A".to_string()),
                r.date.clone(),
            ]
        })
        .collect();
    print_table(
        "Impression Share Analysis",
        &["App", "Search Term", "Country", "Share", "Rank", "Pop", "Date"],
        &table_rows,
    );
    if rows.len() > shown {
        output::info(format!(
            "Showing {} of {} results. Use --limit or --output to see all.",
            shown,
            rows.len()
        ));
    }
}

fn export(path: &Path, headers: &[&str], records: &[Vec<String>]) {
    match write_csv_file(path, headers, records) {
        Ok(()) => output::success(format!("Exported {} rows to {}", records.len(), path.display())),
        Err(e) => output::error_panel("Export failed", &e.to_string(), None),
    }
}

// analyze

fn run_analyze(args: AnalyzeArgs, global: &GlobalOpts) -> Result<()> {
    let days = cap_days(args.days);
    let client = connect(global)?;
    let rows = fetch_rows(&client, days, args.country.as_deref(), "Creating impression share report...")?;

    if rows.is_empty() {
        output::warning("No impression share data available for the selected period");
        return Ok(());
    }
    output::success(format!("Retrieved {} records", rows.len()));

    let app = args.app.as_deref().map(str::to_lowercase);
    let search = args.search.as_deref().map(str::to_lowercase);
    let mut rows: Vec<ImpressionShareRow> = latest_per_term(rows)
        .into_iter()
        .filter(|r| app.as_ref().map_or(true, |a| r.app_name.to_lowercase().contains(a)))
        .filter(|r| search.as_ref().map_or(true, |s| r.search_term.to_lowercase().contains(s)))
        .filter(|r| below_share(r.high_impression_share, args.min_share))
        .collect();

    if rows.is_empty() {
        output::warning("No search terms match the specified filters");
        return Ok(());
    }
    sort_by_share(&mut rows);

    if let Some(path) = &args.output {
        let records: Vec<Vec<String>> = rows
            .iter()
            .map(|r| {
                vec![
                    r.search_term.clone(),
                    r.country_or_region.clone(),
                    opt_field(r.low_impression_share),
                    opt_field(r.high_impression_share),
                    opt_field(r.rank.as_ref()),
                    opt_field(r.search_popularity),
                    r.date.clone(),
                    r.app_name.clone(),
                ]
            })
            .collect();
        export(
            path,
            &["search_term", "country", "low_share", "high_share", "rank", "popularity", "date", "app_name"],
            &records,
        );
    }

    print_share_table(&rows, args.limit);

    let counts = BucketCounts::tally(rows.iter().map(|r| r.high_impression_share));
    println!();
    println!("{} {}", style("Total unique search terms:").dim(), rows.len());
    println!(
        "  {} {} - {}",
        style("Low share (<30%):").dim(),
        counts.low,
        style("bid increase suggested").red()
    );
    println!(
        "  {} {} - {}",
        style("Medium share (30-50%):").dim(),
        counts.medium,
        style("consider increase").yellow()
    );
    println!(
        "  {} {} - {}",
        style("High share (50%+):").dim(),
        counts.high,
        style("performing well").green()
    );
    Ok(())
}

// report

fn run_report(args: ReportArgs, global: &GlobalOpts) -> Result<()> {
    let days = cap_days(args.days);
    let client = connect(global)?;
    let rows = fetch_rows(&client, days, args.country.as_deref(), "Generating impression share report...")?;

    if rows.is_empty() {
        output::warning("No data available");
        return Ok(());
    }
    output::success(format!("Report generated with {} records", rows.len()));

    match &args.output {
        Some(path) => {
            let records: Vec<Vec<String>> = rows
                .iter()
                .map(|r| {
                    vec![
                        r.date.clone(),
                        r.search_term.clone(),
                        r.country_or_region.clone(),
                        opt_field(r.low_impression_share),
                        opt_field(r.high_impression_share),
                        opt_field(r.rank.as_ref()),
                        opt_field(r.search_popularity),
                        r.app_name.clone(),
                        r.adam_id.clone(),
                    ]
                })
                .collect();
            export(
                path,
                &[
                    "date",
                    "search_term",
                    "country",
                    "low_share",
                    "high_share",
                    "rank",
                    "popularity",
                    "app_name",
                    "adam_id",
                ],
                &records,
            );
        }
        None => print_share_table(&rows, 100),
    }
    Ok(())
}

// summary

#[derive(Debug, Clone, PartialEq)]
pub struct CountrySummary {
    pub country: String,
    pub terms: usize,
    pub avg_share: f64,
    pub buckets: BucketCounts,
}

/// Per app (alphabetical), per country (most terms first)
pub fn summarize(rows: &[ImpressionShareRow]) -> Vec<(String, Vec<CountrySummary>)> {
    let mut by_app: BTreeMap<String, BTreeMap<String, Vec<&ImpressionShareRow>>> = BTreeMap::new();
    for row in rows {
        let app = if row.app_name.is_empty() {
            "Unknown".to_string()
        } else {
            row.app_name.clone()
        };
        by_app
            .entry(app)
            .or_default()
            .entry(row.country_or_region.clone())
            .or_default()
            .push(row);
    }

    by_app
        .into_iter()
        .map(|(app, countries)| {
            let mut summaries: Vec<CountrySummary> = countries
                .into_iter()
                .map(|(country, items)| {
                    let terms: BTreeSet<&str> = items.iter().map(|i| i.search_term.as_str()).collect();
                    let shares: Vec<f64> = items
                        .iter()
                        .map(|i| row_avg_share(i))
                        .filter(|s| *s > 0.0)
                        .collect();
                    CountrySummary {
                        country,
                        terms: terms.len(),
                        avg_share: if shares.is_empty() {
                            0.0
                        } else {
                            shares.iter().sum::<f64>() / shares.len() as f64
                        },
                        buckets: BucketCounts::tally(items.iter().map(|i| i.high_impression_share)),
                    }
                })
                .collect();
            summaries.sort_by(|a, b| b.terms.cmp(&a.terms));
            (app, summaries)
        })
        .collect()
}

fn run_summary(args: SummaryArgs, global: &GlobalOpts) -> Result<()> {
    let days = cap_days(args.days);
    let client = connect(global)?;
    let rows = fetch_rows(&client, days, None, "Generating summary...")?;

    if rows.is_empty() {
        output::warning("No data available");
        return Ok(());
    }

    let summary = summarize(&rows);
    let mut table_rows: Vec<Vec<String>> = Vec::new();
    let mut total_terms = 0;
    let mut countries: BTreeSet<&str> = BTreeSet::new();
    for (i, (app, per_country)) in summary.iter().enumerate() {
        if i > 0 {
            table_rows.push(vec![String::new(); 7]);
        }
        for (j, c) in per_country.iter().enumerate() {
            total_terms += c.terms;
            countries.insert(&c.country);
            table_rows.push(vec![
                if j == 0 { truncate_str(app, 25) } else { String::new() },
                c.country.clone(),
                c.terms.to_string(),
                format!("{:.0}%", c.avg_share * 100.0),
                c.buckets.low.to_string(),
                c.buckets.medium.to_string(),
                c.buckets.high.to_string(),
            ]);
        }
    }

    print_table(
        &format!("Impression Share Summary ({} days)", days),
        &["App", "Country", "Search Terms", "Avg Share", "<30%", "30-50%", ">50%"],
        &table_rows,
    );
    println!();
    output::info(format!(
        "Total: {} search terms across {} apps and {} countries",
        total_terms,
        summary.len(),
        countries.len()
    ));
    Ok(())
}

// correlate

/// A keyword a search term can be matched to
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordInfo {
    pub keyword_id: i64,
    pub keyword_text: String,
    pub campaign_id: i64,
    pub campaign_name: String,
    pub ad_group_id: i64,
    pub ad_group_name: String,
    pub bid: f64,
    pub currency: String,
}

/// Lowercased keyword text to every keyword with that text
pub type KeywordIndex = HashMap<String, Vec<KeywordInfo>>;

pub fn index_keywords(index: &mut KeywordIndex, campaign: &Campaign, ad_group: &AdGroup, keywords: &[Keyword]) {
    for keyword in keywords {
        index
            .entry(keyword.text.to_lowercase())
            .or_default()
            .push(KeywordInfo {
                keyword_id: keyword.id,
                keyword_text: keyword.text.clone(),
                campaign_id: campaign.id,
                campaign_name: campaign.name.clone(),
                ad_group_id: ad_group.id,
                ad_group_name: ad_group.name.clone(),
                bid: keyword.bid_amount.as_ref().map(Money::value).unwrap_or(0.0),
                currency: keyword
                    .bid_amount
                    .as_ref()
                    .map(|m| m.currency.clone())
                    .unwrap_or_else(|| "USD".to_string()),
            });
    }
}

fn build_keyword_index(client: &Client, country: &str) -> crate::api::Result<KeywordIndex> {
    let mut index = KeywordIndex::new();
    let campaigns = enabled_campaigns(client)?;
    for campaign in campaigns
        .iter()
        .filter(|c| c.countries_or_regions.iter().any(|cc| cc.eq_ignore_ascii_case(country)))
    {
        let ad_groups = match enabled_ad_groups(client, campaign.id) {
            Ok(ad_groups) => ad_groups,
            Err(e) => {
                warn!(campaign_id = campaign.id, error = %e, "skipping campaign");
                continue;
            }
        };
        for ad_group in &ad_groups {
            match client.keywords(campaign.id, ad_group.id).all() {
                Ok(keywords) => index_keywords(&mut index, campaign, ad_group, &keywords),
                Err(e) => warn!(ad_group_id = ad_group.id, error = %e, "skipping ad group"),
            }
        }
    }
    Ok(index)
}

/// A search term and the keyword it matched, if any
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelatedTerm {
    pub row: ImpressionShareRow,
    pub keyword: Option<KeywordInfo>,
}

impl CorrelatedTerm {
    pub fn is_matched(&self) -> bool {
        self.keyword.is_some()
    }
}

/// Match the latest row per term in `country` to the first indexed keyword
pub fn correlate(rows: Vec<ImpressionShareRow>, country: &str, index: &KeywordIndex) -> Vec<CorrelatedTerm> {
    latest_per_term(rows)
        .into_iter()
        .filter(|r| r.country_or_region.eq_ignore_ascii_case(country))
        .map(|row| {
            let keyword = index
                .get(&row.search_term.to_lowercase())
                .and_then(|matches| matches.first())
                .cloned();
            CorrelatedTerm { row, keyword }
        })
        .collect()
}

fn correlate_record(c: &CorrelatedTerm) -> Vec<String> {
    let r = &c.row;
    let kw = c.keyword.as_ref();
    vec![
        r.search_term.clone(),
        r.country_or_region.clone(),
        r.app_name.clone(),
        opt_field(r.low_impression_share),
        opt_field(r.high_impression_share),
        opt_field(r.rank.as_ref()),
        opt_field(r.search_popularity),
        opt_field(kw.map(|k| &k.campaign_name)),
        opt_field(kw.map(|k| &k.ad_group_name)),
        opt_field(kw.map(|k| &k.keyword_text)),
        opt_field(kw.map(|k| k.bid)),
        opt_field(kw.map(|k| &k.currency)),
    ]
}

fn run_correlate(args: CorrelateArgs, global: &GlobalOpts) -> Result<()> {
    let country = args
        .country
        .as_deref()
        .map(str::to_uppercase)
        .ok_or_else(|| miette!("Country is required for correlation. Use --country/-c"))?;
    let days = cap_days(args.days);
    let client = connect(global)?;

    let rows = fetch_rows(&client, days, Some(&country), "Fetching impression share data...")?;
    if rows.is_empty() {
        output::warning(format!("No impression share data available for {}", country));
        return Ok(());
    }
    output::success(format!("Retrieved {} impression share records", rows.len()));

    let index = with_spinner(&format!("Building keyword index for {}...", country), || {
        build_keyword_index(&client, &country)
    })?;
    let indexed: usize = index.values().map(Vec::len).sum();
    output::info(format!(
        "Indexed {} keywords from {} unique terms",
        indexed,
        index.len()
    ));

    let mut correlated: Vec<CorrelatedTerm> = correlate(rows, &country, &index)
        .into_iter()
        .filter(|c| below_share(c.row.high_impression_share, args.min_share))
        .filter(|c| !args.unmatched || !c.is_matched())
        .filter(|c| !args.matched || c.is_matched())
        .collect();

    if correlated.is_empty() {
        output::warning("No search terms match the specified filters");
        return Ok(());
    }
    correlated.sort_by(|a, b| row_avg_share(&a.row).total_cmp(&row_avg_share(&b.row)));

    if let Some(path) = &args.output {
        let records: Vec<Vec<String>> = correlated.iter().map(correlate_record).collect();
        export(
            path,
            &[
                "search_term",
                "country",
                "app_name",
                "low_share",
                "high_share",
                "rank",
                "popularity",
                "campaign_name",
                "ad_group_name",
                "keyword_text",
                "current_bid",
                "currency",
            ],
            &records,
        );
    }

    let shown = display_limit(args.limit, correlated.len());
    let table_rows: Vec<Vec<String>> = correlated
        .iter()
        .take(shown)
        .map(|c| {
            let kw = c.keyword.as_ref();
            vec![
                truncate_str(&c.row.search_term, 30),
                styled_share(&c.row),
                kw.map(|k| truncate_str(&k.campaign_name, 25))
                    .unwrap_or_else(|| style("Not matched").dim().to_string()),
                kw.map(|k| truncate_str(&k.keyword_text, 20)).unwrap_or_default(),
                kw.filter(|k| k.bid > 0.0)
                    .map(|k| format!("{:.2} {}", k.bid, k.currency))
                    .unwrap_or_else(|| "-".to_string()),
                c.row
                    .search_popularity
                    .filter(|p| *p > 0)
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(
        &format!("Impression Share Correlation - {}", country),
        &["Search Term", "Share", "Campaign", "Keyword", "Bid", "Pop"],
        &table_rows,
    );
    if correlated.len() > shown {
        output::info(format!(
            "Showing {} of {} results. Use --limit 0 to see all.",
            shown,
            correlated.len()
        ));
    }

    let matched = correlated.iter().filter(|c| c.is_matched()).count();
    println!();
    println!("{} {}", style("Total search terms:").dim(), correlated.len());
    println!("  {} {}", style("Matched to keywords:").green(), matched);
    println!(
        "  {} {}",
        style("Unmatched (opportunities):").yellow(),
        correlated.len() - matched
    );

    let low_matched = correlated
        .iter()
        .filter(|c| c.is_matched() && ShareBucket::of(c.row.high_impression_share) == Some(ShareBucket::Low))
        .count();
    if low_matched > 0 {
        println!();
        println!(
            "{}",
            style(format!(
                "{} matched keywords have <30% share - consider bid increases",
                low_matched
            ))
            .red()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share_row(term: &str, country: &str, date: &str, low: Option<f64>, high: Option<f64>) -> ImpressionShareRow {
        ImpressionShareRow {
            date: date.to_string(),
            app_name: "Chippy Tools".to_string(),
            adam_id: "123".to_string(),
            country_or_region: country.to_string(),
            search_term: term.to_string(),
            low_impression_share: low,
            high_impression_share: high,
            ..Default::default()
        }
    }

    #[test]
    fn test_share_range() {
        assert_eq!(share_range(Some(0.1), Some(0.2)), "10-20%");
        assert_eq!(share_range(None, Some(0.5)), "0-50%");
        assert_eq!(share_range(Some(0.3), None), "30-?%");
        assert_eq!(share_range(None, None), "N/A");
    }

    #[test]
    fn test_rank_display() {
        assert_eq!(rank_display(Some("ONE")), "1");
        assert_eq!(rank_display(Some("FOUR")), "4");
        assert_eq!(rank_display(Some("GREATER_THAN_FOUR")), ">4");
        assert_eq!(rank_display(Some("FIVE")), "FIVE");
        assert_eq!(rank_display(None), "N/A");
    }

    #[test]
    fn test_avg_share() {
        assert!((avg_share(Some(0.1), Some(0.3)) - 0.2).abs() < 1e-9);
        assert!((avg_share(Some(0.4), None) - 0.4).abs() < 1e-9);
        assert!((avg_share(None, Some(0.6)) - 0.3).abs() < 1e-9);
        assert_eq!(avg_share(None, None), 0.0);
    }

    #[test]
    fn test_buckets() {
        assert_eq!(ShareBucket::of(Some(0.29)), Some(ShareBucket::Low));
        assert_eq!(ShareBucket::of(Some(0.3)), Some(ShareBucket::Medium));
        assert_eq!(ShareBucket::of(Some(0.5)), Some(ShareBucket::High));
        assert_eq!(ShareBucket::of(None), None);

        let counts = BucketCounts::tally([Some(0.1), Some(0.2), Some(0.45), Some(0.9), None]);
        assert_eq!(
            counts,
            BucketCounts {
                low: 2,
                medium: 1,
                high: 1
            }
        );
    }

    #[test]
    fn test_latest_per_term() {
        let rows = vec![
            share_row("chisel", "US", "2026-01-01", Some(0.1), Some(0.2)),
            share_row("chisel", "US", "2026-01-03", Some(0.4), Some(0.5)),
            share_row("chisel", "US", "2026-01-02", Some(0.2), Some(0.3)),
            share_row("chisel", "GB", "2026-01-01", Some(0.6), Some(0.7)),
        ];
        let latest = latest_per_term(rows);
        assert_eq!(latest.len(), 2);
        let us = latest.iter().find(|r| r.country_or_region == "US").unwrap();
        assert_eq!(us.date, "2026-01-03");
    }

    #[test]
    fn test_min_share_filter_needs_high_share() {
        assert!(below_share(Some(0.2), Some(30.0)));
        assert!(!below_share(Some(0.3), Some(30.0)));
        assert!(!below_share(None, Some(30.0)));
        assert!(below_share(None, None));
    }

    #[test]
    fn test_summarize() {
        let mut other = share_row("saw", "US", "2026-01-01", Some(0.5), Some(0.6));
        other.app_name = String::new();
        let rows = vec![
            share_row("chisel", "US", "2026-01-01", Some(0.1), Some(0.2)),
            share_row("chisel", "US", "2026-01-02", Some(0.2), Some(0.4)),
            share_row("plane", "US", "2026-01-01", None, None),
            share_row("router", "GB", "2026-01-01", Some(0.5), Some(0.7)),
            other,
        ];
        let summary = summarize(&rows);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].0, "Chippy Tools");
        assert_eq!(summary[1].0, "Unknown");

        let us = &summary[0].1[0];
        assert_eq!(us.country, "US");
        assert_eq!(us.terms, 2);
        assert!((us.avg_share - 0.225).abs() < 1e-9);
        assert_eq!(us.buckets.low, 1);
        assert_eq!(us.buckets.medium, 1);
        assert_eq!(summary[0].1[1].country, "GB");
    }

    #[test]
    fn test_correlate_matches_first_keyword() {
        let campaign = Campaign {
            id: 1,
            name: "Chippy Tools - US - Generic - EM".to_string(),
            countries_or_regions: vec!["US".to_string()],
            ..Default::default()
        };
        let ad_group = AdGroup {
            id: 2,
            name: "Exact - Chisel".to_string(),
            ..Default::default()
        };
        let keywords = vec![Keyword {
            id: 3,
            text: "Chisel".to_string(),
            bid_amount: Some(Money::new(1.5, "USD")),
            ..Default::default()
        }];
        let mut index = KeywordIndex::new();
        index_keywords(&mut index, &campaign, &ad_group, &keywords);
        assert!(index.contains_key("chisel"));

        let rows = vec![
            share_row("chisel", "US", "2026-01-01", Some(0.1), Some(0.2)),
            share_row("wood plane", "US", "2026-01-01", Some(0.3), Some(0.4)),
            share_row("chisel", "GB", "2026-01-01", Some(0.1), Some(0.2)),
        ];
        let correlated = correlate(rows, "US", &index);
        assert_eq!(correlated.len(), 2);

        let chisel = correlated.iter().find(|c| c.row.search_term == "chisel").unwrap();
        assert!(chisel.is_matched());
        assert_eq!(chisel.keyword.as_ref().unwrap().keyword_id, 3);
        assert_eq!(chisel.keyword.as_ref().unwrap().bid, 1.5);

        let plane = correlated.iter().find(|c| c.row.search_term == "wood plane").unwrap();
        assert!(!plane.is_matched());
        assert_eq!(correlate_record(plane)[7], "");
        assert_eq!(correlate_record(chisel)[10], "1.5");
    }
}
