//! `asa optimize bid-review` - Keyword bid strength review
//!
//! The API does not expose bid strength, so it is estimated from impression
//! volume and tap-through rate over the review window.

use console::style;
use miette::Result;
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

use crate::api::models::Campaign;
use crate::api::reports::{Granularity, ReportRequest, ReportRow};
use crate::cli::commands::utils::{connect, enabled_campaigns, with_spinner};
use crate::cli::helpers::{format_number, truncate_str, window_ending_yesterday};
use crate::cli::output::{self, Spinner};
use crate::cli::table::{print_table, write_csv_file};
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct BidReviewArgs {
    /// Only campaigns targeting this country
    #[arg(long, short = 'c')]
    pub country: Option<String>,

    /// Days of performance data to analyze
    #[arg(long, short = 'd', default_value_t = 30)]
    pub days: u32,

    /// Only show keywords with weak bid strength
    #[arg(long, short = 'w')]
    pub weak: bool,

    /// Minimum impressions to include
    #[arg(long, default_value_t = 0)]
    pub min_impressions: u64,

    /// Max keywords to display
    #[arg(long, short = 'l', default_value_t = 50)]
    pub limit: usize,

    /// Export to CSV file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidStrength {
    Strong,
    Moderate,
    Weak,
    Unknown,
}

impl BidStrength {
    pub fn estimate(impressions: u64, ttr: Option<f64>) -> BidStrength {
        let ttr = ttr.unwrap_or(0.0);
        if impressions == 0 {
            BidStrength::Unknown
        } else if impressions >= 1000 && ttr >= 0.05 {
            BidStrength::Strong
        } else if impressions >= 100 && ttr >= 0.02 {
            BidStrength::Moderate
        } else {
            BidStrength::Weak
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BidStrength::Strong => "STRONG",
            BidStrength::Moderate => "MODERATE",
            BidStrength::Weak => "WEAK",
            BidStrength::Unknown => "UNKNOWN",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            BidStrength::Strong => "Consider increase for more volume",
            BidStrength::Moderate => "Monitor performance",
            BidStrength::Weak => "Increase bid or review keyword",
            BidStrength::Unknown => "Need more data",
        }
    }

    fn styled(&self) -> String {
        match self {
            BidStrength::Strong => style(self.as_str()).green().to_string(),
            BidStrength::Moderate => style(self.as_str()).yellow().to_string(),
            BidStrength::Weak => style(self.as_str()).red().to_string(),
            BidStrength::Unknown => style("?").dim().to_string(),
        }
    }
}

impl fmt::Display for BidStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Performance of one keyword over the review window
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordBidAnalysis {
    pub campaign_name: String,
    pub ad_group_name: String,
    pub keyword: String,
    pub country: String,
    pub current_bid: f64,
    pub currency: String,
    pub impressions: u64,
    pub taps: u64,
    pub installs: u64,
    pub spend: f64,
    pub avg_cpt: Option<f64>,
    pub ttr: Option<f64>,
    pub cr: Option<f64>,
}

impl KeywordBidAnalysis {
    /// Build from a keyword report row; None for rows without a keyword
    pub fn from_row(campaign: &Campaign, row: &ReportRow) -> Option<KeywordBidAnalysis> {
        let keyword = row.metadata.keyword.clone()?;
        let metrics = row.metrics();
        let impressions = metrics.impressions.unwrap_or(0);
        let taps = metrics.taps.unwrap_or(0);
        let installs = metrics.installs.unwrap_or(0);
        let spend = metrics.spend();
        let currency = metrics
            .local_spend
            .as_ref()
            .map(|m| m.currency.clone())
            .unwrap_or_else(|| "USD".to_string());

        Some(KeywordBidAnalysis {
            campaign_name: campaign.name.clone(),
            ad_group_name: row.metadata.ad_group_name.clone().unwrap_or_default(),
            keyword,
            country: campaign
                .countries_or_regions
                .first()
                .cloned()
                .unwrap_or_else(|| "?".to_string()),
            current_bid: row.metadata.bid_amount.as_ref().map(|m| m.value()).unwrap_or(0.0),
            currency,
            impressions,
            taps,
            installs,
            spend,
            avg_cpt: (taps > 0).then(|| spend / taps as f64),
            ttr: (impressions > 0).then(|| taps as f64 / impressions as f64),
            cr: (taps > 0).then(|| installs as f64 / taps as f64),
        })
    }

    pub fn strength(&self) -> BidStrength {
        BidStrength::estimate(self.impressions, self.ttr)
    }
}

/// Drop rows below `min_impressions` (and non-weak rows with `weak_only`),
/// then sort by impressions descending
pub fn filter_analyses(
    analyses: Vec<KeywordBidAnalysis>,
    min_impressions: u64,
    weak_only: bool,
) -> Vec<KeywordBidAnalysis> {
    let mut kept: Vec<KeywordBidAnalysis> = analyses
        .into_iter()
        .filter(|k| k.impressions >= min_impressions)
        .filter(|k| !weak_only || k.strength() == BidStrength::Weak)
        .collect();
    kept.sort_by(|a, b| b.impressions.cmp(&a.impressions));
    kept
}

/// Non-zero ratios with four decimals; empty otherwise
fn ratio_field(value: Option<f64>) -> String {
    value
        .filter(|v| *v != 0.0)
        .map(|v| format!("{:.4}", v))
        .unwrap_or_default()
}

const CSV_HEADERS: [&str; 15] = [
    "campaign_name",
    "ad_group_name",
    "keyword",
    "country",
    "current_bid",
    "currency",
    "impressions",
    "taps",
    "conversions",
    "spend",
    "avg_cpt",
    "ttr",
    "cr",
    "bid_strength",
    "recommendation",
];

pub fn csv_record(k: &KeywordBidAnalysis) -> Vec<String> {
    let strength = k.strength();
    vec![
        k.campaign_name.clone(),
        k.ad_group_name.clone(),
        k.keyword.clone(),
        k.country.clone(),
        format!("{:.2}", k.current_bid),
        k.currency.clone(),
        k.impressions.to_string(),
        k.taps.to_string(),
        k.installs.to_string(),
        format!("{:.2}", k.spend),
        k.avg_cpt.map(|v| format!("{:.2}", v)).unwrap_or_default(),
        ratio_field(k.ttr),
        ratio_field(k.cr),
        strength.to_string(),
        strength.recommendation().to_string(),
    ]
}

fn targets_country(campaign: &Campaign, country: &str) -> bool {
    campaign
        .countries_or_regions
        .iter()
        .any(|cc| cc.eq_ignore_ascii_case(country))
}

pub fn run(args: BidReviewArgs, global: &GlobalOpts) -> Result<()> {
    let client = connect(global)?;
    let (start, end) = window_ending_yesterday(args.days, false);
    let country = args.country.as_deref().map(str::to_uppercase);

    let mut campaigns = with_spinner("Loading campaigns...", || enabled_campaigns(&client))?;
    if let Some(cc) = &country {
        campaigns.retain(|c| targets_country(c, cc));
    }
    if campaigns.is_empty() {
        let suffix = country.map(|cc| format!(" for {}", cc)).unwrap_or_default();
        output::warning(format!("No enabled campaigns found{}", suffix));
        return Ok(());
    }
    output::info(format!("Analyzing {} campaigns...", campaigns.len()));

    let request = ReportRequest::new(start, end).granularity(Granularity::Daily);
    let mut analyses = Vec::new();
    for campaign in &campaigns {
        let spinner = Spinner::start(format!(
            "Fetching keyword data for {}...",
            truncate_str(&campaign.name, 33)
        ));
        let report = client.reports().keywords(campaign.id, None, &request);
        drop(spinner);
        match report {
            Ok(report) => analyses.extend(
                report
                    .rows
                    .iter()
                    .filter_map(|row| KeywordBidAnalysis::from_row(campaign, row)),
            ),
            Err(e) => warn!(campaign_id = campaign.id, error = %e, "skipping keyword report"),
        }
    }

    if analyses.is_empty() {
        output::warning("No keyword data found");
        return Ok(());
    }

    let analyses = filter_analyses(analyses, args.min_impressions, args.weak);
    if analyses.is_empty() {
        output::warning("No keywords match the specified filters");
        return Ok(());
    }

    if let Some(path) = &args.output {
        let records: Vec<Vec<String>> = analyses.iter().map(csv_record).collect();
        match write_csv_file(path, &CSV_HEADERS, &records) {
            Ok(()) => output::success(format!(
                "Exported {} keywords to {}",
                analyses.len(),
                path.display()
            )),
            Err(e) => output::error_panel("Export failed", &e.to_string(), None),
        }
    }

    let shown = args.limit.min(analyses.len());
    let rows: Vec<Vec<String>> = analyses
        .iter()
        .take(shown)
        .map(|k| {
            vec![
                truncate_str(&k.keyword, 25),
                truncate_str(&k.campaign_name, 20),
                k.country.clone(),
                format!("{:.2}", k.current_bid),
                format_number(k.impressions),
                k.ttr
                    .filter(|t| *t != 0.0)
                    .map(|t| format!("{:.1}%", t * 100.0))
                    .unwrap_or_else(|| "-".to_string()),
                k.strength().styled(),
            ]
        })
        .collect();
    print_table(
        &format!("Keyword Bid Review ({} days)", args.days),
        &["Keyword", "Campaign", "Country", "Bid", "Impr", "TTR", "Strength"],
        &rows,
    );

    if analyses.len() > shown {
        output::info(format!(
            "Showing {} of {} keywords. Use --limit to see more.",
            shown,
            analyses.len()
        ));
    }

    let count = |s: BidStrength| analyses.iter().filter(|k| k.strength() == s).count();
    let weak = count(BidStrength::Weak);
    println!();
    output::dim("Bid Strength Summary:");
    println!("  {} {}", style("Strong:").green(), count(BidStrength::Strong));
    println!("  {} {}", style("Moderate:").yellow(), count(BidStrength::Moderate));
    println!("  {} {}", style("Weak:").red(), weak);

    if weak > 0 {
        println!();
        println!(
            "{}",
            style(format!(
                "{} keywords have weak bid strength - consider increasing bids",
                weak
            ))
            .yellow()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Money;
    use crate::api::reports::{Metrics, RowMetadata};

    fn analysis(keyword: &str, impressions: u64, taps: u64) -> KeywordBidAnalysis {
        KeywordBidAnalysis {
            campaign_name: "Chippy Tools - US - Generic - EM".to_string(),
            ad_group_name: "Exact - Chisel".to_string(),
            keyword: keyword.to_string(),
            country: "US".to_string(),
            current_bid: 1.5,
            currency: "USD".to_string(),
            impressions,
            taps,
            installs: 0,
            spend: 0.0,
            avg_cpt: None,
            ttr: (impressions > 0).then(|| taps as f64 / impressions as f64),
            cr: None,
        }
    }

    #[test]
    fn test_bid_strength_thresholds() {
        assert_eq!(BidStrength::estimate(0, None), BidStrength::Unknown);
        assert_eq!(BidStrength::estimate(1000, Some(0.05)), BidStrength::Strong);
        assert_eq!(BidStrength::estimate(999, Some(0.2)), BidStrength::Moderate);
        assert_eq!(BidStrength::estimate(100, Some(0.02)), BidStrength::Moderate);
        assert_eq!(BidStrength::estimate(5000, Some(0.01)), BidStrength::Weak);
        assert_eq!(BidStrength::estimate(99, Some(0.5)), BidStrength::Weak);
        assert_eq!(BidStrength::estimate(10, None), BidStrength::Weak);
        assert_eq!(BidStrength::Weak.recommendation(), "Increase bid or review keyword");
        assert_eq!(BidStrength::Unknown.recommendation(), "Need more data");
    }

    #[test]
    fn test_from_row_derives_rates() {
        let campaign = Campaign {
            name: "Chippy Tools - AU - Generic - EM".to_string(),
            countries_or_regions: vec!["AU".to_string()],
            ..Default::default()
        };
        let row = ReportRow {
            metadata: RowMetadata {
                keyword: Some("chisel".to_string()),
                ad_group_name: Some("Exact - Chisel".to_string()),
                bid_amount: Some(Money::new(2.0, "AUD")),
                ..Default::default()
            },
            total: Some(Metrics {
                impressions: Some(200),
                taps: Some(10),
                installs: Some(4),
                local_spend: Some(Money::new(15.0, "AUD")),
                ..Default::default()
            }),
            granularity: Vec::new(),
        };

        let k = KeywordBidAnalysis::from_row(&campaign, &row).unwrap();
        assert_eq!(k.country, "AU");
        assert_eq!(k.currency, "AUD");
        assert_eq!(k.current_bid, 2.0);
        assert_eq!(k.avg_cpt, Some(1.5));
        assert_eq!(k.ttr, Some(0.05));
        assert_eq!(k.cr, Some(0.4));
        assert_eq!(k.strength(), BidStrength::Moderate);

        let no_keyword = ReportRow::default();
        assert!(KeywordBidAnalysis::from_row(&campaign, &no_keyword).is_none());
    }

    #[test]
    fn test_filter_analyses() {
        let all = vec![
            analysis("low", 50, 0),
            analysis("strong", 2000, 200),
            analysis("weak", 500, 1),
        ];
        let kept = filter_analyses(all.clone(), 100, false);
        let names: Vec<&str> = kept.iter().map(|k| k.keyword.as_str()).collect();
        assert_eq!(names, vec!["strong", "weak"]);

        let weak = filter_analyses(all, 0, true);
        let names: Vec<&str> = weak.iter().map(|k| k.keyword.as_str()).collect();
        assert_eq!(names, vec!["weak", "low"]);
    }

    #[test]
    fn test_csv_record_has_every_column() {
        let record = csv_record(&analysis("chisel", 1000, 60));
        assert_eq!(record.len(), CSV_HEADERS.len());
        assert_eq!(record[4], "1.50");
        assert_eq!(record[10], "");
        assert_eq!(record[11], "0.0600");
        assert_eq!(record[12], "");
        assert_eq!(record[13], "STRONG");
        assert_eq!(record[14], "Consider increase for more volume");
    }
}
