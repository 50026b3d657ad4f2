//! `asa reports` command - Performance reports

use chrono::NaiveDate;
use clap::Subcommand;
use miette::{miette, IntoDiagnostic, Result, WrapErr};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::api::reports::{Granularity, Metrics, Report, ReportRequest, ReportRow};
use crate::api::selector::Selector;
use crate::cli::commands::utils::{connect, with_spinner};
use crate::cli::helpers::{format_count, format_percent, parse_date};
use crate::cli::output;
use crate::cli::table::{print_table, write_csv_file};
use crate::cli::GlobalOpts;

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Campaign performance report
    Campaigns(CampaignReportArgs),

    /// Ad group performance report for a campaign
    AdGroups(AdGroupReportArgs),

    /// Keyword performance report for a campaign
    Keywords(KeywordReportArgs),

    /// Search terms that triggered your ads
    SearchTerms(SearchTermReportArgs),
}

#[derive(clap::Args, Debug)]
pub struct ReportWindow {
    /// Start date (YYYY-MM-DD)
    #[arg(long, short = 's', value_parser = parse_date)]
    pub start: NaiveDate,

    /// End date (YYYY-MM-DD)
    #[arg(long, short = 'e', value_parser = parse_date)]
    pub end: NaiveDate,

    /// Time granularity
    #[arg(long, short = 'g', value_enum, ignore_case = true, default_value_t = Granularity::Daily)]
    pub granularity: Granularity,

    /// Save to file (.json or .csv)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct CampaignReportArgs {
    #[command(flatten)]
    pub window: ReportWindow,

    /// Filter by campaign ID (repeatable)
    #[arg(long = "campaign", short = 'c')]
    pub campaign_ids: Vec<i64>,
}

#[derive(clap::Args, Debug)]
pub struct AdGroupReportArgs {
    /// Campaign ID
    pub campaign_id: i64,

    #[command(flatten)]
    pub window: ReportWindow,
}

#[derive(clap::Args, Debug)]
pub struct KeywordReportArgs {
    /// Campaign ID
    pub campaign_id: i64,

    #[command(flatten)]
    pub window: ReportWindow,

    /// Filter by ad group ID (repeatable)
    #[arg(long = "ad-group", short = 'a')]
    pub ad_group_ids: Vec<i64>,
}

#[derive(clap::Args, Debug)]
pub struct SearchTermReportArgs {
    /// Campaign ID
    pub campaign_id: i64,

    #[command(flatten)]
    pub window: ReportWindow,

    /// Filter by ad group ID
    #[arg(long = "ad-group", short = 'a')]
    pub ad_group_id: Option<i64>,
}

const METRIC_COLUMNS: &[&str] = &["impressions", "taps", "installs", "ttr", "conv_rate", "spend"];

fn column_label(col: &str) -> &str {
    match col {
        "campaign" => "Campaign",
        "ad_group" => "Ad Group",
        "keyword" => "Keyword",
        "search_term" => "Search Term",
        "country" => "Country",
        "impressions" => "Impressions",
        "taps" => "Taps",
        "installs" => "Installs",
        "ttr" => "TTR",
        "conv_rate" => "Conv Rate",
        "spend" => "Spend",
        "avg_cpt" => "Avg CPT",
        "avg_cpa" => "Avg CPA",
        other => other,
    }
}

/// Where a report goes when `--output` is given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportFormat {
    Json,
    Csv,
}

fn export_format(path: &Path) -> Result<ExportFormat> {
    let suffix = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match suffix.as_str() {
        "json" => Ok(ExportFormat::Json),
        "csv" => Ok(ExportFormat::Csv),
        _ => Err(miette!(
            code = "asa::reports::unsupported_format",
            help = "Supported formats: .json, .csv",
            "Unsupported Format: file format '.{}' is not supported",
            suffix
        )),
    }
}

pub fn run(cmd: ReportCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ReportCommands::Campaigns(args) => {
            let export = preflight(&args.window)?;
            let mut request = request_for(&args.window);
            if !args.campaign_ids.is_empty() {
                request = request.selector(
                    Selector::new()
                        .where_in("campaignId", &args.campaign_ids)
                        .limit(1000),
                );
            }
            let client = connect(global)?;
            let report = with_spinner("Generating campaign report...", || {
                client.reports().campaigns(&request)
            })?;
            emit(&report, "campaign", &[], "Campaign Report", &args.window, export)
        }
        ReportCommands::AdGroups(args) => {
            let export = preflight(&args.window)?;
            let request = request_for(&args.window);
            let client = connect(global)?;
            let report = with_spinner("Generating ad group report...", || {
                client.reports().ad_groups(args.campaign_id, &request)
            })?;
            emit(&report, "ad_group", &[], "Ad Group Report", &args.window, export)
        }
        ReportCommands::Keywords(args) => {
            let export = preflight(&args.window)?;
            let mut request = request_for(&args.window);
            let single_ad_group = match args.ad_group_ids.as_slice() {
                [one] => Some(*one),
                [] => None,
                many => {
                    request = request.selector(Selector::new().where_in("adGroupId", many).limit(1000));
                    None
                }
            };
            let client = connect(global)?;
            let report = with_spinner("Generating keyword report...", || {
                client.reports().keywords(args.campaign_id, single_ad_group, &request)
            })?;
            emit(&report, "keyword", &["avg_cpt"], "Keyword Report", &args.window, export)
        }
        ReportCommands::SearchTerms(args) => {
            let export = preflight(&args.window)?;
            let request = request_for(&args.window).group_by("countryOrRegion");
            let client = connect(global)?;
            let report = with_spinner("Generating search term report...", || {
                client.reports().search_terms(args.campaign_id, args.ad_group_id, &request)
            })?;
            emit(&report, "search_term", &[], "Search Term Report", &args.window, export)
        }
    }
}

/// Validate the export path before any API call
fn preflight(window: &ReportWindow) -> Result<Option<ExportFormat>> {
    window.output.as_deref().map(export_format).transpose()
}

fn request_for(window: &ReportWindow) -> ReportRequest {
    ReportRequest::new(window.start, window.end).granularity(window.granularity)
}

fn money_amount(money: Option<&crate::api::models::Money>) -> Value {
    money.map(|m| Value::from(m.amount.clone())).unwrap_or(Value::Null)
}

fn opt<T: Into<Value>>(v: Option<T>) -> Value {
    v.map(Into::into).unwrap_or(Value::Null)
}

/// Flatten a report row into named values
pub(crate) fn row_record(row: &ReportRow) -> Map<String, Value> {
    let mut record = Map::new();
    let meta = &row.metadata;
    let text_fields = [
        ("campaign", &meta.campaign_name),
        ("ad_group", &meta.ad_group_name),
        ("keyword", &meta.keyword),
        ("search_term", &meta.search_term_text),
        ("country", &meta.country_or_region),
    ];
    for (key, value) in text_fields {
        if let Some(v) = value.as_ref().filter(|v| !v.is_empty()) {
            record.insert(key.to_string(), Value::from(v.clone()));
        }
    }

    let m: Metrics = row.metrics();
    record.insert("impressions".into(), opt(m.impressions));
    record.insert("taps".into(), opt(m.taps));
    record.insert("installs".into(), opt(m.installs));
    record.insert("ttr".into(), opt(m.ttr));
    record.insert("conv_rate".into(), opt(m.conversion_rate));
    record.insert("spend".into(), money_amount(m.local_spend.as_ref()));
    record.insert("avg_cpt".into(), money_amount(m.avg_cpt.as_ref()));
    record.insert("avg_cpa".into(), money_amount(m.avg_cpa.as_ref()));
    record
}

/// Table cell for a record value
pub(crate) fn display_value(col: &str, value: Option<&Value>) -> String {
    match col {
        "ttr" | "conv_rate" => format_percent(value.and_then(Value::as_f64)),
        "impressions" | "taps" | "installs" => format_count(value.and_then(Value::as_u64)),
        _ => match value {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Null) | None => "-".to_string(),
            Some(Value::String(_)) => "-".to_string(),
            Some(other) => other.to_string(),
        },
    }
}

fn raw_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn emit(
    report: &Report,
    label_column: &str,
    extra_columns: &[&str],
    title: &str,
    window: &ReportWindow,
    export: Option<ExportFormat>,
) -> Result<()> {
    if report.rows.is_empty() {
        output::warning("No data found for the specified period");
        return Ok(());
    }

    let columns: Vec<&str> = std::iter::once(label_column)
        .chain(METRIC_COLUMNS.iter().copied())
        .chain(extra_columns.iter().copied())
        .collect();
    let records: Vec<Map<String, Value>> = report.rows.iter().map(row_record).collect();

    match (export, window.output.as_deref()) {
        (Some(format), Some(path)) => {
            save_report(&records, &columns, path, format)?;
            output::success(format!("Report saved to {}", path.display()));
        }
        _ => {
            let headers: Vec<&str> = columns.iter().map(|c| column_label(c)).collect();
            let rows: Vec<Vec<String>> = records
                .iter()
                .map(|r| columns.iter().map(|c| display_value(c, r.get(*c))).collect())
                .collect();
            let title = format!("{} ({} to {})", title, window.start, window.end);
            print_table(&title, &headers, &rows);
            if let Some(totals) = &report.grand_totals {
                println!();
                print_grand_totals(totals);
            }
        }
    }
    Ok(())
}

fn save_report(records: &[Map<String, Value>], columns: &[&str], path: &Path, format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Json => {
            let json = serde_json::to_string_pretty(records).into_diagnostic()?;
            std::fs::write(path, json)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write {}", path.display()))
        }
        ExportFormat::Csv => {
            let rows: Vec<Vec<String>> = records
                .iter()
                .map(|r| columns.iter().map(|c| raw_value(r.get(*c))).collect())
                .collect();
            write_csv_file(path, columns, &rows)
        }
    }
}

pub(crate) fn grand_total_lines(totals: &Metrics) -> Vec<(&'static str, String)> {
    let mut lines = vec![
        ("Impressions", format_count(totals.impressions)),
        ("Taps", format_count(totals.taps)),
        ("Installs", format_count(totals.installs)),
    ];
    if totals.ttr.is_some() {
        lines.push(("TTR", format_percent(totals.ttr)));
    }
    if totals.conversion_rate.is_some() {
        lines.push(("Conv Rate", format_percent(totals.conversion_rate)));
    }
    if let Some(spend) = &totals.local_spend {
        lines.push(("Total Spend", spend.to_string()));
    }
    lines
}

fn print_grand_totals(totals: &Metrics) {
    output::result_panel("Grand Totals", &grand_total_lines(totals));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Money;
    use serde_json::json;

    fn row() -> ReportRow {
        serde_json::from_value(json!({
            "metadata": {"campaignId": 1, "campaignName": "Chippy - US - Generic - EM", "countryOrRegion": "US"},
            "total": {
                "impressions": 12000, "taps": 600, "installs": 90,
                "ttr": 0.05, "conversionRate": 0.15,
                "localSpend": {"amount": "300.00", "currency": "USD"},
                "avgCPT": {"amount": "0.50", "currency": "USD"}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_row_record() {
        let record = row_record(&row());
        assert_eq!(record["campaign"], "Chippy - US - Generic - EM");
        assert_eq!(record["country"], "US");
        assert_eq!(record["impressions"], 12000);
        assert_eq!(record["spend"], "300.00");
        assert_eq!(record["avg_cpa"], Value::Null);
        assert!(!record.contains_key("keyword"));
    }

    #[test]
    fn test_display_value() {
        let record = row_record(&row());
        assert_eq!(display_value("impressions", record.get("impressions")), "12,000");
        assert_eq!(display_value("ttr", record.get("ttr")), "5.00%");
        assert_eq!(display_value("avg_cpa", record.get("avg_cpa")), "-");
        assert_eq!(display_value("keyword", record.get("keyword")), "-");
        assert_eq!(display_value("spend", record.get("spend")), "300.00");
    }

    #[test]
    fn test_export_format() {
        assert_eq!(export_format(Path::new("out.JSON")).unwrap(), ExportFormat::Json);
        assert_eq!(export_format(Path::new("out.csv")).unwrap(), ExportFormat::Csv);
        let err = export_format(Path::new("out.xlsx")).unwrap_err();
        assert!(err.to_string().contains("Unsupported Format"));
    }

    #[test]
    fn test_save_report_csv_uses_listed_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let records = vec![row_record(&row())];
        save_report(&records, &["campaign", "impressions", "ttr"], &path, ExportFormat::Csv).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "campaign,impressions,ttr\nChippy - US - Generic - EM,12000,0.05\n");
    }

    #[test]
    fn test_grand_total_lines() {
        let totals = Metrics {
            impressions: Some(1500),
            taps: Some(30),
            installs: None,
            ttr: Some(0.02),
            local_spend: Some(Money::new(42.0, "USD")),
            ..Default::default()
        };
        let lines = grand_total_lines(&totals);
        assert_eq!(lines[0], ("Impressions", "1,500".to_string()));
        assert_eq!(lines[2], ("Installs", "-".to_string()));
        assert!(lines.contains(&("TTR", "2.00%".to_string())));
        assert_eq!(lines.last().unwrap(), &("Total Spend", "42.00 USD".to_string()));
    }
}
