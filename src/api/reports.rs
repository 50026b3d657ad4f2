//! Campaign, ad group, keyword and search term reports

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::client::Client;
use super::error::Result;
use super::models::Money;
use super::selector::Selector;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
#[value(rename_all = "UPPER")]
pub enum Granularity {
    Hourly,
    #[default]
    Daily,
    Weekly,
    Monthly,
}

/// Body of a report request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub start_time: String,
    pub end_time: String,
    pub selector: Selector,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granularity: Option<Granularity>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<String>,
    pub time_zone: String,
    pub return_row_totals: bool,
    pub return_grand_totals: bool,
    pub return_records_with_no_metrics: bool,
}

impl ReportRequest {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_time: start.format("%Y-%m-%d").to_string(),
            end_time: end.format("%Y-%m-%d").to_string(),
            selector: Selector::new().limit(1000),
            granularity: None,
            group_by: Vec::new(),
            time_zone: "UTC".to_string(),
            return_row_totals: true,
            return_grand_totals: true,
            return_records_with_no_metrics: false,
        }
    }

    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = Some(granularity);
        self
    }

    pub fn selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    pub fn group_by(mut self, field: &str) -> Self {
        self.group_by.push(field.to_string());
        self
    }
}

/// Metrics for a row, a granularity bucket or the grand totals
///
/// The API has renamed several metrics across versions; the first present
/// alias wins.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct Metrics {
    pub impressions: Option<u64>,
    pub taps: Option<u64>,
    pub installs: Option<u64>,
    pub ttr: Option<f64>,
    pub conversion_rate: Option<f64>,
    pub local_spend: Option<Money>,
    pub avg_cpt: Option<Money>,
    pub avg_cpa: Option<Money>,
}

fn first<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| map.get(*k).filter(|v| !v.is_null()))
}

fn count(map: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    first(map, keys).and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f as u64)))
}

fn rate(map: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    first(map, keys).and_then(Value::as_f64)
}

fn money(map: &Map<String, Value>, keys: &[&str]) -> Option<Money> {
    first(map, keys).and_then(|v| serde_json::from_value(v.clone()).ok())
}

impl From<Map<String, Value>> for Metrics {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            impressions: count(&map, &["impressions"]),
            taps: count(&map, &["taps"]),
            installs: count(&map, &["installs", "totalInstalls", "tapInstalls"]),
            ttr: rate(&map, &["ttr"]),
            conversion_rate: rate(&map, &["conversionRate", "totalInstallRate", "tapInstallRate"]),
            local_spend: money(&map, &["localSpend"]),
            avg_cpt: money(&map, &["avgCPT"]),
            avg_cpa: money(&map, &["avgCPA", "totalAvgCPI", "tapInstallCPI"]),
        }
    }
}

impl Metrics {
    /// Spend as a number, zero when absent
    pub fn spend(&self) -> f64 {
        self.local_spend.as_ref().map(Money::value).unwrap_or(0.0)
    }

    /// Sum counts and spend across buckets, deriving the rates
    pub fn sum(buckets: &[Metrics]) -> Metrics {
        if buckets.is_empty() {
            return Metrics::default();
        }
        let total = |f: fn(&Metrics) -> Option<u64>| buckets.iter().filter_map(f).sum::<u64>();
        let impressions = total(|m| m.impressions);
        let taps = total(|m| m.taps);
        let installs = total(|m| m.installs);
        let currency = buckets
            .iter()
            .find_map(|m| m.local_spend.as_ref().map(|s| s.currency.clone()));
        let spend: f64 = buckets.iter().map(Metrics::spend).sum();

        Metrics {
            impressions: Some(impressions),
            taps: Some(taps),
            installs: Some(installs),
            ttr: (impressions > 0).then(|| taps as f64 / impressions as f64),
            conversion_rate: (taps > 0).then(|| installs as f64 / taps as f64),
            local_spend: currency.as_deref().map(|c| Money::new(spend, c)),
            avg_cpt: currency
                .as_deref()
                .filter(|_| taps > 0)
                .map(|c| Money::new(spend / taps as f64, c)),
            avg_cpa: currency
                .as_deref()
                .filter(|_| installs > 0)
                .map(|c| Money::new(spend / installs as f64, c)),
        }
    }
}

/// Descriptive fields of a report row
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RowMetadata {
    pub campaign_id: Option<i64>,
    pub campaign_name: Option<String>,
    pub ad_group_id: Option<i64>,
    pub ad_group_name: Option<String>,
    pub keyword_id: Option<i64>,
    pub keyword: Option<String>,
    pub match_type: Option<String>,
    pub search_term_text: Option<String>,
    pub country_or_region: Option<String>,
    pub countries_or_regions: Vec<String>,
    pub bid_amount: Option<Money>,
    pub adam_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportRow {
    pub metadata: RowMetadata,
    pub total: Option<Metrics>,
    pub granularity: Vec<Metrics>,
}

impl ReportRow {
    /// Row totals, or the sum of granularity buckets when totals are absent
    pub fn metrics(&self) -> Metrics {
        match &self.total {
            Some(total) => total.clone(),
            None => Metrics::sum(&self.granularity),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct GrandTotals {
    total: Option<Metrics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ReportingDataResponse {
    row: Vec<ReportRow>,
    grand_totals: Option<GrandTotals>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ReportData {
    reporting_data_response: ReportingDataResponse,
}

/// Decoded report response
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub grand_totals: Option<Metrics>,
}

impl From<ReportData> for Report {
    fn from(data: ReportData) -> Self {
        let response = data.reporting_data_response;
        Report {
            rows: response.row,
            grand_totals: response.grand_totals.and_then(|g| g.total),
        }
    }
}

pub struct Reports<'a> {
    client: &'a Client,
}

impl<'a> Reports<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn fetch(&self, path: &str, request: &ReportRequest) -> Result<Report> {
        let data: ReportData = self.client.post(path, request)?.into_data(path)?;
        Ok(data.into())
    }

    pub fn campaigns(&self, request: &ReportRequest) -> Result<Report> {
        self.fetch("/reports/campaigns", request)
    }

    pub fn ad_groups(&self, campaign_id: i64, request: &ReportRequest) -> Result<Report> {
        self.fetch(&format!("/reports/campaigns/{}/adgroups", campaign_id), request)
    }

    pub fn keywords(&self, campaign_id: i64, ad_group_id: Option<i64>, request: &ReportRequest) -> Result<Report> {
        let path = match ad_group_id {
            Some(ag) => format!("/reports/campaigns/{}/adgroups/{}/keywords", campaign_id, ag),
            None => format!("/reports/campaigns/{}/keywords", campaign_id),
        };
        self.fetch(&path, request)
    }

    pub fn search_terms(
        &self,
        campaign_id: i64,
        ad_group_id: Option<i64>,
        request: &ReportRequest,
    ) -> Result<Report> {
        let path = match ad_group_id {
            Some(ag) => format!("/reports/campaigns/{}/adgroups/{}/searchterms", campaign_id, ag),
            None => format!("/reports/campaigns/{}/searchterms", campaign_id),
        };
        self.fetch(&path, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let request = ReportRequest::new(start, end)
            .granularity(Granularity::Weekly)
            .group_by("countryOrRegion");
        let v = serde_json::to_value(&request).unwrap();
        assert_eq!(v["startTime"], "2024-01-01");
        assert_eq!(v["endTime"], "2024-01-31");
        assert_eq!(v["granularity"], "WEEKLY");
        assert_eq!(v["groupBy"], json!(["countryOrRegion"]));
        assert_eq!(v["timeZone"], "UTC");
        assert_eq!(v["returnRecordsWithNoMetrics"], json!(false));
        assert_eq!(v["selector"]["pagination"]["limit"], json!(1000));
    }

    #[test]
    fn test_metrics_accept_aliases() {
        let m: Metrics = serde_json::from_value(json!({
            "impressions": 1000,
            "taps": 50,
            "totalInstalls": 10,
            "tapInstalls": 8,
            "ttr": 0.05,
            "totalInstallRate": 0.2,
            "localSpend": {"amount": "25.50", "currency": "USD"},
            "avgCPT": {"amount": "0.51", "currency": "USD"},
            "totalAvgCPI": {"amount": "2.55", "currency": "USD"}
        }))
        .unwrap();
        assert_eq!(m.installs, Some(10));
        assert_eq!(m.conversion_rate, Some(0.2));
        assert_eq!(m.spend(), 25.5);
        assert_eq!(m.avg_cpa.unwrap().amount, "2.55");
    }

    #[test]
    fn test_row_without_total_sums_granularity() {
        let row: ReportRow = serde_json::from_value(json!({
            "metadata": {"keyword": "calc", "bidAmount": {"amount": "1.00", "currency": "USD"}},
            "granularity": [
                {"impressions": 100, "taps": 10, "installs": 2, "localSpend": {"amount": "5", "currency": "USD"}},
                {"impressions": 300, "taps": 10, "installs": 3, "localSpend": {"amount": "15", "currency": "USD"}}
            ]
        }))
        .unwrap();
        let m = row.metrics();
        assert_eq!(m.impressions, Some(400));
        assert_eq!(m.taps, Some(20));
        assert_eq!(m.ttr, Some(0.05));
        assert_eq!(m.conversion_rate, Some(0.25));
        assert_eq!(m.local_spend.unwrap().amount, "20.00");
        assert_eq!(m.avg_cpt.unwrap().amount, "1.00");
    }

    #[test]
    fn test_report_data_decodes() {
        let data: ReportData = serde_json::from_value(json!({
            "reportingDataResponse": {
                "row": [{"metadata": {"campaignId": 1, "campaignName": "A"}, "total": {"impressions": 5}}],
                "grandTotals": {"total": {"impressions": 5, "taps": 1}}
            }
        }))
        .unwrap();
        let report = Report::from(data);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].metadata.campaign_name.as_deref(), Some("A"));
        assert_eq!(report.grand_totals.unwrap().taps, Some(1));
    }
}
