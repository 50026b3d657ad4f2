//! Impression share custom reports: create, poll, download

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::client::Client;
use super::error::{ApiError, Result};
use super::reports::Granularity;
use super::selector::Selector;

pub const POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const POLL_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CustomReportRequest {
    name: String,
    start_time: String,
    end_time: String,
    granularity: Granularity,
    #[serde(skip_serializing_if = "Option::is_none")]
    selector: Option<Selector>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomReport {
    id: i64,
    #[serde(default)]
    state: String,
    #[serde(default)]
    download_uri: Option<String>,
}

/// One row of an impression share report
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImpressionShareRow {
    pub date: String,
    pub app_name: String,
    pub adam_id: String,
    pub country_or_region: String,
    pub search_term: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub low_impression_share: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub high_impression_share: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub rank: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub search_popularity: Option<u32>,
}

/// Decode a downloaded impression share CSV
pub fn parse_impression_share_csv(contents: &str) -> Result<Vec<ImpressionShareRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

pub struct CustomReports<'a> {
    client: &'a Client,
}

impl<'a> CustomReports<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Request an impression share report and wait for its rows
    pub fn impression_share(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
        countries: Option<&[String]>,
    ) -> Result<Vec<ImpressionShareRow>> {
        let request = CustomReportRequest {
            name: format!("asa-impression-share-{}", chrono::Utc::now().format("%Y%m%d%H%M%S")),
            start_time: start.format("%Y-%m-%d").to_string(),
            end_time: end.format("%Y-%m-%d").to_string(),
            granularity,
            selector: countries.map(|c| Selector::new().where_in("countryOrRegion", c.iter())),
        };
        let created: CustomReport = self
            .client
            .post("/custom-reports", &request)?
            .into_data("/custom-reports")?;
        debug!(id = created.id, "created custom report");

        let report = self.wait_until_complete(created)?;
        match report.download_uri {
            Some(uri) => parse_impression_share_csv(&self.client.download(&uri)?),
            None => Err(ApiError::ReportFailed {
                id: report.id,
                state: "COMPLETED without download URI".to_string(),
            }),
        }
    }

    fn wait_until_complete(&self, mut report: CustomReport) -> Result<CustomReport> {
        let started = Instant::now();
        loop {
            match report.state.as_str() {
                "COMPLETED" => return Ok(report),
                "FAILED" | "CANCELLED" => {
                    return Err(ApiError::ReportFailed {
                        id: report.id,
                        state: report.state,
                    })
                }
                _ => {}
            }
            if started.elapsed() >= POLL_TIMEOUT {
                return Err(ApiError::ReportTimeout {
                    id: report.id,
                    seconds: POLL_TIMEOUT.as_secs(),
                });
            }
            warn!(id = report.id, state = %report.state, "custom report not ready");
            thread::sleep(POLL_INTERVAL);
            let path = format!("/custom-reports/{}", report.id);
            report = self.client.get(&path, &[])?.into_data(&path)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv() {
        let csv = "date,appName,adamId,countryOrRegion,searchTerm,lowImpressionShare,highImpressionShare,rank,searchPopularity\n\
                   2024-05-01,Chippy,123,US,calculator,0.1,0.2,ONE,5\n\
                   2024-05-02,Chippy,123,US,tip calc,,,,\n";
        let rows = parse_impression_share_csv(csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].search_term, "calculator");
        assert_eq!(rows[0].high_impression_share, Some(0.2));
        assert_eq!(rows[0].rank.as_deref(), Some("ONE"));
        assert_eq!(rows[0].search_popularity, Some(5));
        assert_eq!(rows[1].low_impression_share, None);
        assert_eq!(rows[1].search_popularity, None);
    }

    #[test]
    fn test_request_body_with_countries() {
        let countries = vec!["US".to_string()];
        let request = CustomReportRequest {
            name: "r".to_string(),
            start_time: "2024-05-01".to_string(),
            end_time: "2024-05-07".to_string(),
            granularity: Granularity::Daily,
            selector: Some(Selector::new().where_in("countryOrRegion", countries.iter())),
        };
        let v = serde_json::to_value(&request).unwrap();
        assert_eq!(v["granularity"], "DAILY");
        assert_eq!(v["selector"]["conditions"][0]["operator"], "IN");
        assert_eq!(v["selector"]["conditions"][0]["values"][0], "US");
    }
}
