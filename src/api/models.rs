//! Resource models for campaigns, ad groups and keywords
//!
//! Only the fields the commands read or write are modelled; anything else
//! in a response is ignored. Status enums fall back to `Unknown` so new
//! server values don't break decoding.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A monetary amount; the amount stays a decimal string on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub amount: String,
    pub currency: String,
}

impl Money {
    pub fn new(amount: f64, currency: &str) -> Self {
        Self {
            amount: format!("{:.2}", amount),
            currency: currency.to_uppercase(),
        }
    }

    /// Numeric value for arithmetic; unparseable amounts count as zero
    pub fn value(&self) -> f64 {
        self.amount.trim().parse().unwrap_or(0.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                #[value(name = $wire)]
                $variant,
            )+
            #[default]
            #[serde(other)]
            #[value(skip)]
            Unknown,
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                    $name::Unknown => "UNKNOWN",
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum!(
    /// Campaign and ad group status
    Status { Enabled => "ENABLED", Paused => "PAUSED" }
);

wire_enum!(
    /// Whether the server is actually delivering
    ServingStatus { Running => "RUNNING", NotRunning => "NOT_RUNNING" }
);

wire_enum!(
    /// Targeting keyword status
    KeywordStatus { Active => "ACTIVE", Paused => "PAUSED" }
);

wire_enum!(
    MatchType { Exact => "EXACT", Broad => "BROAD" }
);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Campaign {
    pub id: i64,
    pub org_id: Option<i64>,
    pub name: String,
    pub adam_id: Option<i64>,
    pub status: Status,
    pub serving_status: Option<ServingStatus>,
    pub display_status: Option<String>,
    pub countries_or_regions: Vec<String>,
    pub daily_budget_amount: Option<Money>,
    pub budget_amount: Option<Money>,
    pub supply_sources: Vec<String>,
    pub ad_channel_type: Option<String>,
    pub billing_event: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub modification_time: Option<String>,
    pub deleted: bool,
}

impl Campaign {
    /// Daily budget currency, or USD when no budget is set
    pub fn currency(&self) -> String {
        self.daily_budget_amount
            .as_ref()
            .map(|m| m.currency.clone())
            .unwrap_or_else(|| "USD".to_string())
    }
}

/// Body for creating a search-results campaign
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignCreate {
    pub name: String,
    pub adam_id: i64,
    pub countries_or_regions: Vec<String>,
    pub daily_budget_amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_amount: Option<Money>,
    pub status: Status,
    pub supply_sources: Vec<String>,
    pub ad_channel_type: String,
    pub billing_event: String,
}

impl CampaignCreate {
    pub fn search_results(
        name: impl Into<String>,
        adam_id: i64,
        countries: Vec<String>,
        daily_budget: Money,
        status: Status,
    ) -> Self {
        Self {
            name: name.into(),
            adam_id,
            countries_or_regions: countries,
            daily_budget_amount: daily_budget,
            budget_amount: None,
            status,
            supply_sources: vec!["APPSTORE_SEARCH_RESULTS".to_string()],
            ad_channel_type: "SEARCH".to_string(),
            billing_event: "TAPS".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_budget_amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_amount: Option<Money>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdGroup {
    pub id: i64,
    pub campaign_id: i64,
    pub name: String,
    pub status: Status,
    pub serving_status: Option<ServingStatus>,
    pub display_status: Option<String>,
    pub default_bid_amount: Option<Money>,
    pub cpa_goal: Option<Money>,
    pub automated_keywords_opt_in: bool,
    pub pricing_model: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdGroupCreate {
    pub name: String,
    pub default_bid_amount: Money,
    pub automated_keywords_opt_in: bool,
    pub pricing_model: String,
    pub start_time: String,
    pub status: Status,
}

impl AdGroupCreate {
    /// CPC ad group starting now, with search match off
    pub fn exact(name: impl Into<String>, default_bid: Money) -> Self {
        Self {
            name: name.into(),
            default_bid_amount: default_bid,
            automated_keywords_opt_in: false,
            pricing_model: "CPC".to_string(),
            start_time: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
            status: Status::Enabled,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdGroupUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_bid_amount: Option<Money>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Keyword {
    pub id: i64,
    pub campaign_id: Option<i64>,
    pub ad_group_id: i64,
    pub text: String,
    pub match_type: MatchType,
    pub status: KeywordStatus,
    pub bid_amount: Option<Money>,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordCreate {
    pub text: String,
    pub match_type: MatchType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_amount: Option<Money>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordUpdate {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<KeywordStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_amount: Option<Money>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NegativeKeyword {
    pub id: i64,
    pub campaign_id: Option<i64>,
    pub ad_group_id: Option<i64>,
    pub text: String,
    pub match_type: MatchType,
    pub status: Option<String>,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegativeKeywordCreate {
    pub text: String,
    pub match_type: MatchType,
}

/// Pagination block of a list response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub total_results: u64,
    pub start_index: u64,
    pub items_per_page: u64,
}

/// One page of a list or find response
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Option<Pagination>,
}

impl<T> Page<T> {
    /// Total matching results on the server, or the page length without pagination
    pub fn total(&self) -> u64 {
        self.pagination
            .map(|p| p.total_results)
            .unwrap_or(self.data.len() as u64)
    }
}
