//! Campaign naming convention: `App Name - CC - Type - Match`
//!
//! Examples:
//! - `Chippy Tools - US - Generic - Exact Match`
//! - `Concrete Tools - AU - Competitor - EM`

use std::fmt;

/// Match portion of a campaign name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchCode {
    /// Exact match (`EM`, `Exact Match`)
    Exact,
    /// Broad or search match (`BM`, `Broad Match`, `SM`, `Search Match`)
    Broad,
}

impl MatchCode {
    pub fn parse(s: &str) -> Option<MatchCode> {
        match s.trim().to_uppercase().as_str() {
            "EM" | "EXACT MATCH" => Some(MatchCode::Exact),
            "BM" | "BROAD MATCH" | "SM" | "SEARCH MATCH" => Some(MatchCode::Broad),
            _ => None,
        }
    }

    pub fn long_name(&self) -> &'static str {
        match self {
            MatchCode::Exact => "Exact Match",
            MatchCode::Broad => "Broad Match",
        }
    }
}

impl fmt::Display for MatchCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchCode::Exact => write!(f, "EM"),
            MatchCode::Broad => write!(f, "BM"),
        }
    }
}

/// A campaign name split into its convention parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignName {
    pub app_name: String,
    pub country: String,
    /// Generic, Competitor, Brand, ...
    pub campaign_type: String,
    pub match_code: MatchCode,
    pub original: String,
}

impl CampaignName {
    /// Parse a name; returns None when it doesn't follow the convention
    ///
    /// The app is the first part, the country the second, the type the
    /// second-to-last and the match code the last.
    pub fn parse(name: &str) -> Option<CampaignName> {
        let parts: Vec<&str> = name.split(" - ").map(str::trim).collect();
        if parts.len() < 4 {
            return None;
        }
        let match_code = MatchCode::parse(parts[parts.len() - 1])?;
        Some(CampaignName {
            app_name: parts[0].to_string(),
            country: parts[1].to_uppercase(),
            campaign_type: parts[parts.len() - 2].to_string(),
            match_code,
            original: name.to_string(),
        })
    }

    /// Same campaign name targeting another country
    pub fn with_country(&self, country: &str) -> String {
        format!(
            "{} - {} - {} - {}",
            self.app_name,
            country,
            self.campaign_type,
            self.match_code.long_name()
        )
    }
}

/// Name of a brand campaign for one country
pub fn brand_campaign_name(app_name: &str, country: &str) -> String {
    format!("{} - {} - Brand - EM", app_name, country)
}

/// App name for a campaign: the convention's app part, else the text
/// before the first ` - `
pub fn app_name_of(campaign_name: &str) -> String {
    match CampaignName::parse(campaign_name) {
        Some(parsed) => parsed.app_name,
        None => campaign_name
            .split(" - ")
            .next()
            .unwrap_or(campaign_name)
            .trim()
            .to_string(),
    }
}
