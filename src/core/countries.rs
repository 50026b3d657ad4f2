//! Storefront catalog: every country or region where search ads can run
//!
//! China is listed but excluded from presets and "all" unless explicitly
//! requested, since it requires special business documentation.

use Region::*;

/// Geographic grouping of storefronts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    AfricaMiddleEastIndia,
    AsiaPacific,
    Europe,
    LatinAmerica,
    NorthAmerica,
}

impl Region {
    pub const ALL: [Region; 5] = [AfricaMiddleEastIndia, AsiaPacific, Europe, LatinAmerica, NorthAmerica];
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AfricaMiddleEastIndia => write!(f, "Africa Middle East India"),
            AsiaPacific => write!(f, "Asia Pacific"),
            Europe => write!(f, "Europe"),
            LatinAmerica => write!(f, "Latin America"),
            NorthAmerica => write!(f, "North America"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Storefront {
    pub code: &'static str,
    pub name: &'static str,
    pub region: Region,
}

const fn sf(code: &'static str, name: &'static str, region: Region) -> Storefront {
    Storefront { code, name, region }
}

pub const CHINA: &str = "CN";

pub const STOREFRONTS: &[Storefront] = &[
    sf("DZ", "Algeria", AfricaMiddleEastIndia),
    sf("AM", "Armenia", AfricaMiddleEastIndia),
    sf("BH", "Bahrain", AfricaMiddleEastIndia),
    sf("EG", "Egypt", AfricaMiddleEastIndia),
    sf("GH", "Ghana", AfricaMiddleEastIndia),
    sf("IN", "India", AfricaMiddleEastIndia),
    sf("IQ", "Iraq", AfricaMiddleEastIndia),
    sf("IL", "Israel", AfricaMiddleEastIndia),
    sf("JO", "Jordan", AfricaMiddleEastIndia),
    sf("KE", "Kenya", AfricaMiddleEastIndia),
    sf("KW", "Kuwait", AfricaMiddleEastIndia),
    sf("LB", "Lebanon", AfricaMiddleEastIndia),
    sf("MA", "Morocco", AfricaMiddleEastIndia),
    sf("OM", "Oman", AfricaMiddleEastIndia),
    sf("PK", "Pakistan", AfricaMiddleEastIndia),
    sf("QA", "Qatar", AfricaMiddleEastIndia),
    sf("SA", "Saudi Arabia", AfricaMiddleEastIndia),
    sf("ZA", "South Africa", AfricaMiddleEastIndia),
    sf("AE", "UAE", AfricaMiddleEastIndia),
    sf("AU", "Australia", AsiaPacific),
    sf("KH", "Cambodia", AsiaPacific),
    sf("CN", "China", AsiaPacific),
    sf("HK", "Hong Kong", AsiaPacific),
    sf("ID", "Indonesia", AsiaPacific),
    sf("JP", "Japan", AsiaPacific),
    sf("MO", "Macau", AsiaPacific),
    sf("MY", "Malaysia", AsiaPacific),
    sf("MN", "Mongolia", AsiaPacific),
    sf("NP", "Nepal", AsiaPacific),
    sf("NZ", "New Zealand", AsiaPacific),
    sf("PH", "Philippines", AsiaPacific),
    sf("SG", "Singapore", AsiaPacific),
    sf("KR", "South Korea", AsiaPacific),
    sf("LK", "Sri Lanka", AsiaPacific),
    sf("TW", "Taiwan", AsiaPacific),
    sf("TH", "Thailand", AsiaPacific),
    sf("VN", "Vietnam", AsiaPacific),
    sf("AL", "Albania", Europe),
    sf("AT", "Austria", Europe),
    sf("AZ", "Azerbaijan", Europe),
    sf("BE", "Belgium", Europe),
    sf("BG", "Bulgaria", Europe),
    sf("HR", "Croatia", Europe),
    sf("CY", "Cyprus", Europe),
    sf("CZ", "Czech Republic", Europe),
    sf("DK", "Denmark", Europe),
    sf("EE", "Estonia", Europe),
    sf("FI", "Finland", Europe),
    sf("FR", "France", Europe),
    sf("DE", "Germany", Europe),
    sf("GR", "Greece", Europe),
    sf("HU", "Hungary", Europe),
    sf("IS", "Iceland", Europe),
    sf("IE", "Ireland", Europe),
    sf("IT", "Italy", Europe),
    sf("KZ", "Kazakhstan", Europe),
    sf("KG", "Kyrgyzstan", Europe),
    sf("LV", "Latvia", Europe),
    sf("LU", "Luxembourg", Europe),
    sf("NL", "Netherlands", Europe),
    sf("NO", "Norway", Europe),
    sf("PL", "Poland", Europe),
    sf("PT", "Portugal", Europe),
    sf("RO", "Romania", Europe),
    sf("RU", "Russia", Europe),
    sf("SK", "Slovakia", Europe),
    sf("SI", "Slovenia", Europe),
    sf("ES", "Spain", Europe),
    sf("SE", "Sweden", Europe),
    sf("CH", "Switzerland", Europe),
    sf("TR", "Türkiye", Europe),
    sf("GB", "UK", Europe),
    sf("UA", "Ukraine", Europe),
    sf("UZ", "Uzbekistan", Europe),
    sf("AR", "Argentina", LatinAmerica),
    sf("BO", "Bolivia", LatinAmerica),
    sf("BR", "Brazil", LatinAmerica),
    sf("CL", "Chile", LatinAmerica),
    sf("CO", "Colombia", LatinAmerica),
    sf("CR", "Costa Rica", LatinAmerica),
    sf("DO", "Dominican Republic", LatinAmerica),
    sf("EC", "Ecuador", LatinAmerica),
    sf("SV", "El Salvador", LatinAmerica),
    sf("GT", "Guatemala", LatinAmerica),
    sf("HN", "Honduras", LatinAmerica),
    sf("MX", "Mexico", LatinAmerica),
    sf("PA", "Panamá", LatinAmerica),
    sf("PY", "Paraguay", LatinAmerica),
    sf("PE", "Peru", LatinAmerica),
    sf("CA", "Canada", NorthAmerica),
    sf("US", "United States", NorthAmerica),
];

pub fn find(code: &str) -> Option<&'static Storefront> {
    STOREFRONTS.iter().find(|s| s.code == code)
}

/// Display name for a code, falling back to the code itself
pub fn country_name(code: &str) -> &str {
    find(code).map(|s| s.name).unwrap_or(code)
}

/// Every supported storefront code in catalog order
pub fn all_countries(include_china: bool) -> Vec<&'static str> {
    STOREFRONTS
        .iter()
        .filter(|s| include_china || s.code != CHINA)
        .map(|s| s.code)
        .collect()
}

fn region_codes(region: Region) -> Vec<&'static str> {
    STOREFRONTS
        .iter()
        .filter(|s| s.region == region)
        .map(|s| s.code)
        .collect()
}

/// Named country groups offered by `asa brand`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    All,
    English,
    Tier1,
    Europe,
    Asia,
    Latam,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Preset::All,
        Preset::English,
        Preset::Tier1,
        Preset::Europe,
        Preset::Asia,
        Preset::Latam,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Preset::All => "all",
            Preset::English => "english",
            Preset::Tier1 => "tier1",
            Preset::Europe => "europe",
            Preset::Asia => "asia",
            Preset::Latam => "latam",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Preset::All => "All countries (excl. China)",
            Preset::English => "English-speaking",
            Preset::Tier1 => "Tier 1 (US, GB, CA, AU)",
            Preset::Europe => "Europe",
            Preset::Asia => "Asia Pacific (excl. China)",
            Preset::Latam => "Latin America",
        }
    }

    pub fn from_key(key: &str) -> Option<Preset> {
        let key = key.trim().to_lowercase();
        Preset::ALL.into_iter().find(|p| p.key() == key)
    }

    /// Resolve the preset to storefront codes
    ///
    /// `include_china` only affects `All`; the Asia preset never includes CN.
    pub fn countries(&self, include_china: bool) -> Vec<&'static str> {
        match self {
            Preset::All => all_countries(include_china),
            Preset::English => vec!["US", "GB", "CA", "AU", "NZ", "IE"],
            Preset::Tier1 => vec!["US", "GB", "CA", "AU"],
            Preset::Europe => region_codes(Region::Europe),
            Preset::Asia => region_codes(Region::AsiaPacific)
                .into_iter()
                .filter(|c| *c != CHINA)
                .collect(),
            Preset::Latam => region_codes(Region::LatinAmerica),
        }
    }
}

/// Why a requested country code was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountryIssue {
    Unknown(String),
    ChinaExcluded,
}

/// Validate and deduplicate user-supplied codes, preserving order
pub fn resolve_codes<'a, I>(codes: I, include_china: bool) -> (Vec<String>, Vec<CountryIssue>)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut accepted: Vec<String> = Vec::new();
    let mut issues = Vec::new();

    for raw in codes {
        let code = raw.trim().to_uppercase();
        if code.is_empty() {
            continue;
        }
        if find(&code).is_none() {
            issues.push(CountryIssue::Unknown(code));
            continue;
        }
        if code == CHINA && !include_china {
            issues.push(CountryIssue::ChinaExcluded);
            continue;
        }
        if !accepted.contains(&code) {
            accepted.push(code);
        }
    }

    (accepted, issues)
}

/// Group codes by region in catalog order; unknown codes are dropped
pub fn group_by_region(codes: &[String]) -> Vec<(Region, Vec<String>)> {
    Region::ALL
        .into_iter()
        .filter_map(|region| {
            let members: Vec<String> = codes
                .iter()
                .filter(|c| find(c).is_some_and(|s| s.region == region))
                .cloned()
                .collect();
            (!members.is_empty()).then_some((region, members))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_counts() {
        assert_eq!(STOREFRONTS.len(), 91);
        assert_eq!(all_countries(false).len(), 90);
        assert!(all_countries(true).contains(&"CN"));
        assert_eq!(region_codes(Region::Europe).len(), 37);
        assert_eq!(region_codes(Region::NorthAmerica), vec!["CA", "US"]);
    }

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<&str> = STOREFRONTS.iter().map(|s| s.code).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), STOREFRONTS.len());
    }

    #[test]
    fn test_presets() {
        assert_eq!(Preset::Tier1.countries(false), vec!["US", "GB", "CA", "AU"]);
        assert_eq!(Preset::English.countries(false).len(), 6);
        assert_eq!(Preset::Asia.countries(true).len(), 17);
        assert!(!Preset::Asia.countries(true).contains(&"CN"));
        assert_eq!(Preset::Latam.countries(false).len(), 15);
        assert_eq!(Preset::from_key(" Europe "), Some(Preset::Europe));
        assert_eq!(Preset::from_key("mars"), None);
    }

    #[test]
    fn test_resolve_codes() {
        let (ok, issues) = resolve_codes(["us", "GB", "xx", "cn", "US", ""], false);
        assert_eq!(ok, vec!["US".to_string(), "GB".to_string()]);
        assert_eq!(
            issues,
            vec![CountryIssue::Unknown("XX".to_string()), CountryIssue::ChinaExcluded]
        );

        let (ok, issues) = resolve_codes(["cn"], true);
        assert_eq!(ok, vec!["CN".to_string()]);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_country_name() {
        assert_eq!(country_name("GB"), "UK");
        assert_eq!(country_name("TR"), "Türkiye");
        assert_eq!(country_name("ZZ"), "ZZ");
    }

    #[test]
    fn test_group_by_region() {
        let codes: Vec<String> = ["US", "DE", "JP", "FR"].iter().map(|s| s.to_string()).collect();
        let groups = group_by_region(&codes);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].0, Region::AsiaPacific);
        assert_eq!(groups[1], (Region::Europe, vec!["DE".to_string(), "FR".to_string()]));
        assert_eq!(groups[2].0, Region::NorthAmerica);
        assert_eq!(Region::AfricaMiddleEastIndia.to_string(), "Africa Middle East India");
    }
}
