//! Campaign, ad group, keyword and negative keyword endpoints

use serde::Serialize;

use super::client::{collect_pages, Client, PAGE_SIZE};
use super::error::Result;
use super::models::{
    AdGroup, AdGroupCreate, AdGroupUpdate, Campaign, CampaignCreate, CampaignUpdate, Keyword,
    KeywordCreate, KeywordUpdate, NegativeKeyword, NegativeKeywordCreate, Page,
};
use super::selector::Selector;

/// Apply the default page size to a selector without pagination
fn paged(selector: &Selector) -> Selector {
    match selector.pagination {
        Some(_) => selector.clone(),
        None => selector.clone().limit(PAGE_SIZE),
    }
}

/// The selector for the page starting at `offset`, at the default page size
fn page_at(selector: &Selector, offset: usize) -> Selector {
    selector.clone().limit(PAGE_SIZE).offset(offset as u32)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WithOrg<'a, T> {
    org_id: u64,
    #[serde(flatten)]
    inner: &'a T,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CampaignUpdateBody<'a> {
    campaign: &'a CampaignUpdate,
    clear_geo_targeting_on_country_or_region_change: bool,
}

pub struct Campaigns<'a> {
    client: &'a Client,
}

impl<'a> Campaigns<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn list(&self, limit: u32) -> Result<Page<Campaign>> {
        self.client.get_page("/campaigns", limit, 0)
    }

    pub fn find(&self, selector: &Selector) -> Result<Page<Campaign>> {
        Ok(self.client.post("/campaigns/find", &paged(selector))?.into_page())
    }

    /// Every campaign matching the selector, across all pages
    pub fn find_all(&self, selector: &Selector) -> Result<Vec<Campaign>> {
        collect_pages(|offset| self.find(&page_at(selector, offset)))
    }

    pub fn all(&self) -> Result<Vec<Campaign>> {
        self.client.get_all("/campaigns")
    }

    pub fn get(&self, id: i64) -> Result<Campaign> {
        let path = format!("/campaigns/{}", id);
        self.client.get(&path, &[])?.into_data(&path)
    }

    pub fn create(&self, campaign: &CampaignCreate) -> Result<Campaign> {
        let body = WithOrg {
            org_id: self.client.org_id(),
            inner: campaign,
        };
        self.client.post("/campaigns", &body)?.into_data("/campaigns")
    }

    pub fn update(&self, id: i64, update: &CampaignUpdate) -> Result<Campaign> {
        let path = format!("/campaigns/{}", id);
        let body = CampaignUpdateBody {
            campaign: update,
            clear_geo_targeting_on_country_or_region_change: false,
        };
        self.client.put(&path, &body)?.into_data(&path)
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        self.client.delete(&format!("/campaigns/{}", id))
    }
}

pub struct AdGroups<'a> {
    client: &'a Client,
    campaign_id: i64,
}

impl<'a> AdGroups<'a> {
    pub(crate) fn new(client: &'a Client, campaign_id: i64) -> Self {
        Self { client, campaign_id }
    }

    fn base(&self) -> String {
        format!("/campaigns/{}/adgroups", self.campaign_id)
    }

    pub fn list(&self, limit: u32) -> Result<Page<AdGroup>> {
        self.client.get_page(&self.base(), limit, 0)
    }

    pub fn find(&self, selector: &Selector) -> Result<Page<AdGroup>> {
        let path = format!("{}/find", self.base());
        Ok(self.client.post(&path, &paged(selector))?.into_page())
    }

    /// Every ad group matching the selector, across all pages
    pub fn find_all(&self, selector: &Selector) -> Result<Vec<AdGroup>> {
        collect_pages(|offset| self.find(&page_at(selector, offset)))
    }

    pub fn all(&self) -> Result<Vec<AdGroup>> {
        self.client.get_all(&self.base())
    }

    pub fn get(&self, id: i64) -> Result<AdGroup> {
        let path = format!("{}/{}", self.base(), id);
        self.client.get(&path, &[])?.into_data(&path)
    }

    pub fn create(&self, ad_group: &AdGroupCreate) -> Result<AdGroup> {
        let path = self.base();
        self.client.post(&path, ad_group)?.into_data(&path)
    }

    pub fn update(&self, id: i64, update: &AdGroupUpdate) -> Result<AdGroup> {
        let path = format!("{}/{}", self.base(), id);
        self.client.put(&path, update)?.into_data(&path)
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        self.client.delete(&format!("{}/{}", self.base(), id))
    }
}

pub struct Keywords<'a> {
    client: &'a Client,
    campaign_id: i64,
    ad_group_id: i64,
}

impl<'a> Keywords<'a> {
    pub(crate) fn new(client: &'a Client, campaign_id: i64, ad_group_id: i64) -> Self {
        Self {
            client,
            campaign_id,
            ad_group_id,
        }
    }

    fn base(&self) -> String {
        format!(
            "/campaigns/{}/adgroups/{}/targetingkeywords",
            self.campaign_id, self.ad_group_id
        )
    }

    pub fn list(&self, limit: u32) -> Result<Page<Keyword>> {
        self.client.get_page(&self.base(), limit, 0)
    }

    /// Find within this ad group; the endpoint is campaign-wide so the ad
    /// group is added as a condition
    pub fn find(&self, selector: &Selector) -> Result<Page<Keyword>> {
        let path = format!("/campaigns/{}/adgroups/targetingkeywords/find", self.campaign_id);
        let selector = paged(selector).where_eq("adGroupId", self.ad_group_id);
        Ok(self.client.post(&path, &selector)?.into_page())
    }

    pub fn all(&self) -> Result<Vec<Keyword>> {
        self.client.get_all(&self.base())
    }

    pub fn get(&self, id: i64) -> Result<Keyword> {
        let path = format!("{}/{}", self.base(), id);
        self.client.get(&path, &[])?.into_data(&path)
    }

    pub fn create(&self, keywords: &[KeywordCreate]) -> Result<Vec<Keyword>> {
        let path = format!("{}/bulk", self.base());
        Ok(self.client.post(&path, keywords)?.into_data(&path).unwrap_or_default())
    }

    pub fn update(&self, updates: &[KeywordUpdate]) -> Result<Vec<Keyword>> {
        let path = format!("{}/bulk", self.base());
        Ok(self.client.put(&path, updates)?.into_data(&path).unwrap_or_default())
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        self.client.delete(&format!("{}/{}", self.base(), id))
    }
}

/// Where negative keywords live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegativeScope {
    Campaign(i64),
    AdGroup { campaign_id: i64, ad_group_id: i64 },
}

impl NegativeScope {
    pub fn new(campaign_id: i64, ad_group_id: Option<i64>) -> Self {
        match ad_group_id {
            Some(ad_group_id) => NegativeScope::AdGroup {
                campaign_id,
                ad_group_id,
            },
            None => NegativeScope::Campaign(campaign_id),
        }
    }

    /// "Campaign" or "Ad Group"
    pub fn label(&self) -> &'static str {
        match self {
            NegativeScope::Campaign(_) => "Campaign",
            NegativeScope::AdGroup { .. } => "Ad Group",
        }
    }

    fn base(&self) -> String {
        match self {
            NegativeScope::Campaign(c) => format!("/campaigns/{}/negativekeywords", c),
            NegativeScope::AdGroup {
                campaign_id,
                ad_group_id,
            } => format!("/campaigns/{}/adgroups/{}/negativekeywords", campaign_id, ad_group_id),
        }
    }
}

pub struct Negatives<'a> {
    client: &'a Client,
    scope: NegativeScope,
}

impl<'a> Negatives<'a> {
    pub(crate) fn new(client: &'a Client, scope: NegativeScope) -> Self {
        Self { client, scope }
    }

    pub fn list(&self, limit: u32) -> Result<Page<NegativeKeyword>> {
        self.client.get_page(&self.scope.base(), limit, 0)
    }

    pub fn create(&self, keywords: &[NegativeKeywordCreate]) -> Result<Vec<NegativeKeyword>> {
        let path = format!("{}/bulk", self.scope.base());
        Ok(self.client.post(&path, keywords)?.into_data(&path).unwrap_or_default())
    }

    pub fn delete(&self, ids: &[i64]) -> Result<()> {
        let path = format!("{}/delete/bulk", self.scope.base());
        self.client.post::<_, serde_json::Value>(&path, ids)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{Money, Status};
    use serde_json::json;

    #[test]
    fn test_negative_scope_paths() {
        assert_eq!(NegativeScope::new(5, None).base(), "/campaigns/5/negativekeywords");
        assert_eq!(
            NegativeScope::new(5, Some(9)).base(),
            "/campaigns/5/adgroups/9/negativekeywords"
        );
        assert_eq!(NegativeScope::new(5, Some(9)).label(), "Ad Group");
    }

    #[test]
    fn test_paged_defaults_limit() {
        let s = paged(&Selector::new());
        assert_eq!(s.pagination.map(|p| p.limit), Some(PAGE_SIZE));
        let s = paged(&Selector::new().limit(10));
        assert_eq!(s.pagination.map(|p| p.limit), Some(10));
    }

    #[test]
    fn test_page_at_keeps_conditions_and_steps_offset() {
        let selector = Selector::new().where_eq("status", Status::Enabled).limit(10);
        let v = serde_json::to_value(page_at(&selector, 2000)).unwrap();
        assert_eq!(v["pagination"], json!({"offset": 2000, "limit": PAGE_SIZE}));
        assert_eq!(v["conditions"][0]["values"], json!(["ENABLED"]));
    }

    #[test]
    fn test_create_body_carries_org() {
        let c = CampaignCreate::search_results("n", 1, vec!["US".into()], Money::new(5.0, "USD"), Status::Enabled);
        let v = serde_json::to_value(WithOrg { org_id: 77, inner: &c }).unwrap();
        assert_eq!(v["orgId"], json!(77));
        assert_eq!(v["name"], json!("n"));
    }

    #[test]
    fn test_update_body_wraps_campaign() {
        let update = CampaignUpdate {
            status: Some(Status::Enabled),
            ..Default::default()
        };
        let v = serde_json::to_value(CampaignUpdateBody {
            campaign: &update,
            clear_geo_targeting_on_country_or_region_change: false,
        })
        .unwrap();
        assert_eq!(
            v,
            json!({"campaign": {"status": "ENABLED"}, "clearGeoTargetingOnCountryOrRegionChange": false})
        );
    }
}
