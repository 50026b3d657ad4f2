//! Shared utilities for CLI commands

use miette::Result;

use crate::api::models::{AdGroup, Campaign, Status};
use crate::api::selector::Selector;
use crate::api::Client;
use crate::cli::output::{self, Spinner};
use crate::cli::GlobalOpts;
use crate::core::LoadedConfig;

/// Load settings and build an API client
///
/// Missing or invalid credentials surface as a `ConfigError` diagnostic
/// whose help lists the required environment variables.
pub fn connect(global: &GlobalOpts) -> Result<Client> {
    let loaded = LoadedConfig::load(&global.env_file)?;
    let settings = loaded.settings()?;
    Ok(Client::new(settings)?)
}

/// Run an API call behind a spinner
pub fn with_spinner<T, F>(message: &str, f: F) -> Result<T>
where
    F: FnOnce() -> crate::api::Result<T>,
{
    let spinner = Spinner::start(message);
    let result = f();
    drop(spinner);
    Ok(result?)
}

/// Ask before a destructive action unless `--force` was given
///
/// Returns false (after printing "Cancelled") when the user declines.
pub fn confirm_destructive(force: bool, prompt: &str) -> Result<bool> {
    if force {
        return Ok(true);
    }
    if output::confirm(prompt, false)? {
        Ok(true)
    } else {
        output::warning("Cancelled");
        Ok(false)
    }
}

/// Every ENABLED campaign
pub fn enabled_campaigns(client: &Client) -> crate::api::Result<Vec<Campaign>> {
    let selector = Selector::new().where_eq("status", Status::Enabled);
    client.campaigns().find_all(&selector)
}

/// Every ENABLED ad group in a campaign
pub fn enabled_ad_groups(client: &Client, campaign_id: i64) -> crate::api::Result<Vec<AdGroup>> {
    let selector = Selector::new().where_eq("status", Status::Enabled);
    client.ad_groups(campaign_id).find_all(&selector)
}
