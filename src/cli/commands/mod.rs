//! CLI command implementations

pub mod utils;

pub mod ad_groups;
pub mod auth;
pub mod brand;
pub mod campaigns;
pub mod completions;
pub mod impression_share;
pub mod keywords;
pub mod optimize;
pub mod reports;
