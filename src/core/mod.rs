//! Core module - configuration and domain rules shared by commands

pub mod config;
pub mod countries;
pub mod naming;

pub use config::{ConfigError, LoadedConfig, Settings};
pub use naming::{CampaignName, MatchCode};
