//! Blocking binding for the Apple Search Ads API (v5)
//!
//! Covers the endpoints the commands use: campaigns, ad groups, targeting
//! and negative keywords, reports, and impression share custom reports.
//! Every request is made synchronously on the calling thread.

mod auth;
mod client;
pub mod custom_reports;
mod error;
pub mod models;
pub mod reports;
pub mod resources;
pub mod selector;

pub use client::{wait_for, Client};
pub use error::{ApiError, FieldError, Result};
pub use resources::NegativeScope;
