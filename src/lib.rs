//! asa: Apple Search Ads from the command line
//!
//! Manage campaigns, ad groups and keywords, pull reports, and run the
//! brand, expansion and bid optimization workflows against the Search Ads
//! API.

pub mod api;
pub mod cli;
pub mod core;
