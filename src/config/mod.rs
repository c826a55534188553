//! Configuration module for the storefront crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use storefront_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Configured sites: {}", config.sites.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ControllerConfig, DetailConfig, FetchMode, FetchPolicyConfig, GatewayConfig,
    ListingConfig, ListingFormat, NavigationConfig, OutputConfig, RoutesConfig, SiteConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, config_digest, load_config, load_config_with_hash, parse_config,
};
