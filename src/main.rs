//! Storefront crawler main entry point
//!
//! This is the command-line interface for running, dry-running and
//! self-testing the configured storefront extractors.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use storefront_crawler::config::{load_config_with_hash, Config, FetchMode};
use storefront_crawler::controller::run_crawl;
use storefront_crawler::extractor::run_self_tests;
use storefront_crawler::gateway::build_fetcher;
use storefront_crawler::output::{
    build_sinks, generate_markdown_summary, print_statistics, print_stored_statistics, SqliteSink,
};
use storefront_crawler::sites::build_extractors;
use tracing_subscriber::EnvFilter;

/// Storefront crawler: per-site product extractors behind a fetch gateway
///
/// Each configured site is crawled from its seed pages through its
/// navigation menu, listing pages and product pages. Fetches go through a
/// proxy gateway or directly over HTTP.
#[derive(Parser, Debug)]
#[command(name = "storefront-crawler")]
#[command(version)]
#[command(about = "Crawls storefronts into normalized product records", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Only run the site with this name
    #[arg(long, value_name = "NAME")]
    site: Option<String>,

    /// Validate config and show the root tasks without fetching anything
    #[arg(long, conflicts_with_all = ["self_test", "stats_only"])]
    dry_run: bool,

    /// Fetch every seed URL and check that its extractor still handles it
    #[arg(long, conflicts_with_all = ["dry_run", "stats_only"])]
    self_test: bool,

    /// Show statistics from the record database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "self_test"])]
    stats_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let site = cli.site.as_deref();
    if let Some(name) = site {
        if config.site(name).is_none() {
            bail!("No site named '{}' in {}", name, cli.config.display());
        }
    }

    if cli.dry_run {
        handle_dry_run(&config, site)
    } else if cli.self_test {
        handle_self_test(&config, site).await
    } else if cli.stats_only {
        handle_stats(&config)
    } else {
        handle_crawl(&config, &config_hash, site).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("storefront_crawler=info,warn"),
            1 => EnvFilter::new("storefront_crawler=debug,info"),
            2 => EnvFilter::new("storefront_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: builds every extractor and lists its root tasks
fn handle_dry_run(config: &Config, site: Option<&str>) -> anyhow::Result<()> {
    println!("=== Storefront Crawler Dry Run ===\n");

    println!("Controller:");
    println!(
        "  Max concurrent fetches: {}",
        config.controller.max_concurrent_fetches
    );
    println!("  Max retries: {}", config.controller.max_retries);
    println!("  Retry delay: {}ms", config.controller.retry_delay_ms);
    if let Some(max) = config.controller.max_fetches {
        println!("  Fetch cap: {}", max);
    }

    println!("\nFetching:");
    match config.gateway.mode {
        FetchMode::Gateway => println!(
            "  Gateway: {} (timeout {}ms)",
            config.gateway.endpoint.as_deref().unwrap_or("-"),
            config.gateway.timeout_ms
        ),
        FetchMode::Direct => println!("  Direct as {}", config.user_agent.header_value()),
    }

    println!("\nOutput:");
    println!("  Records: {}", config.output.records_path);
    if let Some(path) = &config.output.database_path {
        println!("  Database: {}", path);
    }
    if let Some(path) = &config.output.summary_path {
        println!("  Summary: {}", path);
    }

    let extractors = build_extractors(config, site)?;
    println!("\nSites ({}):", extractors.len());
    let mut roots = 0;
    for extractor in &extractors {
        println!(
            "  - {} [{}]",
            extractor.name(),
            extractor.domains().patterns().join(", ")
        );
        for (_, task) in extractor.seed_tasks() {
            let options = &task.options;
            println!(
                "    * {} (proxy: {}, tier: {}, headless: {}, init session: {})",
                task.url,
                options.use_proxy,
                options.reliability.as_str(),
                options.headless_render,
                options.init_session
            );
            roots += 1;
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling with {} root tasks", roots);

    Ok(())
}

/// Handles the --self-test mode: fetches every seed and validates it
async fn handle_self_test(config: &Config, site: Option<&str>) -> anyhow::Result<()> {
    let extractors = build_extractors(config, site)?;
    let fetcher = build_fetcher(config)?;

    let report = run_self_tests(&extractors, fetcher.as_ref()).await;
    report.print();

    if !report.is_success() {
        bail!("Self-test failed for: {}", report.failed_sites().join(", "));
    }
    Ok(())
}

/// Handles the --stats-only mode: shows what the record database holds
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let Some(database_path) = &config.output.database_path else {
        bail!("--stats-only needs output.database-path to be configured");
    };

    println!("Database: {}\n", database_path);
    let sink = SqliteSink::open(Path::new(database_path))
        .with_context(|| format!("Failed to open {}", database_path))?;
    print_stored_statistics(&sink.statistics()?);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str, site: Option<&str>) -> anyhow::Result<()> {
    let mut sink = build_sinks(&config.output)?;

    let stats = match run_crawl(config, site, &mut sink).await {
        Ok(stats) => stats,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    print_statistics(&stats);

    if let Some(summary_path) = &config.output.summary_path {
        generate_markdown_summary(&stats, config_hash, Path::new(summary_path))?;
        println!("\n✓ Summary written to: {}", summary_path);
    }

    Ok(())
}
