//! Markdown summary generation

use crate::output::stats::CrawlStatistics;
use crate::output::traits::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of a run to `output_path`
pub fn generate_markdown_summary(
    stats: &CrawlStatistics,
    config_hash: &str,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(stats, config_hash);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats run statistics as markdown
pub fn format_markdown_summary(stats: &CrawlStatistics, config_hash: &str) -> String {
    let mut md = String::new();

    md.push_str("# Storefront Crawl Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", stats.started_at.to_rfc3339()));
    if let Some(finished) = &stats.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = stats.duration_seconds() {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Config Hash**: {}\n\n", config_hash));

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Fetch Attempts**: {}\n", stats.fetches));
    md.push_str(&format!("- **Records**: {}\n", stats.records));
    md.push_str(&format!("- **Retries**: {}\n", stats.retries));
    md.push_str(&format!("- **Abandoned**: {}\n", stats.abandoned));
    md.push_str(&format!("- **Duplicates Skipped**: {}\n", stats.duplicates));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        stats.success_rate()
    ));

    if !stats.records_by_site.is_empty() {
        md.push_str("## Records by Site\n\n");
        md.push_str("| Site | Records |\n");
        md.push_str("|------|---------|\n");
        for (site, count) in &stats.records_by_site {
            md.push_str(&format!("| {} | {} |\n", site, count));
        }
        md.push('\n');
    }

    if !stats.pages_by_kind.is_empty() {
        md.push_str("## Pages by Kind\n\n");
        md.push_str("| Kind | Pages |\n");
        md.push_str("|------|-------|\n");
        for (kind, count) in &stats.pages_by_kind {
            md.push_str(&format!("| {} | {} |\n", kind, count));
        }
        md.push('\n');
    }

    md.push_str("## Failures\n\n");
    if stats.failures.is_empty() {
        md.push_str("No failed attempts.\n");
    } else {
        md.push_str("| Kind | Attempts |\n");
        md.push_str("|------|----------|\n");
        for (kind, count) in &stats.failures {
            md.push_str(&format!("| {} | {} |\n", kind.as_str(), count));
        }
    }

    md
}
