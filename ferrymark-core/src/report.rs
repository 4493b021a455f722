// Report generation for run summaries, domain analysis and inspections

use crate::error::Result;
use crate::sink::write_atomic;
use ferrymark_tree::{Anomalies, Counts, DomainStats};
use serde::{Deserialize, Serialize};
use std::path::Path;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Outcome of a migrate or repair run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub source: String,
    pub target: String,
    pub counts: Counts,
    /// Counts before the transformation, when there was a prior tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Counts>,
    pub folders_collapsed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,
    pub dry_run: bool,
}

impl RunSummary {
    pub fn counts_line(&self) -> String {
        format!(
            "{} bookmarks, {} folders",
            self.counts.bookmarks, self.counts.folders
        )
    }
}

pub fn generate_domain_text_report(stats: &DomainStats, top: usize) -> String {
    let mut report = String::new();

    report.push_str(&format!("{}\n", RULE));
    report.push_str("DOMAIN REPORT\n");
    report.push_str(&format!("{}\n\n", RULE));
    report.push_str(&format!("Total bookmarks: {}\n", stats.total));
    report.push_str(&format!("Distinct domains: {}\n\n", stats.frequencies.len()));

    report.push_str(&format!("Top {} domains:\n", top));
    for (idx, (domain, count)) in stats.top(top).iter().enumerate() {
        report.push_str(&format!("{:3}. {}: {}\n", idx + 1, domain, count));
    }

    let hosted: Vec<&(String, usize)> = stats.hosting.iter().filter(|(_, c)| *c > 0).collect();
    if !hosted.is_empty() {
        report.push_str("\nHosting platforms:\n");
        for (suffix, count) in hosted {
            report.push_str(&format!("  *.{}: {}\n", suffix, count));
        }
    }

    report
}

pub fn generate_domain_json_report(stats: &DomainStats, top: usize) -> Result<String> {
    let hosting: Vec<_> = stats
        .hosting
        .iter()
        .filter(|(_, c)| *c > 0)
        .map(|(suffix, count)| serde_json::json!({ "suffix": suffix, "count": count }))
        .collect();
    let domains: Vec<_> = stats
        .top(top)
        .iter()
        .map(|(domain, count)| serde_json::json!({ "domain": domain, "count": count }))
        .collect();

    let report = serde_json::json!({
        "metadata": {
            "generator": "Ferrymark",
            "version": env!("CARGO_PKG_VERSION"),
            "generated_at": chrono::Utc::now().to_rfc3339(),
        },
        "total": stats.total,
        "distinct_domains": stats.frequencies.len(),
        "domains": domains,
        "hosting": hosting,
    });

    Ok(serde_json::to_string_pretty(&report)?)
}

pub fn generate_inspect_text_report(anomalies: &Anomalies) -> String {
    let mut report = String::new();

    report.push_str(&format!("{}\n", RULE));
    report.push_str("BOOKMARK INSPECTION\n");
    report.push_str(&format!("{}\n\n", RULE));
    report.push_str(&format!("Bookmarks:              {}\n", anomalies.counts.bookmarks));
    report.push_str(&format!("Folders:                {}\n\n", anomalies.counts.folders));
    report.push_str(&format!("Duplicate URLs:         {}\n", anomalies.duplicate_urls));
    report.push_str(&format!("Empty folders:          {}\n", anomalies.empty_folders));
    report.push_str(&format!("Nested same-title:      {}\n", anomalies.nested_same_title));
    report.push('\n');

    if anomalies.total_issues() == 0 {
        report.push_str("No anomalies found.\n");
    } else {
        report.push_str(&format!("{} items may need attention.\n", anomalies.total_issues()));
    }

    report
}

pub fn save_report(content: &str, path: &Path) -> Result<()> {
    write_atomic(path, content.as_bytes())
}
