use crate::node::BookmarkRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// Domain bucket for URLs that cannot be parsed or carry no host.
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// Static-site hosting suffixes rolled up in the domain report.
pub const HOSTING_SUFFIXES: &[&str] = &[
    "github.io",
    "vercel.app",
    "netlify.app",
    "pages.dev",
    "neocities.org",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainStats {
    pub total: usize,
    /// Domain frequencies, highest count first, ties by domain name.
    pub frequencies: Vec<(String, usize)>,
    /// One entry per hosting suffix, highest count first.
    pub hosting: Vec<(String, usize)>,
}

impl DomainStats {
    pub fn top(&self, n: usize) -> &[(String, usize)] {
        &self.frequencies[..n.min(self.frequencies.len())]
    }

    pub fn count_for(&self, domain: &str) -> usize {
        self.frequencies
            .iter()
            .find(|(d, _)| d == domain)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    pub fn hosting_for(&self, suffix: &str) -> usize {
        self.hosting
            .iter()
            .find(|(s, _)| s == suffix)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }
}

/// Lower-cased host of `url` without a leading `www.`.
pub fn extract_domain(url: &str) -> String {
    let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_lowercase)) else {
        return UNKNOWN_DOMAIN.to_string();
    };
    if host.is_empty() {
        return UNKNOWN_DOMAIN.to_string();
    }
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

// Plain string suffix: `notgithub.io` counts toward `github.io` too.
fn under_suffix(domain: &str, suffix: &str) -> bool {
    domain.ends_with(suffix)
}

pub fn aggregate(records: &[BookmarkRecord]) -> DomainStats {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        *counts.entry(extract_domain(&record.url)).or_insert(0) += 1;
    }

    let mut frequencies: Vec<(String, usize)> = counts.into_iter().collect();
    frequencies.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut hosting: Vec<(String, usize)> = HOSTING_SUFFIXES
        .iter()
        .map(|suffix| {
            let sum = frequencies
                .iter()
                .filter(|(domain, _)| under_suffix(domain, suffix))
                .map(|(_, c)| c)
                .sum();
            (suffix.to_string(), sum)
        })
        .collect();
    // Stable sort keeps the suffix list order among equal counts.
    hosting.sort_by(|a, b| b.1.cmp(&a.1));

    DomainStats {
        total: records.len(),
        frequencies,
        hosting,
    }
}
