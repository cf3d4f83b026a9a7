// src/aggregate/group.rs
// =============================================================================
// Extension extraction and grouping.
//
// The group key is re-derived from the URL itself with a looser rule than
// the filter: the last dot-delimited alphanumeric token before an optional
// query string. So a URL kept by the `tar\.gz` filter lands in the "gz"
// group.
// =============================================================================

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn extension_rule() -> &'static Regex {
    static RULE: OnceLock<Regex> = OnceLock::new();
    RULE.get_or_init(|| {
        Regex::new(r"\.([A-Za-z0-9]+)(\?.*)?$").expect("extension pattern is valid")
    })
}

/// The trailing extension of a URL, if it has one
pub fn derive_extension(url: &str) -> Option<&str> {
    extension_rule()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Filtered URLs grouped by extension, in order of first discovery.
///
/// Built once, then only read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionGroups {
    groups: Vec<(String, Vec<String>)>,
    /// URLs with no extractable extension
    unclassified: Vec<String>,
}

impl ExtensionGroups {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(ext, urls)| (ext.as_str(), urls.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn unclassified(&self) -> &[String] {
        &self.unclassified
    }

    /// Total URLs across all groups
    pub fn url_count(&self) -> usize {
        self.groups.iter().map(|(_, urls)| urls.len()).sum()
    }

    pub(crate) fn into_parts(self) -> (Vec<(String, Vec<String>)>, Vec<String>) {
        (self.groups, self.unclassified)
    }
}

pub fn group_by_extension<I, S>(urls: I) -> ExtensionGroups
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut unclassified = Vec::new();

    for url in urls {
        let url = url.into();
        let ext = match derive_extension(&url) {
            Some(ext) => ext.to_string(),
            None => {
                unclassified.push(url);
                continue;
            }
        };
        let slot = *slots.entry(ext.clone()).or_insert_with(|| {
            groups.push((ext, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(url);
    }

    ExtensionGroups {
        groups,
        unclassified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_extension() {
        assert_eq!(derive_extension("http://a.com/x.pdf"), Some("pdf"));
        assert_eq!(derive_extension("http://a.com/z.pdf?v=2"), Some("pdf"));
        assert_eq!(derive_extension("http://a.com/b.tar.gz"), Some("gz"));
        assert_eq!(derive_extension("http://a.com/q.pdf?x=a.b"), Some("pdf"));
        assert_eq!(derive_extension("http://a.com/dir/"), None);
        assert_eq!(derive_extension("http://a.com/file.p-f"), None);
    }

    #[test]
    fn test_groups_keep_discovery_order() {
        let groups = group_by_extension(vec![
            "http://a.com/1.sql",
            "http://a.com/2.pdf",
            "http://a.com/3.sql",
        ]);
        let keys: Vec<&str> = groups.iter().map(|(ext, _)| ext).collect();
        assert_eq!(keys, vec!["sql", "pdf"]);
        let sql: Vec<usize> = groups.iter().map(|(_, urls)| urls.len()).collect();
        assert_eq!(sql, vec![2, 1]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_urls_without_extension_are_unclassified() {
        let groups = group_by_extension(vec!["http://a.com/x.pdf", "http://a.com/nothing"]);
        assert_eq!(groups.url_count(), 1);
        assert_eq!(groups.unclassified(), &["http://a.com/nothing".to_string()]);
    }
}
