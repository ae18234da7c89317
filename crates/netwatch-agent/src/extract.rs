//! Address extraction from discovery output.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})").expect("address pattern is valid")
    })
}

/// Collect the dotted-quad address at the start of each line.
///
/// Leading whitespace is allowed and anything after the address is ignored.
/// Banners, separators and summary lines simply don't match.
pub fn extract_addresses<S: AsRef<str>>(lines: &[S]) -> HashSet<String> {
    let mut found = HashSet::new();
    for line in lines {
        let line = line.as_ref();
        tracing::trace!("Processing line: {line}");
        if let Some(caps) = address_pattern().captures(line) {
            let ip = caps[1].to_string();
            tracing::debug!("Matched ip: {ip}");
            found.insert(ip);
        }
    }
    found
}
