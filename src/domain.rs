/// Hostname normalization for activity records
use url::Url;

use crate::error::{Error, Result};

/// Reduce a tab URL to the hostname recorded in an activity record.
///
/// Algorithm:
/// 1. Parse the URL (this is what rejects `"Unknown"` and other junk)
/// 2. Take the host as written in the input, so its case survives
/// 3. Drop a single leading `www.` label
///
/// URLs without a host (`about:blank`, `file:///...`) give an empty hostname.
///
/// Examples:
/// - https://www.Example.com/path → Example.com
/// - http://sub.example.org → sub.example.org
/// - http://localhost:3000/ → localhost
pub fn normalize_hostname(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|source| Error::UrlParse {
        url: url.to_string(),
        source,
    })?;

    let parsed_host = match parsed.host_str() {
        Some(host) if !host.is_empty() => host,
        _ => return Ok(String::new()),
    };

    // The parser lowercases hosts; prefer the raw spelling when it is the same name.
    let hostname = match raw_hostname(url) {
        Some(raw) if raw.eq_ignore_ascii_case(parsed_host) => raw,
        _ => parsed_host,
    };

    Ok(strip_www(hostname).to_string())
}

/// Remove one leading `www.` label, keeping a bare `www.` host intact.
fn strip_www(hostname: &str) -> &str {
    match hostname.strip_prefix("www.") {
        Some(rest) if !rest.is_empty() => rest,
        _ => hostname,
    }
}

/// Hostname substring exactly as it appears in the input
fn raw_hostname(url: &str) -> Option<&str> {
    let (_, rest) = url.trim().split_once("://")?;

    // Authority ends at the first path, query or fragment delimiter
    let authority = rest
        .split(|c: char| matches!(c, '/' | '?' | '#' | '\\'))
        .next()?;

    // Drop credentials
    let host_port = authority.rsplit('@').next()?;

    let host = if host_port.starts_with('[') {
        // IPv6 literal keeps its brackets, like the parsed form does
        let end = host_port.find(']')?;
        &host_port[..=end]
    } else {
        host_port.split(':').next()?
    };

    if host.is_empty() { None } else { Some(host) }
}
