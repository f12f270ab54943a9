use std::collections::BTreeMap;

/// Known quality-tier labels, highest point count first.
pub const SPLAT_TIER_PREFERENCE: [&str; 9] = [
    "10m", "5m", "2m", "1m", "500k", "300k", "200k", "100k", "50k",
];

/// A resolved splat variant: the winning tier label and its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplatChoice {
    pub label: String,
    pub url: String,
}

/// Pick the best splat variant from a provider-supplied tier map.
///
/// Empty values are dropped first. A known tier label wins by
/// preference order (case-insensitive). Unknown labels fall back to
/// the largest embedded digits-only magnitude, then to the first
/// remaining entry in map order. Returns `None` when nothing usable
/// is left.
pub fn select_splat_asset(spz_urls: &BTreeMap<String, String>) -> Option<SplatChoice> {
    let entries: Vec<(&str, &str)> = spz_urls
        .iter()
        .filter(|(_, url)| !url.is_empty())
        .map(|(label, url)| (label.as_str(), url.as_str()))
        .collect();
    if entries.is_empty() {
        return None;
    }

    for preferred in SPLAT_TIER_PREFERENCE {
        if let Some(&(label, url)) = entries
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(preferred))
        {
            return Some(SplatChoice {
                label: label.to_string(),
                url: url.to_string(),
            });
        }
    }

    if let Some(&(label, url)) = entries
        .iter()
        .filter(|(label, _)| embedded_magnitude(label).is_some())
        .max_by_key(|(label, _)| embedded_magnitude(label).unwrap_or(0))
    {
        return Some(SplatChoice {
            label: label.to_string(),
            url: url.to_string(),
        });
    }

    let (label, url) = entries[0];
    Some(SplatChoice {
        label: label.to_string(),
        url: url.to_string(),
    })
}

/// Digits-only magnitude embedded in a tier label ("7500000" → 7500000).
fn embedded_magnitude(label: &str) -> Option<u64> {
    let digits: String = label.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.parse::<u64>() {
        Ok(n) if n > 0 => Some(n),
        _ => None,
    }
}
