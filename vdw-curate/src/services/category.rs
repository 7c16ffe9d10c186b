//! Category detection from path keywords and source name

/// Keyword table, checked in order; the first matching keyword wins
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "nature",
        &["nature", "landscape", "forest", "mountain", "ocean", "sunset", "sunrise", "sky"],
    ),
    ("minimal", &["minimal", "minimalist", "simple", "clean"]),
    ("dark", &["dark", "black", "night", "moody"]),
    ("abstract", &["abstract", "geometric", "pattern", "art"]),
    ("anime", &["anime", "manga", "waifu", "character"]),
    ("gruvbox", &["gruvbox"]),
    ("nord", &["nord", "nordic"]),
    ("city", &["city", "urban", "building", "street"]),
    ("space", &["space", "planet", "galaxy", "star", "nebula"]),
    ("gradient", &["gradient", "color"]),
    ("gaming", &["game", "gaming", "cyberpunk"]),
];

/// Source-name substrings used when the path has no keyword
const SOURCE_FALLBACKS: &[(&str, &str)] = &[
    ("minimal", "minimal"),
    ("nordic", "nord"),
    ("aesthetic", "aesthetic"),
];

pub const DEFAULT_CATEGORY: &str = "other";

/// Detect the category of an asset
///
/// Substring match over the lowercased relative path, then the source-name
/// fallbacks, then [`DEFAULT_CATEGORY`].
pub fn detect_category(relative_path: &str, source_name: &str) -> &'static str {
    let path = relative_path.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|k| path.contains(k)) {
            return *category;
        }
    }

    let source = source_name.to_lowercase();
    SOURCE_FALLBACKS
        .iter()
        .find(|(needle, _)| source.contains(needle))
        .map(|(_, category)| *category)
        .unwrap_or(DEFAULT_CATEGORY)
}
