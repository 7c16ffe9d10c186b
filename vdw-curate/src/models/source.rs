//! Source repository descriptors

use serde::{Deserialize, Serialize};

/// One origin of candidate assets
///
/// Configured once at process start and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Remote address (e.g. `https://github.com/owner/repo`)
    pub url: String,
    /// Branch or ref to fetch
    pub branch: String,
    /// Display name in `owner/repo` form; also the CDN path prefix
    pub name: String,
    /// Subdirectory fetched instead of the whole tree during narrow runs
    #[serde(default)]
    pub narrow_path: Option<String>,
}

impl SourceDescriptor {
    pub fn new(url: impl Into<String>, branch: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            branch: branch.into(),
            name: name.into(),
            narrow_path: None,
        }
    }

    pub fn with_narrow_path(mut self, path: impl Into<String>) -> Self {
        self.narrow_path = Some(path.into());
        self
    }

    /// Directory name used for this source inside the scratch area
    pub fn scratch_name(&self) -> String {
        self.name.replace('/', "_")
    }

    /// Subpath to restrict the fetch to, if narrow fetching applies
    pub fn narrow_target(&self, narrow: bool) -> Option<&str> {
        if !narrow {
            return None;
        }
        self.narrow_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// Built-in wallpaper sources, processed in this order
pub fn default_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor::new("https://github.com/dharmx/walls", "main", "dharmx/walls")
            .with_narrow_path("animated"),
        SourceDescriptor::new(
            "https://github.com/D3Ext/aesthetic-wallpapers",
            "main",
            "D3Ext/aesthetic-wallpapers",
        )
        .with_narrow_path("images/anime"),
        SourceDescriptor::new("https://github.com/makccr/wallpapers", "master", "makccr/wallpapers")
            .with_narrow_path("Abstract"),
        SourceDescriptor::new(
            "https://github.com/michaelScopic/Wallpapers",
            "main",
            "michaelScopic/Wallpapers",
        )
        .with_narrow_path("Minimal"),
        SourceDescriptor::new("https://github.com/fr0st-iwnl/wallz", "main", "fr0st-iwnl/wallz")
            .with_narrow_path("gruvbox"),
        SourceDescriptor::new(
            "https://github.com/linuxdotexe/nordic-wallpapers",
            "master",
            "linuxdotexe/nordic-wallpapers",
        )
        .with_narrow_path("wallpapers"),
        SourceDescriptor::new(
            "https://github.com/Mvcvalli/mobile-wallpapers",
            "main",
            "Mvcvalli/mobile-wallpapers",
        )
        .with_narrow_path("."),
        SourceDescriptor::new(
            "https://github.com/DenverCoder1/minimalistic-wallpaper-collection",
            "main",
            "DenverCoder1/minimalistic-wallpaper-collection",
        )
        .with_narrow_path("images/minimalistic"),
    ]
}
