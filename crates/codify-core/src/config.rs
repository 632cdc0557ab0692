/// Used when no base URL is configured.
pub const DEFAULT_API_URL: &str = "https://safenet-vz39.onrender.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
}

impl Config {
    /// Resolve from an explicit value (e.g. a CLI flag), falling back to the
    /// built-in default. Blank values count as unset.
    pub fn resolve(api_url: Option<String>) -> Self {
        let api_url = api_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self { api_url }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(None)
    }
}
