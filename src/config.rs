//! Source configuration and named heuristics
//!
//! The text catalog (name → page feed identifier) and the request settings are
//! loaded from an optional TOML file. Every field falls back to the built-in
//! defaults below, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Buffers strictly smaller than this many bytes are treated as "no such page".
///
/// The archive answers requests past the last page with a tiny placeholder
/// document instead of an HTTP error, so size is the end-of-text signal.
pub const EMPTY_PAGE_THRESHOLD: usize = 1000;

/// Upper bound on a single page request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Index of the first output file of a text.
pub const FIRST_OUTPUT_INDEX: u32 = 2;

/// Root directory under which each text gets its own output directory.
pub const DEFAULT_OUTPUT_ROOT: &str = "merged_pdfs";

/// Total attempts per page request, including the first one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Delay before the first retry; doubles for every further attempt.
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;

/// Page feed URL; `{id}` is the feed identifier, `{page}` the 1-based page.
pub const DEFAULT_URL_TEMPLATE: &str =
    "https://beta.hebrewbooks.org/pagefeed/hebrewbooks_org_{id}_{page}.pdf";

pub const DEFAULT_REFERER: &str = "https://beta.hebrewbooks.org/";

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// Built-in catalog of tractate codes and their page feed identifiers.
const DEFAULT_TEXTS: &[(&str, u32)] = &[
    ("AR", 36086),
    ("AZ", 36077),
    ("BB", 36078),
    ("BC", 36081),
    ("BK", 36079),
    ("BM", 36080),
    ("BR", 36083),
    ("BZ", 36082),
    ("CG", 36084),
    ("CL", 36085),
    ("CR", 36090),
    ("ER", 36087),
    ("GT", 36088),
    ("HR", 36089),
    ("KD", 36092),
    ("KT", 36091),
    ("ME", 36095),
    ("MG", 36094),
    ("MK", 36093),
    ("MN", 36096),
    ("ND", 36098),
    ("NI", 36099),
    ("NZ", 36100),
    ("PS", 36101),
    ("RH", 36102),
    ("SB", 36104),
    ("SK", 36108),
    ("SN", 36103),
    ("ST", 36107),
    ("SV", 36106),
    ("TM", 36110),
    ("TN", 36109),
    ("YM", 36112),
    ("YV", 36111),
    ("ZV", 36113),
];

/// Retry settings for page requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

const fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

const fn default_initial_backoff_ms() -> u64 {
    DEFAULT_INITIAL_BACKOFF_MS
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

/// Where pages come from and how they are requested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL template with `{id}` and `{page}` placeholders
    #[serde(default = "default_url_template")]
    pub url_template: String,

    /// Referer header sent with every request
    #[serde(default = "default_referer")]
    pub referer: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub retry: RetryConfig,

    /// Text name → page feed identifier
    #[serde(default = "default_texts")]
    pub texts: BTreeMap<String, u32>,
}

fn default_url_template() -> String {
    DEFAULT_URL_TEMPLATE.to_string()
}

fn default_referer() -> String {
    DEFAULT_REFERER.to_string()
}

const fn default_timeout_secs() -> u64 {
    REQUEST_TIMEOUT.as_secs()
}

fn default_texts() -> BTreeMap<String, u32> {
    DEFAULT_TEXTS
        .iter()
        .map(|&(name, id)| (name.to_string(), id))
        .collect()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url_template: default_url_template(),
            referer: default_referer(),
            timeout_secs: default_timeout_secs(),
            retry: RetryConfig::default(),
            texts: default_texts(),
        }
    }
}

impl SourceConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!("Loaded catalog from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for placeholder in ["{id}", "{page}"] {
            if !self.url_template.contains(placeholder) {
                return Err(Error::Config(format!(
                    "url_template must contain {placeholder}: {}",
                    self.url_template
                )));
            }
        }

        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be at least 1".to_string()));
        }

        if self.retry.max_attempts == 0 {
            return Err(Error::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Look up the page feed identifier for a text name
    pub fn feed_id(&self, name: &str) -> Result<u32> {
        self.texts
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownText {
                name: name.to_string(),
                known: self.texts.keys().cloned().collect(),
            })
    }

    /// Build the download URL for one page of a text
    pub fn page_url(&self, feed_id: u32, page: u32) -> String {
        self.url_template
            .replace("{id}", &feed_id.to_string())
            .replace("{page}", &page.to_string())
    }
}

/// Output directory for a text: `<root>/<name>`
pub fn output_dir_for(root: &Path, name: &str) -> PathBuf {
    root.join(name)
}

/// Output file for an output index: `<dir>/<index>.pdf`
pub fn output_file(dir: &Path, index: u32) -> PathBuf {
    dir.join(format!("{index}.pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_deduplicated() {
        let config = SourceConfig::default();
        assert_eq!(config.texts.len(), 35);
        assert_eq!(config.feed_id("SK").unwrap(), 36108);
        assert_eq!(config.feed_id("MK").unwrap(), 36093);
        assert_eq!(config.feed_id("BR").unwrap(), 36083);
    }

    #[test]
    fn test_cli_example_names_are_cataloged() {
        let config = SourceConfig::default();
        for name in ["BR", "SB", "KT"] {
            assert!(config.feed_id(name).is_ok(), "{name} missing from catalog");
        }
        assert!(config.feed_id("SH").is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = SourceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), REQUEST_TIMEOUT);
        assert_eq!(config.retry.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn test_unknown_text() {
        let config = SourceConfig::default();
        let err = config.feed_id("XX").unwrap_err();
        assert!(matches!(err, Error::UnknownText { .. }));
        assert!(err.to_string().contains("BR"));
    }

    #[test]
    fn test_page_url() {
        let config = SourceConfig::default();
        assert_eq!(
            config.page_url(36083, 7),
            "https://beta.hebrewbooks.org/pagefeed/hebrewbooks_org_36083_7.pdf"
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SourceConfig::from_toml(
            r#"
            timeout_secs = 10

            [texts]
            ALPHA = 1
            BETA = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.url_template, DEFAULT_URL_TEMPLATE);
        assert_eq!(config.retry, RetryConfig::default());
        assert_eq!(config.texts.len(), 2);
        assert_eq!(config.feed_id("BETA").unwrap(), 2);
        assert!(config.feed_id("BR").is_err());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = SourceConfig::from_toml("").unwrap();
        assert_eq!(config, SourceConfig::default());
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let result = SourceConfig::from_toml("[texts]\nSK = 1\nSK = 2\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let missing_page = SourceConfig::from_toml(r#"url_template = "https://x/{id}.pdf""#);
        assert!(missing_page.is_err());

        let missing_id = SourceConfig::from_toml(r#"url_template = "https://x/{page}.pdf""#);
        assert!(missing_id.is_err());

        let zero_timeout = SourceConfig::from_toml("timeout_secs = 0");
        assert!(zero_timeout.is_err());

        let zero_attempts = SourceConfig::from_toml("[retry]\nmax_attempts = 0");
        assert!(zero_attempts.is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let result = SourceConfig::from_file(Path::new("nonexistent-catalog.toml"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_output_paths() {
        let dir = output_dir_for(Path::new(DEFAULT_OUTPUT_ROOT), "BR");
        assert_eq!(dir, Path::new("merged_pdfs/BR"));
        assert_eq!(output_file(&dir, 2), Path::new("merged_pdfs/BR/2.pdf"));
    }
}
