use crate::extractor::DEFAULT_MAX_SCAN_CHARS;
use crate::sender::ApprovedSenders;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// User-managed redemption domains, added to the built-in trusted set.
    #[serde(default)]
    pub trusted_domains: Vec<String>,
    #[serde(default)]
    pub approved_senders: ApprovedSenders,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    pub logging: Option<LoggingConfig>,
    pub store: Option<StoreConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_max_scan_chars")]
    pub max_scan_chars: usize,
}

fn default_max_scan_chars() -> usize {
    DEFAULT_MAX_SCAN_CHARS
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_scan_chars: default_max_scan_chars(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON-lines file receiving approved and pending vouchers.
    pub path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trusted_domains: Vec::new(),
            approved_senders: ApprovedSenders::default(),
            extraction: ExtractionConfig::default(),
            logging: Some(LoggingConfig {
                level: "info".to_string(),
            }),
            store: Some(StoreConfig {
                path: "vouchers.jsonl".to_string(),
            }),
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

impl Config {
    /// Load from TOML, or YAML when the file ends in `.yaml`/`.yml`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = if is_yaml(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML in {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Invalid TOML in {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            toml::to_string_pretty(self)?
        };
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.extraction.max_scan_chars == 0 {
            bail!("extraction.max_scan_chars must be greater than zero");
        }

        for phone in &self.approved_senders.phones {
            if crate::phone::normalize(phone).is_empty() {
                bail!("Approved sender phone '{phone}' contains no digits");
            }
        }

        for domain in &self.trusted_domains {
            if domain.trim().is_empty() || domain.trim().contains(char::is_whitespace) {
                bail!("Invalid trusted domain '{domain}'");
            }
        }

        Ok(())
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.logging
            .as_ref()
            .and_then(|logging| logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info)
    }
}
