use crate::core::listing_form::DEFAULT_MAX_IMAGES;
use crate::domain::model::SortKey;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    pub marketplace: MarketplaceConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    pub name: String,
    pub institutional_domain: String,
    pub max_images: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    Rest,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub r#type: BackendKind,
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
    /// JSON dataset for the memory backend; seeded demo data when absent.
    pub data_file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub default_sort: Option<SortKey>,
    /// Hide sold and deleted listings from browse and seller views.
    pub active_only: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: Option<String>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            marketplace: MarketplaceConfig {
                name: "Queen's University Marketplace".to_string(),
                institutional_domain: "queensu.ca".to_string(),
                max_images: None,
            },
            backend: BackendConfig::default(),
            catalog: CatalogConfig::default(),
            logging: None,
        }
    }
}

impl MarketConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MarketError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MARKET_API_KEY})，未設定的保留原字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MarketError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("marketplace.name", &self.marketplace.name)?;
        validation::validate_non_empty_string(
            "marketplace.institutional_domain",
            &self.marketplace.institutional_domain,
        )?;
        if self.marketplace.institutional_domain.contains('@') {
            return Err(MarketError::InvalidConfigValueError {
                field: "marketplace.institutional_domain".to_string(),
                value: self.marketplace.institutional_domain.clone(),
                reason: "Give the bare domain, e.g. queensu.ca".to_string(),
            });
        }
        if let Some(max_images) = self.marketplace.max_images {
            validation::validate_positive_number("marketplace.max_images", max_images, 1)?;
        }

        match self.backend.r#type {
            BackendKind::Rest => {
                let url = validation::validate_required_field("backend.url", &self.backend.url)?;
                validation::validate_url("backend.url", url)?;
                let key =
                    validation::validate_required_field("backend.api_key", &self.backend.api_key)?;
                if key.starts_with("${") {
                    return Err(MarketError::MissingConfigError {
                        field: format!("backend.api_key (environment variable {})", key),
                    });
                }
            }
            BackendKind::Memory => {
                if let Some(path) = &self.backend.data_file {
                    validation::validate_path("backend.data_file", path)?;
                }
            }
        }

        if let Some(format) = self.logging.as_ref().and_then(|l| l.format.as_deref()) {
            if !["compact", "json"].contains(&format) {
                return Err(MarketError::InvalidConfigValueError {
                    field: "logging.format".to_string(),
                    value: format.to_string(),
                    reason: "Valid formats: compact, json".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .map(|f| f == "json")
            .unwrap_or(false)
    }
}

impl ConfigProvider for MarketConfig {
    fn institutional_domain(&self) -> &str {
        &self.marketplace.institutional_domain
    }

    fn max_images(&self) -> usize {
        self.marketplace.max_images.unwrap_or(DEFAULT_MAX_IMAGES)
    }

    fn default_sort(&self) -> SortKey {
        self.catalog.default_sort.unwrap_or_default()
    }

    fn active_only(&self) -> bool {
        self.catalog.active_only.unwrap_or(false)
    }
}

impl Validate for MarketConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
