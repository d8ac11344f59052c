//! Application configuration
//!
//! Loaded through the `config` crate from an optional file followed by
//! `CATALOG_SYNC__SECTION__KEY` environment variables. Every key has a
//! default except `source.base_url`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::raw_records::PriceTypeIds;
use crate::infrastructure::http_client::HttpClientConfig;
use crate::infrastructure::logging::LoggingConfig;
use crate::infrastructure::page_source::SourceConfig;

pub const ENV_PREFIX: &str = "CATALOG_SYNC";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceSettings,
    pub sync: SyncSettings,
    pub catalog: CatalogSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Exchange API root, e.g. `https://host/hs/Exchange`
    pub base_url: String,
    /// Sent verbatim as the `Authorization` header
    pub auth_token: String,
    pub items_pack_size: u32,
    pub pricing_pack_size: u32,
    pub regular_price_type: String,
    pub sale_price_type: String,
    pub timeout_seconds: u64,
    /// 0 disables rate limiting
    pub max_requests_per_second: u32,
    pub user_agent: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth_token: String::new(),
            items_pack_size: 500,
            pricing_pack_size: 100,
            regular_price_type: "605e52e7-e822-11ed-80e4-000c29409daa".to_string(),
            sale_price_type: "f64e3772-4b14-11ee-80eb-000c29409daa".to_string(),
            timeout_seconds: 30,
            max_requests_per_second: 0,
            user_agent: HttpClientConfig::default().user_agent,
        }
    }
}

impl SourceSettings {
    pub fn items_source(&self) -> SourceConfig {
        self.source_config(self.items_pack_size)
    }

    pub fn pricing_source(&self) -> SourceConfig {
        self.source_config(self.pricing_pack_size)
    }

    pub fn price_type_ids(&self) -> PriceTypeIds {
        PriceTypeIds {
            regular: self.regular_price_type.clone(),
            sale: self.sale_price_type.clone(),
        }
    }

    pub fn http_client(&self) -> HttpClientConfig {
        HttpClientConfig {
            user_agent: self.user_agent.clone(),
            timeout_seconds: self.timeout_seconds,
            max_requests_per_second: self.max_requests_per_second,
        }
    }

    fn source_config(&self, pack_size: u32) -> SourceConfig {
        SourceConfig {
            base_url: self.base_url.clone(),
            auth_token: self.auth_token.clone(),
            pack_size,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Pages requested concurrently per batch
    pub batch_size: u32,
    pub price_decimals: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            batch_size: 5,
            price_decimals: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub database_url: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            database_url: "sqlite:catalog.db".to_string(),
        }
    }
}

impl AppConfig {
    /// File (if given) then environment, then validation.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.base_url.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "source.base_url must be set".to_string(),
            });
        }

        url::Url::parse(&self.source.base_url).map_err(|e| ConfigError::Validation {
            message: format!("source.base_url is not a valid URL: {e}"),
        })?;

        if self.sync.batch_size == 0 {
            return Err(ConfigError::Validation {
                message: "sync.batch_size must be greater than 0".to_string(),
            });
        }

        if self.source.items_pack_size == 0 || self.source.pricing_pack_size == 0 {
            return Err(ConfigError::Validation {
                message: "Pack sizes must be greater than 0".to_string(),
            });
        }

        if self.source.regular_price_type == self.source.sale_price_type {
            return Err(ConfigError::Validation {
                message: "Regular and sale price types must differ".to_string(),
            });
        }

        if self.sync.price_decimals > 10 {
            return Err(ConfigError::Validation {
                message: "sync.price_decimals must be at most 10".to_string(),
            });
        }

        Ok(())
    }
}
