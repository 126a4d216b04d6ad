use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use platform_api::CollectionConfig;
use products_hr::EMPLOYEES_COLLECTION;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:5000";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub base_url: Url,
    pub collection: String,
    pub timeout: Option<Duration>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raw_url = lookup("ROSTER_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        let base_url = Url::parse(raw_url.trim())
            .with_context(|| format!("invalid ROSTER_API_URL {raw_url:?}"))?;

        let collection = lookup("ROSTER_COLLECTION")
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or_else(|| EMPLOYEES_COLLECTION.into());

        let timeout = match lookup("ROSTER_HTTP_TIMEOUT_SECS") {
            Some(raw) if !raw.trim().is_empty() => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid ROSTER_HTTP_TIMEOUT_SECS {raw:?}"))?;
                if secs == 0 {
                    return Err(anyhow!("ROSTER_HTTP_TIMEOUT_SECS must be positive"));
                }
                Some(Duration::from_secs(secs))
            }
            _ => None,
        };

        Ok(Self {
            base_url,
            collection,
            timeout,
        })
    }

    pub fn with_base_url(mut self, base_url: Option<Url>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        self
    }

    pub fn collection_config(&self) -> CollectionConfig {
        CollectionConfig::new(self.base_url.clone(), self.collection.clone())
            .with_timeout(self.timeout)
    }
}
