//! Integration configuration.
//!
//! An integration is configured when its credential is present. Everything
//! here is validated once at startup; a bad value is a [`ConfigError`] and
//! never surfaces as a per-call failure later.

use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::customerio::CustomerIo;
use crate::dealfront::Dealfront;
use crate::error::ConfigError;
use crate::google_analytics::GoogleAnalytics;
use crate::http::{StaticToken, TokenSource};
use crate::instantly::Instantly;
use crate::{Integration, IntegrationId};

pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Turn an optional raw credential into a secret. Present-but-empty is an
/// error rather than "not configured".
pub fn credential(
    setting: &'static str,
    value: Option<String>,
) -> Result<Option<SecretString>, ConfigError> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Err(ConfigError::EmptyCredential(setting)),
        Some(v) => Ok(Some(SecretString::from(v))),
    }
}

fn check_base_url(setting: &'static str, url: &str) -> Result<(), ConfigError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidSetting {
        setting,
        reason: format!("'{url}' is not a valid URL: {e}"),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidSetting {
            setting,
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-integration settings
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct DealfrontConfig {
    pub api_token: SecretString,
    pub ip_enrich_key: Option<SecretString>,
    pub leadfeeder_url: String,
    pub ip_enrich_url: String,
}

impl DealfrontConfig {
    pub const LEADFEEDER_URL: &'static str = "https://api.leadfeeder.com";
    pub const IP_ENRICH_URL: &'static str = "https://api.lf-discover.com";

    pub fn new(api_token: SecretString) -> Self {
        Self {
            api_token,
            ip_enrich_key: None,
            leadfeeder_url: Self::LEADFEEDER_URL.into(),
            ip_enrich_url: Self::IP_ENRICH_URL.into(),
        }
    }

    pub fn with_ip_enrich_key(mut self, key: Option<SecretString>) -> Self {
        self.ip_enrich_key = key;
        self
    }

    pub fn with_base_urls(mut self, leadfeeder: impl Into<String>, ip_enrich: impl Into<String>) -> Self {
        self.leadfeeder_url = leadfeeder.into();
        self.ip_enrich_url = ip_enrich.into();
        self
    }

    pub(crate) fn auth_header(&self) -> String {
        format!("Token token={}", self.api_token.expose_secret())
    }
}

pub struct GoogleAnalyticsConfig {
    pub token_source: Arc<dyn TokenSource>,
    pub data_url: String,
    pub admin_url: String,
}

impl GoogleAnalyticsConfig {
    pub const DATA_URL: &'static str = "https://analyticsdata.googleapis.com";
    pub const ADMIN_URL: &'static str = "https://analyticsadmin.googleapis.com";

    pub fn new(token_source: Arc<dyn TokenSource>) -> Self {
        Self {
            token_source,
            data_url: Self::DATA_URL.into(),
            admin_url: Self::ADMIN_URL.into(),
        }
    }

    /// Use a pre-issued access token for every request.
    pub fn from_access_token(token: SecretString) -> Self {
        Self::new(Arc::new(StaticToken::new(token)))
    }

    pub fn with_base_urls(mut self, data: impl Into<String>, admin: impl Into<String>) -> Self {
        self.data_url = data.into();
        self.admin_url = admin.into();
        self
    }
}

impl std::fmt::Debug for GoogleAnalyticsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleAnalyticsConfig")
            .field("data_url", &self.data_url)
            .field("admin_url", &self.admin_url)
            .finish_non_exhaustive()
    }
}

/// Customer.io data-center region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Region {
    #[default]
    Us,
    Eu,
}

impl Region {
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Us => "https://api.customer.io/v1",
            Self::Eu => "https://api-eu.customer.io/v1",
        }
    }
}

impl FromStr for Region {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "us" => Ok(Self::Us),
            "eu" => Ok(Self::Eu),
            other => Err(ConfigError::InvalidSetting {
                setting: "CUSTOMERIO_REGION",
                reason: format!("expected 'us' or 'eu', got '{other}'"),
            }),
        }
    }
}

#[derive(Debug)]
pub struct CustomerIoConfig {
    pub api_key: SecretString,
    pub region: Region,
    pub base_url: String,
}

impl CustomerIoConfig {
    pub fn new(api_key: SecretString, region: Region) -> Self {
        Self {
            api_key,
            region,
            base_url: region.base_url().into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Debug)]
pub struct InstantlyConfig {
    pub api_key: SecretString,
    pub base_url: String,
}

impl InstantlyConfig {
    pub const BASE_URL: &'static str = "https://api.instantly.ai/api/v2";

    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            base_url: Self::BASE_URL.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

pub(crate) fn bearer(secret: &SecretString) -> String {
    format!("Bearer {}", secret.expose_secret())
}

// ─────────────────────────────────────────────────────────────────────────────
// All integrations
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration of every integration. `None` means not configured.
#[derive(Debug)]
pub struct IntegrationsConfig {
    pub dealfront: Option<DealfrontConfig>,
    pub google_analytics: Option<GoogleAnalyticsConfig>,
    pub customerio: Option<CustomerIoConfig>,
    pub instantly: Option<InstantlyConfig>,
    pub backend_timeout: Duration,
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            dealfront: None,
            google_analytics: None,
            customerio: None,
            instantly: None,
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
        }
    }
}

impl IntegrationsConfig {
    pub fn is_configured(&self, id: IntegrationId) -> bool {
        match id {
            IntegrationId::Dealfront => self.dealfront.is_some(),
            IntegrationId::GoogleAnalytics => self.google_analytics.is_some(),
            IntegrationId::CustomerIo => self.customerio.is_some(),
            IntegrationId::Instantly => self.instantly.is_some(),
        }
    }

    pub fn configured(&self) -> BTreeSet<IntegrationId> {
        IntegrationId::ALL
            .into_iter()
            .filter(|id| self.is_configured(*id))
            .collect()
    }

    /// Check base URLs without building any client.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(c) = &self.dealfront {
            check_base_url("dealfront base URL", &c.leadfeeder_url)?;
            check_base_url("dealfront IP Enrich base URL", &c.ip_enrich_url)?;
        }
        if let Some(c) = &self.google_analytics {
            check_base_url("google-analytics data URL", &c.data_url)?;
            check_base_url("google-analytics admin URL", &c.admin_url)?;
        }
        if let Some(c) = &self.customerio {
            check_base_url("customerio base URL", &c.base_url)?;
        }
        if let Some(c) = &self.instantly {
            check_base_url("instantly base URL", &c.base_url)?;
        }
        Ok(())
    }

    /// Build every configured integration, in [`IntegrationId::ALL`] order.
    pub fn build(&self) -> Result<Vec<Arc<dyn Integration>>, ConfigError> {
        self.validate()?;
        let timeout = self.backend_timeout;
        let mut built: Vec<Arc<dyn Integration>> = Vec::new();

        if let Some(c) = &self.dealfront {
            built.push(Arc::new(Dealfront::new(c, timeout)?));
        }
        if let Some(c) = &self.google_analytics {
            built.push(Arc::new(GoogleAnalytics::new(c, timeout)?));
        }
        if let Some(c) = &self.customerio {
            built.push(Arc::new(CustomerIo::new(c, timeout)?));
        }
        if let Some(c) = &self.instantly {
            built.push(Arc::new(Instantly::new(c, timeout)?));
        }

        for integration in &built {
            info!(
                "Integration enabled: {} ({} tools)",
                integration.id().display_name(),
                integration.operations().len()
            );
        }
        Ok(built)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn empty_credential_is_an_error() {
        assert!(credential("X", None).unwrap().is_none());
        assert!(credential("X", Some("abc".into())).unwrap().is_some());
        assert!(matches!(
            credential("INSTANTLY_API_KEY", Some("  ".into())),
            Err(ConfigError::EmptyCredential("INSTANTLY_API_KEY"))
        ));
    }

    #[test]
    fn region_parsing() {
        assert_eq!("us".parse::<Region>().unwrap(), Region::Us);
        assert_eq!("EU".parse::<Region>().unwrap(), Region::Eu);
        assert_eq!("".parse::<Region>().unwrap(), Region::Us);
        assert!("apac".parse::<Region>().is_err());
        assert_eq!(Region::Eu.base_url(), "https://api-eu.customer.io/v1");
    }

    #[test]
    fn configured_set_follows_credentials() {
        let config = IntegrationsConfig {
            customerio: Some(CustomerIoConfig::new(secret("k"), Region::Us)),
            instantly: Some(InstantlyConfig::new(secret("k"))),
            ..Default::default()
        };
        let configured: Vec<_> = config.configured().into_iter().collect();
        assert_eq!(configured, [IntegrationId::CustomerIo, IntegrationId::Instantly]);
        assert!(!config.is_configured(IntegrationId::Dealfront));
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let config = IntegrationsConfig {
            instantly: Some(InstantlyConfig::new(secret("k")).with_base_url("not a url")),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSetting { .. })));

        let config = IntegrationsConfig {
            instantly: Some(InstantlyConfig::new(secret("k")).with_base_url("ftp://x")),
            ..Default::default()
        };
        assert!(config.build().is_err());
    }

    #[test]
    fn build_creates_configured_integrations_in_order() {
        let config = IntegrationsConfig {
            instantly: Some(InstantlyConfig::new(secret("k"))),
            dealfront: Some(DealfrontConfig::new(secret("t"))),
            ..Default::default()
        };
        let built = config.build().unwrap();
        let ids: Vec<_> = built.iter().map(|i| i.id()).collect();
        assert_eq!(ids, [IntegrationId::Dealfront, IntegrationId::Instantly]);
        assert!(built.iter().all(|i| !i.operations().is_empty()));
    }

    #[test]
    fn dealfront_uses_token_scheme() {
        assert_eq!(DealfrontConfig::new(secret("abc")).auth_header(), "Token token=abc");
        assert_eq!(bearer(&secret("xyz")), "Bearer xyz");
    }
}
