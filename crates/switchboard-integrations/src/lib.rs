//! Switchboard integrations
//!
//! Each integration is an authenticated REST client plus a static table of
//! tools. The tables are data: a descriptor (name, description, input
//! schema) and the endpoint it maps to. An integration that is configured
//! turns its table into [`Operation`]s the server can dispatch to.

pub mod config;
pub mod customerio;
pub mod dealfront;
pub mod endpoint;
pub mod error;
pub mod google_analytics;
pub mod handler;
pub mod http;
pub mod instantly;

use std::fmt;

use switchboard_protocol::ToolDescriptor;

pub use config::{
    CustomerIoConfig, DealfrontConfig, GoogleAnalyticsConfig, InstantlyConfig,
    IntegrationsConfig, Region,
};
pub use endpoint::{Endpoint, Payload, RestOperation};
pub use error::{ConfigError, ToolError, ToolResult};
pub use handler::{DynToolHandler, Operation, ToolHandler, Unavailable};
pub use http::{RestClient, StaticToken, TokenSource, Verb};

/// Identifier of a backend integration. Its token is what appears in scope
/// paths (`/{token}/mcp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntegrationId {
    Dealfront,
    GoogleAnalytics,
    CustomerIo,
    Instantly,
}

impl IntegrationId {
    /// All integrations, in the order their tools are listed.
    pub const ALL: [IntegrationId; 4] = [
        Self::Dealfront,
        Self::GoogleAnalytics,
        Self::CustomerIo,
        Self::Instantly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dealfront => "dealfront",
            Self::GoogleAnalytics => "google-analytics",
            Self::CustomerIo => "customerio",
            Self::Instantly => "instantly",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == token)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Dealfront => "Dealfront",
            Self::GoogleAnalytics => "Google Analytics",
            Self::CustomerIo => "Customer.io",
            Self::Instantly => "Instantly",
        }
    }

    /// The full static tool table of this integration, configured or not.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        match self {
            Self::Dealfront => dealfront::descriptors(),
            Self::GoogleAnalytics => google_analytics::descriptors(),
            Self::CustomerIo => customerio::descriptors(),
            Self::Instantly => instantly::descriptors(),
        }
    }

    /// Read-only subset exposed by the `<token>-lite` scope.
    pub fn lite_tools(&self) -> &'static [&'static str] {
        match self {
            Self::Dealfront => dealfront::LITE_TOOLS,
            Self::GoogleAnalytics => google_analytics::LITE_TOOLS,
            Self::CustomerIo => customerio::LITE_TOOLS,
            Self::Instantly => instantly::LITE_TOOLS,
        }
    }
}

impl fmt::Display for IntegrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured backend integration.
pub trait Integration: Send + Sync {
    fn id(&self) -> IntegrationId;

    /// Every operation of the integration, in table order.
    fn operations(&self) -> &[Operation];
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tokens_roundtrip() {
        for id in IntegrationId::ALL {
            assert_eq!(IntegrationId::from_token(id.as_str()), Some(id));
        }
        assert_eq!(IntegrationId::from_token("frontapp"), None);
        assert_eq!(IntegrationId::from_token("dealfront-lite"), None);
    }

    #[test]
    fn tool_names_are_unique_across_integrations() {
        let mut seen = HashSet::new();
        for id in IntegrationId::ALL {
            for tool in id.descriptors() {
                assert!(seen.insert(tool.name.clone()), "duplicate {}", tool.name);
            }
        }
    }

    #[test]
    fn lite_sets_are_subsets_of_full_tables() {
        for id in IntegrationId::ALL {
            let names: HashSet<String> = id.descriptors().into_iter().map(|d| d.name).collect();
            for tool in id.lite_tools() {
                assert!(names.contains(*tool), "{id}: {tool} not in table");
            }
            assert!(id.lite_tools().len() < names.len());
        }
    }

    #[test]
    fn lite_sets_hold_no_mutating_tools() {
        const MUTATING: [&str; 11] = [
            "create", "update", "delete", "activate", "pause", "move", "enable", "disable",
            "verify", "reply", "add",
        ];
        for id in IntegrationId::ALL {
            for tool in id.lite_tools() {
                assert!(
                    !MUTATING.iter().any(|verb| tool.split('_').any(|part| part == *verb)),
                    "{tool} mutates"
                );
            }
        }
    }
}
