//! Google Analytics 4 integration (Data API and Admin API).
//!
//! Both clients ask the configured [`TokenSource`](crate::TokenSource) for a
//! bearer token on every request.

use std::sync::Arc;
use std::time::Duration;

use switchboard_protocol::{FieldType as T, ToolDescriptor};

use crate::config::GoogleAnalyticsConfig;
use crate::endpoint::Endpoint;
use crate::error::ConfigError;
use crate::handler::Operation;
use crate::http::RestClient;
use crate::{Integration, IntegrationId};

pub const LITE_TOOLS: &[&str] = &["ga_get_account_summaries", "ga_run_report", "ga_get_metadata"];

const PROPERTY_ID: &str = "The GA4 property ID (numeric string, e.g. '123456789').";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Api {
    Data,
    Admin,
}

fn table() -> Vec<(ToolDescriptor, Api, Endpoint)> {
    vec![
        // Account & property
        (
            ToolDescriptor::new(
                "ga_get_account_summaries",
                "List all Google Analytics account summaries accessible by the service account. Returns \
                 account IDs, names, and their associated properties. Use this first to discover available properties.",
            )
            .optional("pageSize", T::Number, "Maximum number of account summaries to return.")
            .optional("pageToken", T::String, "Page token from a previous response for pagination."),
            Api::Admin,
            Endpoint::get("/v1beta/accountSummaries"),
        ),
        (
            ToolDescriptor::new(
                "ga_get_property_details",
                "Get detailed information about a specific GA4 property, including display name, time zone, \
                 currency, industry category, and creation time.",
            )
            .required("propertyId", T::String, PROPERTY_ID),
            Api::Admin,
            Endpoint::get("/v1beta/properties/{propertyId}").bare(),
        ),
        // Reports
        (
            ToolDescriptor::new(
                "ga_run_report",
                "Run a report on a GA4 property. Common dimensions: date, city, country, deviceCategory, \
                 sessionSource, sessionMedium, pagePath, pageTitle, landingPage, browser, operatingSystem. \
                 Common metrics: sessions, totalUsers, newUsers, activeUsers, screenPageViews, \
                 averageSessionDuration, bounceRate, conversions, eventCount, engagementRate. Date ranges use \
                 YYYY-MM-DD format or relative values like 'today', 'yesterday', '7daysAgo', '30daysAgo'.",
            )
            .required("propertyId", T::String, PROPERTY_ID)
            .required_array("metrics", T::Object, "Metrics to retrieve (e.g. [{name: 'sessions'}]).")
            .required_array(
                "dateRanges",
                T::Object,
                "Date ranges for the report (e.g. [{startDate: '7daysAgo', endDate: 'today'}]).",
            )
            .optional_array("dimensions", T::Object, "Optional dimensions to group by (e.g. [{name: 'date'}]).")
            .optional("dimensionFilter", T::Object, "Optional filter on dimensions.")
            .optional("metricFilter", T::Object, "Optional filter on metrics.")
            .optional_array("orderBys", T::Object, "Optional ordering for the report rows.")
            .optional("limit", T::Number, "Maximum number of rows to return. Default is 10000.")
            .optional("offset", T::Number, "Row offset for pagination.")
            .optional("keepEmptyRows", T::Boolean, "Whether to keep rows with all zero metric values."),
            Api::Data,
            Endpoint::post("/v1beta/properties/{propertyId}:runReport"),
        ),
        (
            ToolDescriptor::new(
                "ga_run_realtime_report",
                "Run a realtime report on a GA4 property. Shows data from the last 30 minutes. Common realtime \
                 metrics: activeUsers, screenPageViews, eventCount, conversions. Common realtime dimensions: \
                 unifiedScreenName, country, city, deviceCategory.",
            )
            .required("propertyId", T::String, PROPERTY_ID)
            .required_array("metrics", T::Object, "Metrics to retrieve (e.g. [{name: 'activeUsers'}]).")
            .optional_array("dimensions", T::Object, "Optional dimensions to group by (e.g. [{name: 'country'}]).")
            .optional("dimensionFilter", T::Object, "Optional filter on dimensions.")
            .optional("metricFilter", T::Object, "Optional filter on metrics.")
            .optional("limit", T::Number, "Maximum number of rows to return."),
            Api::Data,
            Endpoint::post("/v1beta/properties/{propertyId}:runRealtimeReport"),
        ),
        (
            ToolDescriptor::new(
                "ga_get_metadata",
                "Get metadata about the dimensions and metrics available for a GA4 property. Useful for \
                 discovering what fields can be used in reports.",
            )
            .required("propertyId", T::String, PROPERTY_ID),
            Api::Data,
            Endpoint::get("/v1beta/properties/{propertyId}/metadata").bare(),
        ),
        // Google Ads links
        (
            ToolDescriptor::new(
                "ga_list_google_ads_links",
                "List Google Ads links for a GA4 property. Shows which Google Ads accounts are linked.",
            )
            .required("propertyId", T::String, PROPERTY_ID)
            .optional("pageSize", T::Number, "Maximum number of results to return.")
            .optional("pageToken", T::String, "Page token from a previous response for pagination."),
            Api::Admin,
            Endpoint::get("/v1beta/properties/{propertyId}/googleAdsLinks"),
        ),
    ]
}

pub fn descriptors() -> Vec<ToolDescriptor> {
    table().into_iter().map(|(d, _, _)| d).collect()
}

pub struct GoogleAnalytics {
    operations: Vec<Operation>,
}

impl GoogleAnalytics {
    pub fn new(config: &GoogleAnalyticsConfig, timeout: Duration) -> Result<Self, ConfigError> {
        let client = |url: &str| -> Result<Arc<RestClient>, ConfigError> {
            let client = RestClient::new(IntegrationId::GoogleAnalytics, url, &[], timeout)?
                .with_token_source(config.token_source.clone());
            Ok(Arc::new(client))
        };
        let data = client(&config.data_url)?;
        let admin = client(&config.admin_url)?;

        let operations = table()
            .into_iter()
            .map(|(descriptor, api, endpoint)| {
                let client = match api {
                    Api::Data => data.clone(),
                    Api::Admin => admin.clone(),
                };
                Operation::new(descriptor, endpoint.bind(client))
            })
            .collect();

        Ok(Self { operations })
    }
}

impl Integration for GoogleAnalytics {
    fn id(&self) -> IntegrationId {
        IntegrationId::GoogleAnalytics
    }

    fn operations(&self) -> &[Operation] {
        &self.operations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_go_to_the_data_api() {
        for (descriptor, api, endpoint) in table() {
            if descriptor.name.contains("report") || descriptor.name == "ga_get_metadata" {
                assert_eq!(api, Api::Data, "{}", descriptor.name);
            } else {
                assert_eq!(api, Api::Admin, "{}", descriptor.name);
            }
            assert!(endpoint.path.starts_with("/v1beta/"));
        }
    }
}
