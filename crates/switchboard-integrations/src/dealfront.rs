//! Dealfront (Leadfeeder) integration.
//!
//! Two sub-APIs: the Leadfeeder API for accounts, leads, visits, feeds and
//! exports, and the optional IP Enrich API. `dealfront_enrich_ip` is always
//! listed; without an IP Enrich key it fails at call time.

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use switchboard_protocol::{FieldType as T, ToolDescriptor};

use crate::config::DealfrontConfig;
use crate::endpoint::{Endpoint, Payload};
use crate::error::ConfigError;
use crate::handler::{Operation, Unavailable};
use crate::http::RestClient;
use crate::{Integration, IntegrationId};

pub const LITE_TOOLS: &[&str] = &[
    "dealfront_list_accounts",
    "dealfront_get_account",
    "dealfront_list_leads",
    "dealfront_get_lead",
    "dealfront_list_lead_visits",
    "dealfront_list_visits",
    "dealfront_list_custom_feeds",
    "dealfront_list_custom_feed_leads",
    "dealfront_get_export_status",
    "dealfront_enrich_ip",
];

const IP_ENRICH_UNAVAILABLE: &str =
    "IP Enrich API is not configured. Set DEALFRONT_IP_ENRICH_API_KEY to enable.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Api {
    Leadfeeder,
    IpEnrich,
}

fn paged(tool: ToolDescriptor) -> ToolDescriptor {
    tool.optional("page[number]", T::Number, "Page number for pagination.")
        .optional("page[size]", T::Number, "Number of results per page (max 100).")
}

fn table() -> Vec<(ToolDescriptor, Api, Endpoint)> {
    use Api::*;
    vec![
        // Accounts
        (
            ToolDescriptor::new(
                "dealfront_list_accounts",
                "List all Dealfront (Leadfeeder) accounts accessible with the current API token.",
            ),
            Leadfeeder,
            Endpoint::get("/accounts").bare(),
        ),
        (
            ToolDescriptor::new(
                "dealfront_get_account",
                "Get a specific Dealfront (Leadfeeder) account by its ID.",
            )
            .required("account_id", T::String, "The ID of the account."),
            Leadfeeder,
            Endpoint::get("/accounts/{account_id}").bare(),
        ),
        // Leads
        (
            paged(
                ToolDescriptor::new(
                    "dealfront_list_leads",
                    "List identified company leads from Dealfront (Leadfeeder) for a given account. \
                     Returns companies that visited your website with quality scores, industry, and visit data.",
                )
                .required("account_id", T::String, "The ID of the account to list leads for.")
                .optional(
                    "start_date",
                    T::String,
                    "Start date for filtering leads (YYYY-MM-DD). Defaults to 7 days ago.",
                )
                .optional(
                    "end_date",
                    T::String,
                    "End date for filtering leads (YYYY-MM-DD). Defaults to today.",
                ),
            ),
            Leadfeeder,
            Endpoint::get("/accounts/{account_id}/leads"),
        ),
        (
            ToolDescriptor::new(
                "dealfront_get_lead",
                "Get a specific lead by ID from Dealfront (Leadfeeder), including full company details, \
                 quality score, visit count, and CRM linkage.",
            )
            .required("account_id", T::String, "The ID of the account.")
            .required("lead_id", T::String, "The ID of the lead."),
            Leadfeeder,
            Endpoint::get("/accounts/{account_id}/leads/{lead_id}").bare(),
        ),
        // Visits
        (
            paged(
                ToolDescriptor::new(
                    "dealfront_list_lead_visits",
                    "Get visit details for a specific lead, including pages viewed, referral sources, \
                     visit duration, and timestamps.",
                )
                .required("account_id", T::String, "The ID of the account.")
                .required("lead_id", T::String, "The ID of the lead."),
            ),
            Leadfeeder,
            Endpoint::get("/accounts/{account_id}/leads/{lead_id}/visits"),
        ),
        (
            paged(
                ToolDescriptor::new(
                    "dealfront_list_visits",
                    "List all visits across an account for a date range. Returns visit-level detail \
                     including pages, referrals, and associated leads.",
                )
                .required("account_id", T::String, "The ID of the account.")
                .optional("start_date", T::String, "Start date for filtering visits (YYYY-MM-DD).")
                .optional("end_date", T::String, "End date for filtering visits (YYYY-MM-DD)."),
            ),
            Leadfeeder,
            Endpoint::get("/accounts/{account_id}/visits"),
        ),
        // Custom feeds
        (
            ToolDescriptor::new(
                "dealfront_list_custom_feeds",
                "List custom feeds (filtered lead segments) configured in the Dealfront web app for a given account.",
            )
            .required("account_id", T::String, "The ID of the account."),
            Leadfeeder,
            Endpoint::get("/accounts/{account_id}/custom-feeds").bare(),
        ),
        (
            paged(
                ToolDescriptor::new(
                    "dealfront_list_custom_feed_leads",
                    "Get leads from a specific custom feed. Custom feeds are pre-configured filtered \
                     segments in the Dealfront web app.",
                )
                .required("account_id", T::String, "The ID of the account.")
                .required("feed_id", T::String, "The ID of the custom feed.")
                .optional("start_date", T::String, "Start date for filtering (YYYY-MM-DD).")
                .optional("end_date", T::String, "End date for filtering (YYYY-MM-DD)."),
            ),
            Leadfeeder,
            Endpoint::get("/accounts/{account_id}/custom-feeds/{feed_id}/leads"),
        ),
        // Exports
        (
            ToolDescriptor::new(
                "dealfront_create_export",
                "Request an async export of lead data from Dealfront. Returns an export request ID to poll for completion.",
            )
            .required("account_id", T::String, "The ID of the account to export leads from.")
            .required("start_date", T::String, "Start date for the export (YYYY-MM-DD).")
            .required("end_date", T::String, "End date for the export (YYYY-MM-DD)."),
            Leadfeeder,
            Endpoint::post("/export-requests").with(Payload::JsonApi("export-requests")),
        ),
        (
            ToolDescriptor::new(
                "dealfront_get_export_status",
                "Check the status of a Dealfront export request. Returns \"pending\", \"processed\", \
                 or \"failed\", and a download URL when ready.",
            )
            .required("export_id", T::String, "The ID of the export request."),
            Leadfeeder,
            Endpoint::get("/export-requests/{export_id}").bare(),
        ),
        // IP Enrich
        (
            ToolDescriptor::new(
                "dealfront_enrich_ip",
                "Resolve an IP address to company firmographic data using the Dealfront IP Enrich API. \
                 Returns company name, industry, employee count, revenue, and location.",
            )
            .required("ip", T::String, "The IP address to resolve (e.g. 203.0.113.50)."),
            IpEnrich,
            Endpoint::get("/companies"),
        ),
    ]
}

pub fn descriptors() -> Vec<ToolDescriptor> {
    table().into_iter().map(|(d, _, _)| d).collect()
}

pub struct Dealfront {
    operations: Vec<Operation>,
}

impl Dealfront {
    pub fn new(config: &DealfrontConfig, timeout: Duration) -> Result<Self, ConfigError> {
        let leadfeeder = Arc::new(RestClient::new(
            IntegrationId::Dealfront,
            &config.leadfeeder_url,
            &[("authorization", config.auth_header())],
            timeout,
        )?);

        let ip_enrich = match &config.ip_enrich_key {
            Some(key) => Some(Arc::new(RestClient::new(
                IntegrationId::Dealfront,
                &config.ip_enrich_url,
                &[("x-api-key", key.expose_secret().to_string())],
                timeout,
            )?)),
            None => None,
        };

        let operations = table()
            .into_iter()
            .map(|(descriptor, api, endpoint)| match api {
                Api::Leadfeeder => Operation::new(descriptor, endpoint.bind(leadfeeder.clone())),
                Api::IpEnrich => match &ip_enrich {
                    Some(client) => Operation::new(descriptor, endpoint.bind(client.clone())),
                    None => Operation::new(
                        descriptor,
                        Unavailable {
                            reason: IP_ENRICH_UNAVAILABLE,
                        },
                    ),
                },
            })
            .collect();

        Ok(Self { operations })
    }
}

impl Integration for Dealfront {
    fn id(&self) -> IntegrationId {
        IntegrationId::Dealfront
    }

    fn operations(&self) -> &[Operation] {
        &self.operations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_placeholder_is_a_required_field() {
        for (descriptor, _, endpoint) in table() {
            for name in endpoint.placeholders() {
                assert!(
                    descriptor.input_schema.is_required(name),
                    "{}: placeholder {name} is not required",
                    descriptor.name
                );
            }
        }
    }

    #[test]
    fn only_enrich_ip_uses_the_second_api() {
        let second: Vec<_> = table()
            .into_iter()
            .filter(|(_, api, _)| *api == Api::IpEnrich)
            .map(|(d, _, _)| d.name)
            .collect();
        assert_eq!(second, ["dealfront_enrich_ip"]);
    }
}
