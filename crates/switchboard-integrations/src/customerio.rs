//! Customer.io App API integration.

use std::sync::Arc;
use std::time::Duration;

use switchboard_protocol::{FieldType as T, ToolDescriptor};

use crate::config::{CustomerIoConfig, bearer};
use crate::endpoint::Endpoint;
use crate::error::ConfigError;
use crate::handler::Operation;
use crate::http::RestClient;
use crate::{Integration, IntegrationId};

pub const LITE_TOOLS: &[&str] = &[
    "cio_search_customers",
    "cio_get_customer_attributes",
    "cio_get_customer_segments",
    "cio_list_segments",
    "cio_get_segment",
    "cio_get_segment_membership",
    "cio_list_campaigns",
    "cio_get_campaign",
    "cio_get_campaign_metrics",
    "cio_list_newsletters",
    "cio_get_newsletter_metrics",
    "cio_list_activities",
];

const CUSTOMER_ID: &str = "The customer ID or email address.";
const CURSOR: &str = "Cursor for pagination.";
const LIMIT: &str = "Number of results to return per page.";
const PERIOD: &str = "Time period for metrics (e.g. 'days', 'weeks', 'months').";

fn by_id(name: &str, description: &str, id: &str) -> ToolDescriptor {
    ToolDescriptor::new(name, description).required("id", T::Number, id)
}

fn paged(tool: ToolDescriptor) -> ToolDescriptor {
    tool.optional("start", T::String, CURSOR).optional("limit", T::Number, LIMIT)
}

fn table() -> Vec<(ToolDescriptor, Endpoint)> {
    vec![
        // Customers
        (
            ToolDescriptor::new(
                "cio_search_customers",
                "Search and filter customers in Customer.io by attributes. Use filter conditions to find \
                 customers matching specific criteria.",
            )
            .optional(
                "filter",
                T::Object,
                "Filter object defining search criteria (e.g. {and: [{attribute: {field: 'email', \
                 operator: 'eq', value: 'test@example.com'}}]}).",
            )
            .optional(
                "start",
                T::String,
                "Cursor for pagination. Use the value from the 'next' field in a previous response.",
            )
            .optional("limit", T::Number, LIMIT),
            Endpoint::post("/customers"),
        ),
        (
            ToolDescriptor::new(
                "cio_get_customer_attributes",
                "Get all attributes for a specific customer in Customer.io by their ID or email.",
            )
            .required("id", T::String, CUSTOMER_ID),
            Endpoint::get("/customers/{id}/attributes").bare(),
        ),
        (
            ToolDescriptor::new(
                "cio_get_customer_segments",
                "Get the segments that a specific customer belongs to in Customer.io.",
            )
            .required("id", T::String, CUSTOMER_ID),
            Endpoint::get("/customers/{id}/segments").bare(),
        ),
        (
            paged(
                ToolDescriptor::new(
                    "cio_get_customer_messages",
                    "Get messages that have been sent to a specific customer in Customer.io.",
                )
                .required("id", T::String, CUSTOMER_ID),
            ),
            Endpoint::get("/customers/{id}/messages"),
        ),
        (
            paged(
                ToolDescriptor::new(
                    "cio_get_customer_activities",
                    "Get the activity log for a specific customer in Customer.io, including events, page \
                     views, and attribute changes.",
                )
                .required("id", T::String, CUSTOMER_ID),
            )
            .optional(
                "type",
                T::String,
                "Filter by activity type (e.g. 'event', 'attribute_change', 'page', 'email_sent').",
            ),
            Endpoint::get("/customers/{id}/activities"),
        ),
        // Segments
        (
            ToolDescriptor::new("cio_list_segments", "List all segments in Customer.io."),
            Endpoint::get("/segments"),
        ),
        (
            by_id(
                "cio_get_segment",
                "Get details of a specific segment by ID in Customer.io.",
                "The ID of the segment.",
            ),
            Endpoint::get("/segments/{id}").bare(),
        ),
        (
            paged(by_id(
                "cio_get_segment_membership",
                "List the people (customers) who belong to a specific segment in Customer.io.",
                "The ID of the segment.",
            )),
            Endpoint::get("/segments/{id}/membership"),
        ),
        // Campaigns
        (
            ToolDescriptor::new("cio_list_campaigns", "List all campaigns in Customer.io."),
            Endpoint::get("/campaigns"),
        ),
        (
            by_id(
                "cio_get_campaign",
                "Get details of a specific campaign by ID in Customer.io, including status, triggers, and settings.",
                "The ID of the campaign.",
            ),
            Endpoint::get("/campaigns/{id}").bare(),
        ),
        (
            by_id(
                "cio_get_campaign_actions",
                "Get the workflow actions (steps) for a specific campaign in Customer.io.",
                "The ID of the campaign.",
            ),
            Endpoint::get("/campaigns/{id}/actions").bare(),
        ),
        (
            by_id(
                "cio_get_campaign_metrics",
                "Get performance metrics for a specific campaign in Customer.io, including sends, opens, \
                 clicks, conversions, and revenue.",
                "The ID of the campaign.",
            )
            .optional("period", T::String, PERIOD)
            .optional("steps", T::Number, "Number of time periods to include.")
            .optional("type", T::String, "Metric type filter."),
            Endpoint::get("/campaigns/{id}/metrics"),
        ),
        (
            by_id(
                "cio_get_campaign_journey_metrics",
                "Get journey (flow-through) metrics for a specific campaign in Customer.io, showing how \
                 people move through each workflow step.",
                "The ID of the campaign.",
            )
            .optional("start", T::String, "Start date for metrics (Unix timestamp or ISO 8601).")
            .optional("end", T::String, "End date for metrics (Unix timestamp or ISO 8601)."),
            Endpoint::get("/campaigns/{id}/journey_metrics"),
        ),
        // Messages
        (
            paged(ToolDescriptor::new(
                "cio_list_messages",
                "List messages in Customer.io with optional filtering.",
            )),
            Endpoint::get("/messages"),
        ),
        (
            by_id(
                "cio_get_message",
                "Get details of a specific message by ID in Customer.io, including content, status, and delivery info.",
                "The ID of the message.",
            ),
            Endpoint::get("/messages/{id}").bare(),
        ),
        // Newsletters
        (
            ToolDescriptor::new("cio_list_newsletters", "List all newsletters (broadcasts) in Customer.io."),
            Endpoint::get("/newsletters"),
        ),
        (
            by_id(
                "cio_get_newsletter",
                "Get details of a specific newsletter by ID in Customer.io, including subject, status, and recipients.",
                "The ID of the newsletter.",
            ),
            Endpoint::get("/newsletters/{id}").bare(),
        ),
        (
            by_id(
                "cio_get_newsletter_metrics",
                "Get performance metrics for a specific newsletter in Customer.io, including sends, opens, \
                 clicks, and unsubscribes.",
                "The ID of the newsletter.",
            )
            .optional("period", T::String, PERIOD)
            .optional("steps", T::Number, "Number of time periods to include.")
            .optional("type", T::String, "Metric type filter."),
            Endpoint::get("/newsletters/{id}/metrics"),
        ),
        // Activities
        (
            paged(ToolDescriptor::new(
                "cio_list_activities",
                "List recent activities across the Customer.io workspace, including sends, opens, clicks, \
                 and other events.",
            ))
            .optional("type", T::String, "Filter by activity type."),
            Endpoint::get("/activities"),
        ),
        // Collections
        (
            ToolDescriptor::new(
                "cio_list_collections",
                "List all data collections in Customer.io. Collections store reusable data for personalizing messages.",
            ),
            Endpoint::get("/collections"),
        ),
        (
            by_id(
                "cio_get_collection",
                "Get details of a specific data collection by ID in Customer.io, including its schema and data.",
                "The ID of the collection.",
            ),
            Endpoint::get("/collections/{id}").bare(),
        ),
        // Exports
        (
            ToolDescriptor::new(
                "cio_list_exports",
                "List existing data exports in Customer.io, including their status and download links.",
            ),
            Endpoint::get("/exports"),
        ),
        (
            by_id(
                "cio_get_export",
                "Get the status and details of a specific export by ID in Customer.io. Use this to check if \
                 an export is complete and get the download link.",
                "The ID of the export.",
            ),
            Endpoint::get("/exports/{id}").bare(),
        ),
        (
            ToolDescriptor::new(
                "cio_create_customers_export",
                "Trigger a bulk export of customer data from Customer.io. The export runs asynchronously; \
                 use cio_get_export to check status.",
            )
            .optional(
                "filters",
                T::Object,
                "Filter criteria for which customers to export (same format as cio_search_customers filter).",
            )
            .optional_array("fields", T::String, "List of attribute fields to include in the export."),
            Endpoint::post("/exports/customers"),
        ),
        (
            ToolDescriptor::new(
                "cio_create_deliveries_export",
                "Trigger a bulk export of message delivery data from Customer.io. The export runs \
                 asynchronously; use cio_get_export to check status.",
            )
            .optional("newsletter_id", T::Number, "Filter deliveries by newsletter ID.")
            .optional("campaign_id", T::Number, "Filter deliveries by campaign ID.")
            .optional("start", T::Number, "Start of date range (Unix timestamp).")
            .optional("end", T::Number, "End of date range (Unix timestamp)."),
            Endpoint::post("/exports/deliveries"),
        ),
    ]
}

pub fn descriptors() -> Vec<ToolDescriptor> {
    table().into_iter().map(|(d, _)| d).collect()
}

pub struct CustomerIo {
    operations: Vec<Operation>,
}

impl CustomerIo {
    pub fn new(config: &CustomerIoConfig, timeout: Duration) -> Result<Self, ConfigError> {
        let client = Arc::new(RestClient::new(
            IntegrationId::CustomerIo,
            &config.base_url,
            &[("authorization", bearer(&config.api_key))],
            timeout,
        )?);

        let operations = table()
            .into_iter()
            .map(|(descriptor, endpoint)| Operation::new(descriptor, endpoint.bind(client.clone())))
            .collect();

        Ok(Self { operations })
    }
}

impl Integration for CustomerIo {
    fn id(&self) -> IntegrationId {
        IntegrationId::CustomerIo
    }

    fn operations(&self) -> &[Operation] {
        &self.operations
    }
}
