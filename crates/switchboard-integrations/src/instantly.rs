//! Instantly.ai V2 API integration.

use std::sync::Arc;
use std::time::Duration;

use switchboard_protocol::{FieldType as T, ToolDescriptor};

use crate::config::{InstantlyConfig, bearer};
use crate::endpoint::{Endpoint, Payload};
use crate::error::ConfigError;
use crate::handler::Operation;
use crate::http::RestClient;
use crate::{Integration, IntegrationId};

pub const LITE_TOOLS: &[&str] = &[
    "instantly_list_campaigns",
    "instantly_get_campaign",
    "instantly_get_campaign_analytics",
    "instantly_get_campaign_analytics_overview",
    "instantly_get_campaign_analytics_daily",
    "instantly_get_campaign_analytics_steps",
    "instantly_list_leads",
    "instantly_get_lead",
    "instantly_list_lead_lists",
    "instantly_get_lead_list",
    "instantly_list_accounts",
    "instantly_get_account",
    "instantly_get_account_analytics_daily",
    "instantly_list_emails",
    "instantly_get_email",
    "instantly_get_unread_count",
    "instantly_list_blocklist_entries",
    "instantly_list_lead_labels",
];

const CURSOR: &str = "Cursor for pagination.";
const LIMIT: &str = "Number of results to return.";

fn paged(tool: ToolDescriptor) -> ToolDescriptor {
    tool.optional("limit", T::Number, LIMIT).optional("starting_after", T::String, CURSOR)
}

fn by_id(name: &str, description: &str, id: &str) -> ToolDescriptor {
    ToolDescriptor::new(name, description).required("id", T::String, id)
}

fn table() -> Vec<(ToolDescriptor, Endpoint)> {
    vec![
        // Campaigns
        (
            ToolDescriptor::new(
                "instantly_list_campaigns",
                "List all email outreach campaigns in Instantly.ai with optional pagination.",
            )
            .optional("limit", T::Number, "Number of results to return (default 10).")
            .optional(
                "starting_after",
                T::String,
                "Cursor for pagination. Use the next_starting_after value from the previous response.",
            )
            .optional(
                "status",
                T::Number,
                "Filter by campaign status (0 = draft, 1 = active, 2 = paused, 3 = completed).",
            ),
            Endpoint::get("/campaigns"),
        ),
        (
            by_id(
                "instantly_get_campaign",
                "Get a specific campaign by ID, including its configuration, schedule, and sequences.",
                "The UUID of the campaign.",
            ),
            Endpoint::get("/campaigns/{id}").bare(),
        ),
        (
            ToolDescriptor::new("instantly_create_campaign", "Create a new email outreach campaign in Instantly.ai.")
                .required("name", T::String, "The name of the campaign.")
                .optional(
                    "campaign_schedule",
                    T::Object,
                    "Schedule configuration for the campaign (timezone, days, timing).",
                ),
            Endpoint::post("/campaigns"),
        ),
        (
            by_id(
                "instantly_update_campaign",
                "Update an existing campaign's settings in Instantly.ai.",
                "The UUID of the campaign to update.",
            )
            .optional("name", T::String, "The new name of the campaign.")
            .optional("campaign_schedule", T::Object, "Updated schedule configuration."),
            Endpoint::patch("/campaigns/{id}"),
        ),
        (
            by_id(
                "instantly_delete_campaign",
                "Delete a campaign from Instantly.ai.",
                "The UUID of the campaign to delete.",
            ),
            Endpoint::delete("/campaigns/{id}").bare(),
        ),
        (
            by_id(
                "instantly_activate_campaign",
                "Activate/launch a campaign to start sending emails.",
                "The UUID of the campaign to activate.",
            ),
            Endpoint::post("/campaigns/{id}/activate").bare(),
        ),
        (
            by_id("instantly_pause_campaign", "Pause a running campaign.", "The UUID of the campaign to pause."),
            Endpoint::post("/campaigns/{id}/pause").bare(),
        ),
        // Campaign analytics
        (
            ToolDescriptor::new(
                "instantly_get_campaign_analytics",
                "Get analytics for campaigns including sent, opened, replied, and bounced counts.",
            )
            .optional(
                "campaign_id",
                T::String,
                "Filter analytics to a specific campaign UUID. Omit for all campaigns.",
            )
            .optional("limit", T::Number, LIMIT)
            .optional("starting_after", T::String, CURSOR),
            Endpoint::get("/campaigns/analytics"),
        ),
        (
            ToolDescriptor::new(
                "instantly_get_campaign_analytics_overview",
                "Get a high-level analytics overview across all campaigns (total sent, opened, replied, bounced).",
            )
            .optional("campaign_id", T::String, "Filter to a specific campaign UUID."),
            Endpoint::get("/campaigns/analytics/overview"),
        ),
        (
            ToolDescriptor::new(
                "instantly_get_campaign_analytics_daily",
                "Get daily campaign analytics broken down by date for trend analysis.",
            )
            .optional("campaign_id", T::String, "Filter to a specific campaign UUID.")
            .optional("start_date", T::String, "Start date for the range (YYYY-MM-DD).")
            .optional("end_date", T::String, "End date for the range (YYYY-MM-DD)."),
            Endpoint::get("/campaigns/analytics/daily"),
        ),
        (
            ToolDescriptor::new(
                "instantly_get_campaign_analytics_steps",
                "Get step-level analytics for a campaign showing performance at each sequence step.",
            )
            .required("campaign_id", T::String, "The UUID of the campaign."),
            Endpoint::get("/campaigns/analytics/steps"),
        ),
        // Leads
        (
            ToolDescriptor::new(
                "instantly_list_leads",
                "List leads in Instantly.ai with optional filtering by campaign, list, or status.",
            )
            .optional("campaign_id", T::String, "Filter leads by campaign UUID.")
            .optional("list_id", T::String, "Filter leads by lead list UUID.")
            .optional("email", T::String, "Filter by exact lead email address.")
            .optional("limit", T::Number, "Number of results to return (default 10).")
            .optional("starting_after", T::String, CURSOR),
            // V2 lists leads with POST so filters travel in the body.
            Endpoint::post("/leads/list"),
        ),
        (
            by_id(
                "instantly_get_lead",
                "Get a specific lead by ID including all attributes, custom variables, and campaign status.",
                "The UUID of the lead.",
            ),
            Endpoint::get("/leads/{id}").bare(),
        ),
        (
            ToolDescriptor::new(
                "instantly_create_lead",
                "Create a new lead and optionally assign it to a campaign or lead list.",
            )
            .required("email", T::String, "The email address of the lead.")
            .optional("first_name", T::String, "The first name of the lead.")
            .optional("last_name", T::String, "The last name of the lead.")
            .optional("company_name", T::String, "The company name of the lead.")
            .optional("phone", T::String, "The phone number of the lead.")
            .optional("website", T::String, "The website of the lead.")
            .optional("campaign_id", T::String, "UUID of the campaign to assign the lead to.")
            .optional("list_id", T::String, "UUID of the lead list to assign the lead to.")
            .optional(
                "custom_variables",
                T::Object,
                "Key-value pairs for custom variables (e.g. { company: 'Acme' }).",
            ),
            Endpoint::post("/leads"),
        ),
        (
            by_id(
                "instantly_update_lead",
                "Update an existing lead's attributes in Instantly.ai.",
                "The UUID of the lead to update.",
            )
            .optional("first_name", T::String, "Updated first name.")
            .optional("last_name", T::String, "Updated last name.")
            .optional("company_name", T::String, "Updated company name.")
            .optional("phone", T::String, "Updated phone number.")
            .optional("website", T::String, "Updated website.")
            .optional("custom_variables", T::Object, "Updated custom variables."),
            Endpoint::patch("/leads/{id}"),
        ),
        (
            ToolDescriptor::new(
                "instantly_delete_leads",
                "Delete leads from Instantly.ai by providing a list of lead IDs or emails.",
            )
            .required_array("delete_list", T::String, "Array of lead emails to delete.")
            .optional(
                "campaign_id",
                T::String,
                "Campaign UUID to scope the deletion to (only removes from this campaign).",
            ),
            Endpoint::delete("/leads").with(Payload::Body),
        ),
        (
            ToolDescriptor::new("instantly_move_leads", "Move leads to a different campaign or lead list.")
                .required_array("lead_ids", T::String, "Array of lead UUIDs to move.")
                .optional("to_campaign_id", T::String, "Destination campaign UUID.")
                .optional("to_list_id", T::String, "Destination lead list UUID.")
                .optional("from_campaign_id", T::String, "Source campaign UUID."),
            Endpoint::post("/leads/move"),
        ),
        // Lead lists
        (
            paged(ToolDescriptor::new(
                "instantly_list_lead_lists",
                "List all lead lists in the Instantly.ai workspace.",
            )),
            Endpoint::get("/lead-lists"),
        ),
        (
            by_id("instantly_get_lead_list", "Get a specific lead list by ID.", "The UUID of the lead list."),
            Endpoint::get("/lead-lists/{id}").bare(),
        ),
        (
            ToolDescriptor::new("instantly_create_lead_list", "Create a new lead list.")
                .required("name", T::String, "Name of the lead list."),
            Endpoint::post("/lead-lists"),
        ),
        // Sending accounts
        (
            paged(ToolDescriptor::new(
                "instantly_list_accounts",
                "List all sending email accounts configured in Instantly.ai.",
            )),
            Endpoint::get("/accounts"),
        ),
        (
            ToolDescriptor::new("instantly_get_account", "Get a specific sending account by email address.")
                .required("email", T::String, "The email address of the sending account."),
            Endpoint::get("/accounts/{email}").bare(),
        ),
        (
            ToolDescriptor::new(
                "instantly_get_account_analytics_daily",
                "Get daily analytics for sending accounts (deliverability, warmup stats).",
            )
            .optional_array("accounts", T::String, "Array of account emails to get analytics for.")
            .optional("start_date", T::String, "Start date (YYYY-MM-DD).")
            .optional("end_date", T::String, "End date (YYYY-MM-DD)."),
            Endpoint::get("/accounts/analytics/daily"),
        ),
        (
            ToolDescriptor::new(
                "instantly_enable_warmup",
                "Enable email warmup for one or more sending accounts.",
            )
            .required_array("accounts", T::String, "Array of account emails to enable warmup for."),
            Endpoint::post("/accounts/warmup/enable"),
        ),
        (
            ToolDescriptor::new(
                "instantly_disable_warmup",
                "Disable email warmup for one or more sending accounts.",
            )
            .required_array("accounts", T::String, "Array of account emails to disable warmup for."),
            Endpoint::post("/accounts/warmup/disable"),
        ),
        // Emails / Unibox
        (
            paged(
                ToolDescriptor::new(
                    "instantly_list_emails",
                    "List emails visible in the Instantly Unibox with optional filtering.",
                )
                .optional("campaign_id", T::String, "Filter by campaign UUID.")
                .optional("lead_email", T::String, "Filter by lead email address.")
                .optional("is_unread", T::Boolean, "Filter by unread status.")
                .optional("email_type", T::String, "Filter by type: all, sent or received."),
            ),
            Endpoint::get("/emails"),
        ),
        (
            by_id(
                "instantly_get_email",
                "Get a specific email by ID including full body and metadata.",
                "The UUID of the email.",
            ),
            Endpoint::get("/emails/{id}").bare(),
        ),
        (
            ToolDescriptor::new("instantly_reply_to_email", "Reply to an email thread in the Unibox.")
                .required("reply_to_uuid", T::String, "UUID of the email to reply to.")
                .required("from_email", T::String, "Sending account email to reply from.")
                .required("body", T::String, "HTML body of the reply."),
            Endpoint::post("/emails/reply"),
        ),
        (
            ToolDescriptor::new("instantly_get_unread_count", "Get the count of unread emails in the Unibox."),
            Endpoint::get("/emails/unread/count").bare(),
        ),
        // Email verification
        (
            ToolDescriptor::new("instantly_verify_email", "Verify a single email address for deliverability.")
                .required("email", T::String, "The email address to verify."),
            Endpoint::post("/email-verification"),
        ),
        // Block list
        (
            paged(ToolDescriptor::new(
                "instantly_list_blocklist_entries",
                "List all blocklist entries (blocked domains and emails) in the workspace.",
            )),
            Endpoint::get("/block-list-entries"),
        ),
        (
            ToolDescriptor::new(
                "instantly_add_blocklist_entry",
                "Add an email or domain to the blocklist to prevent outreach.",
            )
            .required(
                "entry",
                T::String,
                "Email address or domain to block (e.g. 'spam@example.com' or 'example.com').",
            )
            .required("entry_type", T::String, "Type of entry: email or domain."),
            Endpoint::post("/block-list-entries"),
        ),
        (
            by_id(
                "instantly_delete_blocklist_entry",
                "Remove an entry from the blocklist.",
                "The UUID of the blocklist entry to remove.",
            ),
            Endpoint::delete("/block-list-entries/{id}").bare(),
        ),
        // Lead labels
        (
            paged(ToolDescriptor::new(
                "instantly_list_lead_labels",
                "List lead labels (interest statuses) configured in the workspace.",
            )),
            Endpoint::get("/lead-labels"),
        ),
    ]
}

pub fn descriptors() -> Vec<ToolDescriptor> {
    table().into_iter().map(|(d, _)| d).collect()
}

pub struct Instantly {
    operations: Vec<Operation>,
}

impl Instantly {
    pub fn new(config: &InstantlyConfig, timeout: Duration) -> Result<Self, ConfigError> {
        let client = Arc::new(RestClient::new(
            IntegrationId::Instantly,
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

impl Integration for Instantly {
    fn id(&self) -> IntegrationId {
        IntegrationId::Instantly
    }

    fn operations(&self) -> &[Operation] {
        &self.operations
    }
}
