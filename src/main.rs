//! Switchboard: multi-tenant MCP gateway
//!
//! Exposes third-party REST APIs (Dealfront, Google Analytics, Customer.io,
//! Instantly) as MCP tools over streamable HTTP. Each route binds its
//! sessions to a scope: every configured integration (`/mcp`), a single
//! integration (`/dealfront/mcp`) or its read-only subset
//! (`/dealfront-lite/mcp`).
//!
//! Usage:
//!   switchboard                                   # Port 3000, integrations from env
//!   switchboard --port 8080 --api-key secret      # Gate every route
//!   INSTANTLY_API_KEY=... switchboard --verbose   # One integration, debug logs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use switchboard_integrations::config::credential;
use switchboard_integrations::{
    ConfigError, CustomerIoConfig, DealfrontConfig, GoogleAnalyticsConfig, InstantlyConfig,
    IntegrationId, IntegrationsConfig, Region,
};
use switchboard_server::{Scope, SessionRouter};
use switchboard_transport::{TransportConfig, TransportServer, scope_path};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "switchboard", about = "Switchboard: multi-tenant MCP gateway")]
struct Cli {
    /// Port to listen on (0 for OS-assigned)
    #[arg(long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Hostname to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    hostname: String,

    /// Shared API key; when set, every MCP route requires it
    #[arg(long, env = "MCP_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Dealfront (Leadfeeder) API token
    #[arg(long, env = "DEALFRONT_API_TOKEN", hide_env_values = true)]
    dealfront_api_token: Option<String>,

    /// Dealfront IP Enrich API key (enables dealfront_enrich_ip)
    #[arg(long, env = "DEALFRONT_IP_ENRICH_API_KEY", hide_env_values = true)]
    dealfront_ip_enrich_api_key: Option<String>,

    /// Google Analytics OAuth access token
    #[arg(long, env = "GOOGLE_ANALYTICS_ACCESS_TOKEN", hide_env_values = true)]
    google_analytics_access_token: Option<String>,

    /// Customer.io App API key
    #[arg(long, env = "CUSTOMERIO_API_KEY", hide_env_values = true)]
    customerio_api_key: Option<String>,

    /// Customer.io region (us or eu)
    #[arg(long, env = "CUSTOMERIO_REGION", default_value = "us")]
    customerio_region: String,

    /// Instantly API key
    #[arg(long, env = "INSTANTLY_API_KEY", hide_env_values = true)]
    instantly_api_key: Option<String>,

    /// Timeout for each backend request, in seconds
    #[arg(long, env = "BACKEND_TIMEOUT_SECS", default_value = "30")]
    backend_timeout_secs: u64,

    /// Close sessions idle this long, in seconds (0 disables)
    #[arg(long, env = "SESSION_IDLE_TIMEOUT_SECS", default_value = "1800")]
    session_idle_timeout_secs: u64,

    /// Maximum concurrent sessions
    #[arg(long, env = "MAX_SESSIONS")]
    max_sessions: Option<usize>,

    /// Enable permissive CORS
    #[arg(long)]
    cors: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    /// Write logs to a file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn integrations(&self) -> Result<IntegrationsConfig, ConfigError> {
        let dealfront = credential("DEALFRONT_API_TOKEN", self.dealfront_api_token.clone())?;
        let ip_enrich = credential("DEALFRONT_IP_ENRICH_API_KEY", self.dealfront_ip_enrich_api_key.clone())?;
        let google = credential("GOOGLE_ANALYTICS_ACCESS_TOKEN", self.google_analytics_access_token.clone())?;
        let customerio = credential("CUSTOMERIO_API_KEY", self.customerio_api_key.clone())?;
        let region: Region = self.customerio_region.parse()?;
        let instantly = credential("INSTANTLY_API_KEY", self.instantly_api_key.clone())?;

        Ok(IntegrationsConfig {
            dealfront: dealfront.map(|token| DealfrontConfig::new(token).with_ip_enrich_key(ip_enrich)),
            google_analytics: google.map(GoogleAnalyticsConfig::from_access_token),
            customerio: customerio.map(|key| CustomerIoConfig::new(key, region)),
            instantly: instantly.map(InstantlyConfig::new),
            backend_timeout: Duration::from_secs(self.backend_timeout_secs),
        })
    }
}

fn init_tracing(cli: &Cli) {
    let default = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    if let Some(ref log_path) = cli.log_file {
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let file = match std::fs::OpenOptions::new().create(true).append(true).open(log_path) {
            Ok(file) => file,
            Err(e) => {
                eprintln!("Failed to open log file {}: {e}", log_path.display());
                std::process::exit(1);
            }
        };

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .init();

        eprintln!("Logging to {}", log_path.display());
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    let api_key = match credential("MCP_API_KEY", cli.api_key.clone()) {
        Ok(key) => key,
        Err(e) => {
            error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let integrations = match cli.integrations().and_then(|config| config.build()) {
        Ok(integrations) => integrations,
        Err(e) => {
            error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    let configured: Vec<IntegrationId> = integrations.iter().map(|i| i.id()).collect();

    let idle_timeout = Duration::from_secs(cli.session_idle_timeout_secs);
    let router = match SessionRouter::new(integrations, Some(idle_timeout)) {
        Ok(router) => Arc::new(router.with_max_sessions(cli.max_sessions)),
        Err(e) => {
            error!("Failed to build tool catalog: {e}");
            std::process::exit(1);
        }
    };
    let sweeper = router.spawn_sweeper();

    let scopes = Scope::all_tokens();
    let transport_config = TransportConfig {
        port: cli.port,
        hostname: cli.hostname.clone(),
        api_key,
        scopes: scopes.clone(),
        enable_cors: cli.cors,
    };
    let gated = transport_config.api_key.is_some();

    let mut transport = match TransportServer::start(transport_config, router.clone()).await {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to start transport: {e}");
            std::process::exit(1);
        }
    };
    info!("Switchboard MCP server listening on port {}", transport.port());

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Switchboard MCP Gateway                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("  Port:       {}", transport.port());
    println!("  Binding:    {}", cli.hostname);
    println!("  Auth:       {}", if gated { "API key required" } else { "open (no MCP_API_KEY)" });
    if cli.session_idle_timeout_secs == 0 {
        println!("  Sessions:   no idle expiry");
    } else {
        println!("  Sessions:   expire after {}s idle", cli.session_idle_timeout_secs);
    }
    println!();
    println!("  Integrations:");
    for id in IntegrationId::ALL {
        let status = if configured.contains(&id) { "configured" } else { "not configured" };
        println!("    {:<18} {}", id.display_name(), status);
    }
    println!();
    println!("  Endpoints:");
    for scope in &scopes {
        println!("    {}", scope_path(scope));
    }
    println!();
    println!("  Press Ctrl+C to stop.");
    println!();

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }

    println!();
    println!("  Shutting down...");
    router.close_all();
    transport.stop().await;
    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    println!("  Server stopped.");
}
