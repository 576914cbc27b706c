//! Feedgen CLI - Trigger, preview and download product feeds
//!
//! Thin operator client over the Feedgen HTTP API.

mod api;
mod config;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{Input, Password};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use api::{FeedgenClient, PutScheduleRequest, PutWebhookRequest, RunResponse};
use config::Config;

/// Poll period while waiting on a run
const WAIT_POLL: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(name = "feedgen")]
#[command(about = "Feedgen CLI - Trigger, preview and download product feeds", long_about = None)]
#[command(version)]
struct Cli {
    /// Log HTTP requests
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Login and store API key
    Login {
        /// API key (will prompt if not provided)
        #[arg(short, long)]
        key: Option<String>,
        /// API base URL (will prompt if not provided)
        #[arg(long)]
        url: Option<String>,
    },

    /// Start a generation run
    Regenerate {
        feed_id: Uuid,
        /// Wait for the run to finish
        #[arg(short, long)]
        wait: bool,
    },

    /// Download the latest generated feed
    Download {
        feed_id: Uuid,
        /// Output file (defaults to the server-suggested name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a bounded preview of the feed
    Preview {
        feed_id: Uuid,
        /// Records to render
        #[arg(short = 'n', long)]
        max_products: Option<usize>,
    },

    /// Dispatch every due schedule now
    RunScheduled,

    /// Show recent generation runs
    History {
        feed_id: Uuid,
        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// Feed schedule
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },

    /// Feed webhook
    Webhook {
        #[command(subcommand)]
        action: WebhookAction,
    },

    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
enum ScheduleAction {
    /// Show the schedule
    Get { feed_id: Uuid },
    /// Create or update the schedule
    Set {
        feed_id: Uuid,
        /// Interval in hours: 1, 6, 12, 24 or 168
        #[arg(short, long)]
        interval: Option<i32>,
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        #[arg(long)]
        disable: bool,
    },
}

#[derive(Subcommand)]
enum WebhookAction {
    /// Show the webhook
    Get { feed_id: Uuid },
    /// Create or update the webhook
    Set {
        feed_id: Uuid,
        #[arg(long)]
        url: Option<String>,
        /// Signing secret (empty string removes it)
        #[arg(long)]
        secret: Option<String>,
        /// Event types (comma-separated, e.g., "feed.generated,feed.failed")
        #[arg(long, value_delimiter = ',')]
        events: Vec<String>,
        /// Total attempts per event
        #[arg(long)]
        retries: Option<i32>,
        /// Per-attempt timeout in seconds
        #[arg(long)]
        timeout: Option<i32>,
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        #[arg(long)]
        disable: bool,
    },
    /// Queue a feed.validated test event
    Test { feed_id: Uuid },
    /// Show recent delivery attempts
    Deliveries {
        feed_id: Uuid,
        #[arg(short, long)]
        limit: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Login { key, url } => cmd_login(key, url).await,
        Commands::Regenerate { feed_id, wait } => cmd_regenerate(feed_id, wait).await,
        Commands::Download { feed_id, output } => cmd_download(feed_id, output).await,
        Commands::Preview { feed_id, max_products } => cmd_preview(feed_id, max_products).await,
        Commands::RunScheduled => cmd_run_scheduled().await,
        Commands::History { feed_id, limit } => cmd_history(feed_id, limit).await,
        Commands::Schedule { action } => cmd_schedule(action).await,
        Commands::Webhook { action } => cmd_webhook(action).await,
        Commands::Config => cmd_config(),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "feedgen=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn client() -> Result<FeedgenClient> {
    let config = Config::effective()?;
    let api_key = config
        .api_key
        .as_ref()
        .context("Not logged in. Run 'feedgen login' or set FEEDGEN_API_KEY.")?;
    Ok(FeedgenClient::new(&config.base_url, api_key))
}

// ============================================
// Command Implementations
// ============================================

async fn cmd_login(key: Option<String>, url: Option<String>) -> Result<()> {
    let mut config = Config::load()?;

    let base_url = match url {
        Some(u) => u,
        None => Input::new()
            .with_prompt("API URL")
            .default(config.base_url.clone())
            .interact_text()
            .context("Failed to read API URL")?,
    };
    config.set_base_url(base_url);

    let api_key = match key {
        Some(k) => k,
        None => Password::new()
            .with_prompt("API Key")
            .interact()
            .context("Failed to read API key")?,
    };

    // Test connection
    let client = FeedgenClient::new(&config.base_url, &api_key);
    print!("Testing connection... ");

    match client.health().await {
        Ok(true) => {
            println!("{}", "OK".green());
        }
        _ => {
            println!("{}", "Failed".red());
            bail!("Could not connect to Feedgen API at {}", config.base_url);
        }
    }

    config.set_api_key(api_key);
    config.save()?;

    println!("{} API key saved to {:?}", "✓".green(), Config::config_path()?);
    Ok(())
}

async fn cmd_regenerate(feed_id: Uuid, wait: bool) -> Result<()> {
    let client = client()?;
    let accepted = client.regenerate(feed_id).await?;

    println!(
        "{} Run {} started for feed {} ({})",
        "✓".green(),
        accepted.run_id.to_string().cyan(),
        accepted.feed_id,
        accepted.status
    );

    if !wait {
        println!("\n{}", "Follow it with:".dimmed());
        println!("  feedgen history {}", feed_id);
        return Ok(());
    }

    loop {
        tokio::time::sleep(WAIT_POLL).await;
        let run = client.run(feed_id, accepted.run_id).await?;
        if run.status != "running" {
            print_run(&run);
            if run.status != "success" {
                bail!("Run {} {}", run.id, run.status);
            }
            return Ok(());
        }
    }
}

async fn cmd_download(feed_id: Uuid, output: Option<PathBuf>) -> Result<()> {
    let client = client()?;
    let file = client.download(feed_id).await?;

    let path = output
        .or_else(|| file.filename.clone().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(format!("{}.feed", feed_id)));

    fs::write(&path, &file.data).with_context(|| format!("Failed to write {:?}", path))?;

    println!(
        "{} Saved {} bytes to {:?}",
        "✓".green(),
        file.data.len(),
        path
    );
    Ok(())
}

async fn cmd_preview(feed_id: Uuid, max_products: Option<usize>) -> Result<()> {
    let client = client()?;
    let file = client.preview(feed_id, max_products).await?;

    // Metadata to stderr so stdout is clean for piping
    eprintln!(
        "{} {} ({} bytes)",
        "Preview".dimmed(),
        file.content_type.as_deref().unwrap_or("unknown").green(),
        file.data.len()
    );
    eprintln!("{}", "---".dimmed());

    println!("{}", String::from_utf8_lossy(&file.data));
    Ok(())
}

async fn cmd_run_scheduled() -> Result<()> {
    let client = client()?;
    let report = client.run_scheduled().await?;

    println!(
        "{} Dispatched {} scheduled run(s)",
        "✓".green(),
        report.dispatched.to_string().cyan()
    );
    Ok(())
}

async fn cmd_history(feed_id: Uuid, limit: Option<i64>) -> Result<()> {
    let client = client()?;
    let runs = client.history(feed_id, limit).await?;

    if runs.is_empty() {
        println!("No runs yet.");
        println!("\n{}", "Start one with:".dimmed());
        println!("  feedgen regenerate {}", feed_id);
        return Ok(());
    }

    println!("{}", "Runs:".bold());
    for run in &runs {
        print_run(run);
    }
    Ok(())
}

async fn cmd_schedule(action: ScheduleAction) -> Result<()> {
    let client = client()?;

    let schedule = match action {
        ScheduleAction::Get { feed_id } => client.get_schedule(feed_id).await?,
        ScheduleAction::Set {
            feed_id,
            interval,
            enable,
            disable,
        } => {
            let request = PutScheduleRequest {
                enabled: toggle(enable, disable),
                interval_hours: interval,
            };
            let saved = client.put_schedule(feed_id, &request).await?;
            println!("{} Schedule saved", "✓".green());
            saved
        }
    };

    println!("{}", "Schedule:".bold());
    println!("  Enabled: {}", enabled_label(schedule.enabled));
    println!("  Every: {}h", schedule.interval_hours);
    println!("  Next run: {}", schedule.next_run_at);
    println!(
        "  Last run: {}",
        schedule.last_run_at.as_deref().unwrap_or("never")
    );
    if schedule.consecutive_failures > 0 {
        println!(
            "  Failures: {} ({})",
            schedule.consecutive_failures.to_string().red(),
            schedule.last_error.as_deref().unwrap_or("-").dimmed()
        );
    }
    Ok(())
}

async fn cmd_webhook(action: WebhookAction) -> Result<()> {
    let client = client()?;

    let webhook = match action {
        WebhookAction::Get { feed_id } => client.get_webhook(feed_id).await?,
        WebhookAction::Set {
            feed_id,
            url,
            secret,
            events,
            retries,
            timeout,
            enable,
            disable,
        } => {
            let request = PutWebhookRequest {
                url,
                secret,
                enabled: toggle(enable, disable),
                events: (!events.is_empty()).then_some(events),
                retry_count: retries,
                timeout_seconds: timeout,
            };
            let saved = client.put_webhook(feed_id, &request).await?;
            println!("{} Webhook saved", "✓".green());
            saved
        }
        WebhookAction::Test { feed_id } => {
            let queued = client.test_webhook(feed_id).await?;
            println!(
                "{} {} event {} {}",
                "✓".green(),
                queued.event.cyan(),
                queued.event_id.to_string().dimmed(),
                queued.status
            );
            println!("\n{}", "Check the result with:".dimmed());
            println!("  feedgen webhook deliveries {}", feed_id);
            return Ok(());
        }
        WebhookAction::Deliveries { feed_id, limit } => {
            let deliveries = client.deliveries(feed_id, limit).await?;
            if deliveries.is_empty() {
                println!("No deliveries yet.");
                return Ok(());
            }
            println!("{}", "Deliveries:".bold());
            for d in deliveries {
                let outcome = if d.success {
                    "ok".green()
                } else {
                    "failed".red()
                };
                let code = d
                    .status_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  {} {} #{} [{}] {} {}ms {}",
                    d.delivered_at.dimmed(),
                    d.event.cyan(),
                    d.attempt,
                    outcome,
                    code,
                    d.response_time_ms.unwrap_or(0),
                    d.error_message.as_deref().unwrap_or("").dimmed()
                );
            }
            return Ok(());
        }
    };

    println!("{}", "Webhook:".bold());
    println!("  URL: {}", webhook.url);
    println!("  Enabled: {}", enabled_label(webhook.enabled));
    println!("  Signed: {}", if webhook.signed { "yes" } else { "no" });
    println!("  Events: {}", webhook.events.join(", "));
    println!(
        "  Attempts: {} (timeout {}s)",
        webhook.retry_count, webhook.timeout_seconds
    );
    println!(
        "  Deliveries: {} total, {} ok, {} failed",
        webhook.total_deliveries,
        webhook.successful_deliveries.to_string().green(),
        webhook.failed_deliveries.to_string().red()
    );
    Ok(())
}

fn cmd_config() -> Result<()> {
    let stored = Config::load()?;
    let config = Config::effective()?;
    let source = |overridden: bool| {
        if overridden {
            " (environment)".yellow().to_string()
        } else {
            String::new()
        }
    };

    println!("{}", "Configuration:".bold());
    println!("  Path: {:?}", Config::config_path()?);
    println!(
        "  Base URL: {}{}",
        config.base_url,
        source(config.base_url != stored.base_url)
    );
    println!(
        "  API Key: {}{}",
        if config.api_key.is_some() { "Set".green() } else { "Not set".red() },
        source(config.api_key != stored.api_key)
    );

    Ok(())
}

// ============================================
// Helpers
// ============================================

/// `--enable` / `--disable` to an optional flag
fn toggle(enable: bool, disable: bool) -> Option<bool> {
    match (enable, disable) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn enabled_label(enabled: bool) -> colored::ColoredString {
    if enabled {
        "yes".green()
    } else {
        "paused".yellow()
    }
}

fn print_run(run: &RunResponse) {
    let status = match run.status.as_str() {
        "success" => run.status.green(),
        "running" => run.status.yellow(),
        _ => run.status.red(),
    };
    println!(
        "  {} {} [{}] {}/{} included, {} excluded, {} bytes in {}ms",
        run.started_at.dimmed(),
        run.id.to_string().dimmed(),
        status,
        run.products_included,
        run.products_processed,
        run.products_excluded,
        run.file_size_bytes,
        run.generation_time_ms
    );
    if let Some(err) = &run.error_message {
        println!("    {}", err.red());
    }
}
