//! # Firedesk — Deadline Radar for Fire-Safety Back-Offices
//!
//! Watches leads, licensing processes, and quotes for time-based risk,
//! keeps a prioritized notification feed, and fires stage-entry automations
//! on the sales pipeline.
//!
//! Usage:
//!   firedesk run                          # Scan daemon on the configured cadence
//!   firedesk run --interval-secs 60       # Faster cadence
//!   firedesk scan                         # One pass, print the feed
//!   firedesk scan --json                  # One pass, feed as JSON
//!   firedesk settings show
//!   firedesk settings set budget off
//!   firedesk settings set push on
//!   firedesk stage list
//!   firedesk stage move lead-17 automatic_contact

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use firedesk_alerts::{AlertEngine, Category, SettingsStore, spawn_scan_loop};
use firedesk_channels::{ConnectedIdentityStore, SmtpMailer};
use firedesk_core::records::Stage;
use firedesk_core::{FiredeskConfig, RecordStore};
use firedesk_pipeline::{AutomationDispatcher, TransitionMachine};

#[derive(Parser)]
#[command(
    name = "firedesk",
    version,
    about = "🔥 Firedesk — Deadline radar and pipeline automation for AVCB/CLCB back-offices"
)]
struct Cli {
    /// Path to config.toml (default: ~/.firedesk/config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Data directory override (default: from config)
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scan daemon on the configured cadence
    Run {
        /// Override scan interval in seconds
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// Run a single scan pass and print the feed
    Scan {
        /// Print the feed as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change notification settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Inspect or move leads on the sales pipeline
    Stage {
        #[command(subcommand)]
        action: StageAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print current settings
    Show,
    /// Set a category flag or 'push': firedesk settings set budget off
    Set { key: String, value: String },
}

#[derive(Subcommand)]
enum StageAction {
    /// Show the pipeline with stage ages and overdue flags
    List,
    /// Move a lead to a stage (fires stage automation)
    Move { lead_id: String, stage: String },
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "firedesk=debug,firedesk_core=debug,firedesk_alerts=debug,firedesk_pipeline=debug,firedesk_channels=debug"
    } else {
        "firedesk=info,firedesk_core=info,firedesk_alerts=info,firedesk_pipeline=info,firedesk_channels=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => FiredeskConfig::load_from(std::path::Path::new(&expand_path(path)))?,
        None => FiredeskConfig::load()?,
    };

    let data_dir = PathBuf::from(expand_path(cli.data_dir.as_deref().unwrap_or(&config.data_dir)));
    std::fs::create_dir_all(&data_dir)?;

    match cli.command {
        Command::Run { interval_secs } => run_daemon(config, data_dir, interval_secs).await,
        Command::Scan { json } => run_scan(data_dir, json),
        Command::Settings { action } => run_settings(data_dir, action),
        Command::Stage { action } => run_stage(config, data_dir, action).await,
    }
}

// ─── run ─────────────────────────────────────────────────────────────────────

async fn run_daemon(config: FiredeskConfig, data_dir: PathBuf, interval_secs: Option<u64>) -> Result<()> {
    let records = Arc::new(RecordStore::new(&data_dir.join("records")));
    let settings = SettingsStore::open(&data_dir.join("settings.json"));

    let mut engine = AlertEngine::new(settings);
    engine.set_toast_spacing(Duration::from_secs(config.alerts.toast_spacing_secs));
    let mut toasts = engine.toast_stream();
    let engine = Arc::new(Mutex::new(engine));

    let interval = interval_secs.unwrap_or(config.alerts.scan_interval_secs);
    let scan_loop = spawn_scan_loop(engine.clone(), records, interval);

    // Surface toasts on the console while the daemon runs.
    let toast_task = tokio::spawn(async move {
        while let Some(n) = toasts.next().await {
            println!("🔔 [{}] {}", n.priority, n.title);
            println!("   {}", n.message);
        }
    });

    println!("🔥 Firedesk v{}", env!("CARGO_PKG_VERSION"));
    println!("   ⏰ Scan interval: {interval}s");
    println!("   📂 Data dir:      {}", data_dir.display());
    println!("   Press Ctrl-C to stop.\n");
    tracing::info!("🔥 Daemon started");

    tokio::signal::ctrl_c().await?;
    println!("\n🛑 Shutting down...");
    scan_loop.shutdown().await;
    toast_task.abort();
    println!("👋 Stopped.");
    Ok(())
}

// ─── scan ────────────────────────────────────────────────────────────────────

fn run_scan(data_dir: PathBuf, json: bool) -> Result<()> {
    let records = RecordStore::new(&data_dir.join("records"));
    let settings = SettingsStore::open(&data_dir.join("settings.json"));
    let mut engine = AlertEngine::new(settings);

    let snapshot = records.load_snapshot();
    let summary = engine.run_pass(&snapshot, Utc::now());
    let feed = engine.store().sorted();

    if json {
        println!("{}", serde_json::to_string_pretty(&feed)?);
        return Ok(());
    }

    if feed.is_empty() {
        println!("✅ No open alerts. All deadlines clear.");
        return Ok(());
    }
    for n in &feed {
        let marker = if n.is_read { " " } else { "•" };
        println!("{marker} [{:<6}] {:<9} {}", n.priority.to_string(), n.category.to_string(), n.title);
        println!("             {}", n.message);
    }
    println!(
        "\n📊 {} alert(s) from {} record(s), {} unread",
        feed.len(),
        snapshot.record_count(),
        engine.store().unread_count()
    );
    if summary.dropped_malformed > 0 {
        println!("⚠️ {} malformed candidate(s) dropped", summary.dropped_malformed);
    }
    Ok(())
}

// ─── settings ────────────────────────────────────────────────────────────────

fn run_settings(data_dir: PathBuf, action: SettingsAction) -> Result<()> {
    let mut store = SettingsStore::open(&data_dir.join("settings.json"));
    match action {
        SettingsAction::Show => {
            let settings = store.current();
            println!("🔔 Notification settings");
            for category in Category::ALL {
                let state = if settings.enabled(category) { "on" } else { "off" };
                println!("   {:<10} {state}", category.to_string());
            }
            println!("   {:<10} {}", "push", if settings.push_enabled { "on" } else { "off" });
        }
        SettingsAction::Set { key, value } => {
            let on = match value.to_lowercase().as_str() {
                "on" | "true" | "1" | "yes" => true,
                "off" | "false" | "0" | "no" => false,
                other => bail!("expected on/off, got '{other}'"),
            };
            if key.to_lowercase() == "push" {
                store.update(|s| s.push_enabled = on)?;
            } else {
                let category: Category = key.parse().map_err(|e: String| anyhow::anyhow!(e))?;
                store.update(|s| s.set_enabled(category, on))?;
            }
            println!("✅ {key} set to {}", if on { "on" } else { "off" });
        }
    }
    Ok(())
}

// ─── stage ───────────────────────────────────────────────────────────────────

async fn run_stage(config: FiredeskConfig, data_dir: PathBuf, action: StageAction) -> Result<()> {
    let records = RecordStore::new(&data_dir.join("records"));
    match action {
        StageAction::List => {
            let snapshot = records.load_snapshot();
            let now = Utc::now();
            for stage in Stage::ALL {
                let deadline = match stage.deadline_days() {
                    Some(days) => format!("{days}d deadline"),
                    None => "no deadline".to_string(),
                };
                println!("── {} ({deadline})", stage.label());
                for lead in snapshot.leads.iter().filter(|l| l.stage == stage) {
                    let flag = if lead.is_overdue(now) { " ⚠️ OVERDUE" } else { "" };
                    println!(
                        "   {:<12} {:<24} {} day(s) in stage{flag}",
                        lead.id,
                        lead.company,
                        lead.days_in_stage(now)
                    );
                }
            }
        }
        StageAction::Move { lead_id, stage } => {
            let to_stage: Stage = stage.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            let mut leads = records.load_snapshot().leads;
            let Some(lead) = leads.iter_mut().find(|l| l.id == lead_id) else {
                bail!("no lead with id '{lead_id}'");
            };

            let identity = Arc::new(ConnectedIdentityStore::new(config.smtp.clone()));
            let mailer = Arc::new(SmtpMailer::new(config.smtp.clone()));
            let dispatcher = Arc::new(AutomationDispatcher::new(config.automation.clone(), identity, mailer));
            let machine = TransitionMachine::with_dispatcher(dispatcher);

            let outcome = machine.request_transition(lead, to_stage, Utc::now());
            records.save_leads(&leads)?;
            println!(
                "✅ Lead '{}' moved: {} → {}",
                outcome.event.record_id,
                outcome.event.from_stage.label(),
                outcome.event.to_stage.label()
            );

            // Short-lived process: drain the automation before exiting.
            if let Some(automation) = outcome.automation {
                automation.await.ok();
            }
        }
    }
    Ok(())
}
