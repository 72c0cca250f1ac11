//! Panelkit Console - Main Entry Point
//! Opens simulated property pages on an interactive thread and submits their
//! changes through the job runner.

mod simulation;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use panelkit_core::application::{ApplyMode, ObjectUpdate, SessionRegistry};
use panelkit_core::domain::ModificationRequest;
use panelkit_core::{Job, JobHandle, JobRunner, RunnerConfig, VERSION};
use panelkit_infra_ui::{EventLoopHandle, MessageArea, TracingProgress};
use simulation::{SimulatedPage, SimulatedSession};

const DEFAULT_LOG_FILTER: &str = "panelkit_core=info,panelkit_infra_ui=info,panelkit_console=info";

const TRUSTED_OBJECT: u32 = 100;
const ACL_OBJECT: u32 = 200;
const PROXY_OBJECT: u32 = 300;

#[derive(Parser)]
#[command(name = "panelkit-console")]
#[command(about = "Drive simulated property pages through the Panelkit job runner", long_about = None)]
#[command(version)]
struct Cli {
    /// Bodies running concurrently (overrides PANELKIT_MAX_WORKERS)
    #[arg(long)]
    max_workers: Option<usize>,

    /// Jobs waiting for a worker before start rejects (overrides PANELKIT_QUEUE_CAPACITY)
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// Log format: pretty or json
    #[arg(long, env = "PANELKIT_LOG_FORMAT", default_value = "pretty")]
    log_format: String,

    /// Simulated server round-trip in milliseconds
    #[arg(long, default_value_t = 200)]
    latency_ms: u64,

    /// Error the simulated server returns for unreachable objects
    #[arg(long, default_value = "connection refused")]
    failure: String,
}

/// Pages opened by the scenario, kept alive until the report
struct OpenedPages {
    handles: Vec<JobHandle>,
    pages: Vec<Arc<SimulatedPage>>,
    areas: Vec<Arc<MessageArea>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Initialize logging
    init_logging(&cli.log_format)?;
    info!("Panelkit v{} console starting...", VERSION);

    // 2. Load configuration (env, then CLI overrides)
    let mut config = RunnerConfig::from_env()?;
    if let Some(max_workers) = cli.max_workers {
        config.max_workers = max_workers;
    }
    if let Some(queue_capacity) = cli.queue_capacity {
        config.queue_capacity = queue_capacity;
    }

    // 3. Interactive thread + runner
    let (ui, ui_thread) = EventLoopHandle::spawn("panelkit-ui").context("UI thread spawn failed")?;
    let runner = JobRunner::new(config, Arc::new(ui.clone()))?;

    // 4. Session
    let session = Arc::new(SimulatedSession::new(
        Duration::from_millis(cli.latency_ms),
        vec![ACL_OBJECT],
        cli.failure.clone(),
    ));
    SessionRegistry::global().set(session.clone());

    // 5. Open pages and submit, on the interactive thread
    let opened = {
        let runner = runner.clone();
        ui.call(move || open_pages(&runner)).await??
    };
    info!(jobs = opened.handles.len(), "Changes submitted, waiting for jobs");

    // 6. Wait for every job to be finalized
    for mut handle in opened.handles {
        let snapshot = handle.wait_finalized().await;
        info!(
            job = %handle.name(),
            state = %snapshot.state,
            succeeded = ?snapshot.succeeded,
            "Job settled"
        );
    }

    // 7. Report what the operator would see
    let pages = opened.pages;
    let areas = opened.areas;
    ui.call(move || {
        for page in &pages {
            info!(page = %page.title(), valid = page.is_valid(), "Page state");
        }
        for area in &areas {
            for message in area.messages() {
                info!(level = ?message.level, text = %message.text, "Message area");
            }
        }
    })
    .await?;
    info!(applied = session.applied(), "Server-side modifications");

    // 8. Shutdown: drain the runner before the interactive thread goes away
    runner.drain().await;
    SessionRegistry::global().clear();
    ui.quit();
    let processed = tokio::task::spawn_blocking(move || ui_thread.join()).await?;
    info!(processed, "Shutdown complete.");

    Ok(())
}

fn init_logging(log_format: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Failed to create env filter")?;

    match log_format {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
    Ok(())
}

/// Runs on the interactive thread, the way a properties dialog would
fn open_pages(runner: &JobRunner) -> Result<OpenedPages> {
    let session = SessionRegistry::global().session()?;
    let mut opened = OpenedPages {
        handles: Vec::new(),
        pages: Vec::new(),
        areas: Vec::new(),
    };

    // Trusted objects: applies cleanly
    let trusted = Arc::new(SimulatedPage::new("Trusted Objects"));
    let trusted_area = Arc::new(MessageArea::new(trusted.title()));
    let md = ModificationRequest::new(TRUSTED_OBJECT).with("trustedObjects", vec![101, 102]);
    opened.handles.extend(
        ObjectUpdate::new(md, ApplyMode::Apply)
            .named("Update trusted objects")
            .message_surface(&trusted_area)
            .submit(runner, session.clone(), &trusted),
    );

    // Access control: server unreachable, error lands in the message area
    let acl = Arc::new(SimulatedPage::new("Access Control"));
    let acl_area = Arc::new(MessageArea::new(acl.title()));
    let md = ModificationRequest::new(ACL_OBJECT)
        .with("inheritAccessRights", false)
        .with("accessList", vec![1, 4]);
    opened.handles.extend(
        ObjectUpdate::new(md, ApplyMode::Apply)
            .named(format!("Update access control list for object {}", ACL_OBJECT))
            .message_surface(&acl_area)
            .submit(runner, session.clone(), &acl),
    );

    // Proxy assignment: dialog closed while the change is in flight
    let proxy = Arc::new(SimulatedPage::new("Communications"));
    let proxy_area = Arc::new(MessageArea::new(proxy.title()));
    let md = ModificationRequest::new(PROXY_OBJECT).with("agentProxy", 7);
    opened.handles.extend(
        ObjectUpdate::new(md, ApplyMode::Apply)
            .message_surface(&proxy_area)
            .submit(runner, session.clone(), &proxy),
    );
    proxy.dispose();
    proxy_area.dispose();
    drop(proxy);
    drop(proxy_area);

    // Nothing changed on "OK": no round-trip
    let unchanged = Arc::new(SimulatedPage::new("Comments"));
    if ObjectUpdate::new(ModificationRequest::new(TRUSTED_OBJECT), ApplyMode::Ok)
        .submit(runner, session, &unchanged)
        .is_none()
    {
        info!(page = %unchanged.title(), "No changes to submit");
    }

    // Free-standing job: refresh a list from the body, no page to re-enable
    let user_page = Arc::downgrade(&acl);
    opened.handles.push(
        runner.start(
            Job::new("Synchronize users", move |ctx| {
                ctx.report("Fetching missing users");
                let page = user_page.clone();
                ctx.run_in_ui_thread(move || {
                    if let Some(page) = page.upgrade() {
                        info!(page = %page.title(), "User list refreshed");
                    }
                });
                Ok(())
            })
            .progress(Arc::new(TracingProgress))
            .message_surface(&acl_area)
            .error_prefix("Cannot synchronize users")
            .finalize(|outcome| {
                if !outcome.is_success() {
                    warn!("User synchronization did not complete");
                }
            }),
        ),
    );

    opened.pages.extend([trusted, acl, unchanged]);
    opened.areas.extend([trusted_area, acl_area]);
    Ok(opened)
}
