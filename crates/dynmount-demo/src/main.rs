//! dynmount Demo - Walk through the mount-point load pipeline.
//!
//! Runs the core library against an in-memory text renderer and prints the
//! resulting tree, so the registration and load ordering can be watched
//! from the logs.

mod panels;
mod text_renderer;
mod walkthrough;

use anyhow::{Context, Result};
use clap::Parser;
use dynmount_core::RegistryConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::panels::PanelData;
use crate::walkthrough::WalkthroughOptions;

#[derive(Parser, Debug)]
#[command(name = "dynmount-demo")]
#[command(about = "Mount a lazily loaded panel into a named mount point")]
struct Args {
    /// Mount point the status panel is loaded into
    #[arg(short, long, default_value = "sidebar")]
    mount: String,

    /// Panel title
    #[arg(long, default_value = "Status")]
    title: String,

    /// Panel items, repeatable
    #[arg(long = "item")]
    items: Vec<String>,

    /// Time the simulated chunk takes to load, in milliseconds
    #[arg(long, default_value = "150")]
    chunk_delay_ms: u64,

    /// Time before the mount point is attached, in milliseconds
    #[arg(long, default_value = "300")]
    host_delay_ms: u64,

    /// JSON file with the registry policy (allowOverride, throwOnOverrideViolation)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn load_registry_config(path: Option<&PathBuf>) -> Result<RegistryConfig> {
    let Some(path) = path else {
        return Ok(RegistryConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read registry config {}", path.display()))?;
    Ok(RegistryConfig::from_json_str(&content)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let registry = load_registry_config(args.config.as_ref())?;
    info!("Registry policy: {}", registry.to_json_string()?);

    let summary = walkthrough::run(WalkthroughOptions {
        mount: args.mount,
        data: PanelData {
            title: args.title,
            items: args.items,
        },
        chunk_delay: Duration::from_millis(args.chunk_delay_ms),
        host_delay: Duration::from_millis(args.host_delay_ms),
        registry,
    })
    .await?;

    info!("Mount points: {}", summary.mount_names.join(", "));
    if let Some(data) = &summary.panel_data {
        info!("Panel {} applied {} item(s)", data.title, data.items.len());
    }
    if let Some(heading) = &summary.heading {
        info!("Banner heading: {}", heading);
    }

    // Rendered tree goes to stdout
    println!("{}", summary.tree);
    Ok(())
}
