//! End-to-end run of the load pipeline against a [`TextRenderer`].

use std::sync::Arc;
use std::time::Duration;

use dynmount_core::{HostOptions, MountConfig, MountScope, RegistryConfig};
use tokio::time::sleep;
use tracing::info;

use crate::panels::{banner_type, footer_type, status_manifest, PanelData};
use crate::text_renderer::TextRenderer;

/// Knobs for one walkthrough.
#[derive(Debug, Clone)]
pub struct WalkthroughOptions {
    pub mount: String,
    pub data: PanelData,
    pub chunk_delay: Duration,
    pub host_delay: Duration,
    pub registry: RegistryConfig,
}

/// What the walkthrough produced.
#[derive(Debug)]
pub struct Summary {
    pub tree: String,
    pub panel_data: Option<PanelData>,
    pub heading: Option<String>,
    pub mount_names: Vec<String>,
}

/// Start a lazy load before its mount point exists, attach the host
/// afterwards, then fill the default mount point as well.
pub async fn run(options: WalkthroughOptions) -> anyhow::Result<Summary> {
    let renderer = Arc::new(TextRenderer::new());
    let scope = MountScope::builder(renderer.clone())
        .with_config(options.registry)
        .build();

    let loader = scope.loader().clone();
    let manifest = status_manifest(options.chunk_delay);
    let mount = options.mount.clone();
    let data = options.data.clone();
    let pending = tokio::spawn(async move { loader.load(manifest, Some(data), &mount).await });

    sleep(options.host_delay).await;
    let slot = renderer.add_slot(&format!("/app/{}", options.mount));
    let mut host = scope.host(HostOptions::named(options.mount.clone()));
    host.attach(slot)?;
    info!("Attached host {}", options.mount);

    let panel = pending.await??;
    info!("Status panel mounted in {}", options.mount);

    let root = renderer.add_slot("/app/root");
    let mut root_host = scope.host(HostOptions::default());
    root_host.attach(root)?;
    let banner = scope
        .loader()
        .load_default(banner_type(), Some("dynmount".to_string()))
        .await?;
    scope.loader().load_default(footer_type(), None).await?;

    let summary = Summary {
        tree: renderer.render(),
        panel_data: panel.data,
        heading: banner.heading.get().cloned(),
        mount_names: scope.registry().names(),
    };

    // Tear down in UI order: empty the slot, drop the host, drop the slot
    scope
        .registry()
        .clear_mount_point(MountConfig::DEFAULT_MOUNT_NAME);
    host.detach();
    root_host.detach();
    renderer.remove_slot(&format!("/app/{}", options.mount));
    renderer.remove_slot("/app/root");
    info!("Remaining tree: [{}]", renderer.render());
    Ok(summary)
}
