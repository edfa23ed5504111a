//! Components mounted by the walkthrough.

use std::time::Duration;

use dynmount_core::{
    create_component_manifest, Component, ComponentManifest, ComponentType, DataInit,
    InitCompletion, InitData,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::sleep;

/// Payload handed to [`StatusPanel`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanelData {
    pub title: String,
    pub items: Vec<String>,
}

/// Applies its items in the background and acknowledges once when done.
///
/// The acknowledgement channel stays open afterwards, the way a
/// long-lived event channel would.
#[derive(Debug, Default)]
pub struct StatusPanel {
    pub data: Option<PanelData>,
}

impl Component for StatusPanel {
    type InitData = PanelData;

    fn as_data_init(&mut self) -> Option<&mut dyn DataInit<PanelData>> {
        Some(self)
    }
}

impl DataInit<PanelData> for StatusPanel {
    fn set_init_data(&mut self, data: Option<PanelData>) -> InitCompletion {
        let items = data.as_ref().map(|d| d.items.len()).unwrap_or(0);
        self.data = data;

        let (tx, rx) = mpsc::unbounded_channel::<anyhow::Result<()>>();
        tokio::spawn(async move {
            for _ in 0..items {
                sleep(Duration::from_millis(5)).await;
            }
            if tx.send(Ok(())).is_ok() {
                // Hold the channel open until the loader lets go of it
                tx.closed().await;
            }
        });

        InitCompletion::acknowledge(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|ack| (ack, rx))
        }))
    }
}

/// Stores a heading through the stock [`InitData`] holder.
#[derive(Debug, Default)]
pub struct Banner {
    pub heading: InitData<String>,
}

impl Component for Banner {
    type InitData = String;

    fn as_data_init(&mut self) -> Option<&mut dyn DataInit<String>> {
        Some(&mut self.heading)
    }
}

/// Takes no data.
#[derive(Debug, Default)]
pub struct Footer;

impl Component for Footer {
    type InitData = ();
}

/// What the simulated status chunk exports once loaded.
pub struct StatusModule {
    panel: ComponentType<StatusPanel>,
}

pub fn banner_type() -> ComponentType<Banner> {
    ComponentType::new("Banner", Banner::default)
}

pub fn footer_type() -> ComponentType<Footer> {
    ComponentType::new("Footer", || Footer)
}

/// Manifest for [`StatusPanel`] whose loader takes `delay` to resolve.
pub fn status_manifest(delay: Duration) -> ComponentManifest<StatusPanel> {
    create_component_manifest(
        move || async move {
            sleep(delay).await;
            Ok(StatusModule {
                panel: ComponentType::new("StatusPanel", StatusPanel::default),
            })
        },
        |module: StatusModule| module.panel,
    )
}
