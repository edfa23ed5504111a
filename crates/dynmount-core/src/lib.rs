//! dynmount Core - Named mount points and an async component load pipeline.
//!
//! UI code registers insertion points ("mount points") under string names;
//! other code asks for a component to be created at a named mount point
//! without holding a reference to it. A load may start before its mount
//! point exists and completes once one is registered.
//!
//! The crate never renders anything itself. The host UI toolkit plugs in
//! through the [`Renderer`] trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dynmount_core::{HostOptions, MountScope};
//!
//! #[tokio::main]
//! async fn main() -> dynmount_core::Result<()> {
//!     let scope = MountScope::builder(Arc::new(MyRenderer::new()))
//!         .allow_override(true)
//!         .build();
//!
//!     // Load before the mount point exists
//!     let loader = scope.loader().clone();
//!     let pending = tokio::spawn(async move {
//!         loader.load(panel_type(), Some(PanelData::default()), "sidebar").await
//!     });
//!
//!     // Registering the mount point lets the load finish
//!     let mut host = scope.host(HostOptions::named("sidebar"));
//!     host.attach(sidebar_handle)?;
//!
//!     let panel = pending.await.expect("load task panicked")?;
//!     Ok(())
//! }
//! ```

pub mod cell;
pub mod config;
pub mod data_init;
pub mod descriptor;
pub mod error;
pub mod host;
pub mod loader;
pub mod registry;
pub mod renderer;
pub mod scope;

// Re-export commonly used types
pub use cell::{CellSubscription, MountCell};
pub use config::{MountConfig, RegistryConfig};
pub use data_init::{Component, DataInit, InitCompletion, InitData};
pub use descriptor::{create_component_manifest, ComponentManifest, ComponentSource, ComponentType};
pub use error::{MountError, Result};
pub use host::{HostOptions, MountPointHost};
pub use loader::ComponentLoader;
pub use registry::{HandleStream, MountPointRegistry};
pub use renderer::Renderer;
pub use scope::{MountScope, MountScopeBuilder};
