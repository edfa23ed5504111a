//! Per-application wiring of one registry and one loader.

use std::sync::Arc;

use tracing::debug;

use crate::config::RegistryConfig;
use crate::host::{HostOptions, MountPointHost};
use crate::loader::ComponentLoader;
use crate::registry::MountPointRegistry;
use crate::renderer::Renderer;

/// One registry shared by every host and load of an application scope.
///
/// # Example
///
/// ```rust,ignore
/// let scope = MountScope::builder(Arc::new(renderer))
///     .allow_override(true)
///     .build();
///
/// let mut host = scope.host(HostOptions::named("sidebar"));
/// host.attach(sidebar_handle)?;
/// let panel = scope.loader().load(panel_type, Some(data), "sidebar").await?;
/// ```
pub struct MountScope<R: Renderer> {
    registry: Arc<MountPointRegistry<R>>,
    loader: ComponentLoader<R>,
}

impl<R: Renderer> Clone for MountScope<R> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            loader: self.loader.clone(),
        }
    }
}

impl<R: Renderer> MountScope<R> {
    /// Scope with the default registry policy.
    pub fn new(renderer: Arc<R>) -> Self {
        Self::builder(renderer).build()
    }

    pub fn builder(renderer: Arc<R>) -> MountScopeBuilder<R> {
        MountScopeBuilder::new(renderer)
    }

    pub fn registry(&self) -> &Arc<MountPointRegistry<R>> {
        &self.registry
    }

    pub fn loader(&self) -> &ComponentLoader<R> {
        &self.loader
    }

    /// Create an unattached host bound to this scope's registry.
    pub fn host(&self, options: HostOptions) -> MountPointHost<R> {
        MountPointHost::new(self.registry.clone(), options)
    }
}

/// Builder for a [`MountScope`].
pub struct MountScopeBuilder<R: Renderer> {
    renderer: Arc<R>,
    config: RegistryConfig,
}

impl<R: Renderer> MountScopeBuilder<R> {
    pub fn new(renderer: Arc<R>) -> Self {
        Self {
            renderer,
            config: RegistryConfig::default(),
        }
    }

    /// Allow hosts to replace active registrations.
    ///
    /// Default: `false`
    pub fn allow_override(mut self, allow: bool) -> Self {
        self.config.allow_override = allow;
        self
    }

    /// Fail instead of warn on a rejected registration.
    ///
    /// Default: `true`
    pub fn throw_on_override_violation(mut self, throw: bool) -> Self {
        self.config.throw_on_override_violation = throw;
        self
    }

    /// Replace the whole policy, e.g. one read with
    /// [`RegistryConfig::from_json_str`].
    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> MountScope<R> {
        debug!(
            "Building mount scope (allow_override={}, throw_on_override_violation={})",
            self.config.allow_override, self.config.throw_on_override_violation
        );
        let registry = Arc::new(MountPointRegistry::with_config(self.renderer, self.config));
        let loader = ComponentLoader::new(registry.clone());
        MountScope { registry, loader }
    }
}
