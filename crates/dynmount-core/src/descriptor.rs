//! Component descriptors and lazy manifests.
//!
//! A [`ComponentSource`] is either a [`ComponentType`] that can be built
//! right away or a [`ComponentManifest`] whose loader has to run first.
//! Both resolve to a [`ComponentType`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use crate::error::{MountError, Result};

/// Immutable, cheaply clonable factory for component type `C`.
pub struct ComponentType<C> {
    name: Arc<str>,
    factory: Arc<dyn Fn() -> C + Send + Sync>,
}

impl<C> ComponentType<C> {
    /// Create a descriptor from a display name and a constructor.
    pub fn new(name: impl Into<String>, factory: impl Fn() -> C + Send + Sync + 'static) -> Self {
        Self {
            name: Arc::from(name.into()),
            factory: Arc::new(factory),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build a fresh, not yet mounted instance.
    pub fn instantiate(&self) -> C {
        (self.factory)()
    }
}

impl<C> Clone for ComponentType<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            factory: self.factory.clone(),
        }
    }
}

impl<C> fmt::Debug for ComponentType<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType").field("name", &self.name).finish()
    }
}

type ResolveFn<C> = dyn Fn() -> BoxFuture<'static, anyhow::Result<ComponentType<C>>> + Send + Sync;

/// Deferred component: a loader producing a module value plus a selector
/// picking the descriptor out of it.
pub struct ComponentManifest<C> {
    label: Arc<str>,
    resolve: Arc<ResolveFn<C>>,
}

impl<C: 'static> ComponentManifest<C> {
    /// Create a manifest labelled after the component type.
    pub fn new<M, L, Fut, S>(loader: L, selector: S) -> Self
    where
        M: Send + 'static,
        L: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<M>> + Send + 'static,
        S: Fn(M) -> ComponentType<C> + Send + Sync + 'static,
    {
        Self::named(std::any::type_name::<C>(), loader, selector)
    }

    /// Create a manifest with an explicit label for diagnostics.
    pub fn named<M, L, Fut, S>(label: impl Into<String>, loader: L, selector: S) -> Self
    where
        M: Send + 'static,
        L: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<M>> + Send + 'static,
        S: Fn(M) -> ComponentType<C> + Send + Sync + 'static,
    {
        let selector = Arc::new(selector);
        let resolve = move || {
            let module = loader();
            let selector = selector.clone();
            async move {
                let module = module.await?;
                Ok::<_, anyhow::Error>(selector(module))
            }
            .boxed()
        };

        Self {
            label: Arc::from(label.into()),
            resolve: Arc::new(resolve),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Run the loader once and apply the selector. No retry on failure.
    pub async fn load(&self) -> Result<ComponentType<C>> {
        debug!("Lazy loading manifest {}", self.label);
        let descriptor = (self.resolve)()
            .await
            .map_err(|source| MountError::LazyLoad {
                manifest: self.label.to_string(),
                source,
            })?;
        debug!("Manifest {} resolved to {}", self.label, descriptor.name());
        Ok(descriptor)
    }
}

impl<C> Clone for ComponentManifest<C> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            resolve: self.resolve.clone(),
        }
    }
}

impl<C> fmt::Debug for ComponentManifest<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentManifest")
            .field("label", &self.label)
            .finish()
    }
}

/// Helper to create a component manifest.
///
/// ```rust,ignore
/// let manifest = create_component_manifest(
///     || async { Ok(settings_chunk::load().await) },
///     |module| module.panel(),
/// );
/// ```
pub fn create_component_manifest<C, M, L, Fut, S>(loader: L, selector: S) -> ComponentManifest<C>
where
    C: 'static,
    M: Send + 'static,
    L: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<M>> + Send + 'static,
    S: Fn(M) -> ComponentType<C> + Send + Sync + 'static,
{
    ComponentManifest::new(loader, selector)
}

/// What a caller hands to the loader.
pub enum ComponentSource<C> {
    /// Immediately constructible component.
    Type(ComponentType<C>),
    /// Component behind a lazy loader.
    Manifest(ComponentManifest<C>),
}

impl<C: 'static> ComponentSource<C> {
    pub fn is_manifest(&self) -> bool {
        matches!(self, ComponentSource::Manifest(_))
    }

    /// Descriptor name or manifest label.
    pub fn label(&self) -> &str {
        match self {
            ComponentSource::Type(descriptor) => descriptor.name(),
            ComponentSource::Manifest(manifest) => manifest.label(),
        }
    }

    /// Normalize into a concrete descriptor.
    pub async fn resolve(&self) -> Result<ComponentType<C>> {
        match self {
            ComponentSource::Type(descriptor) => Ok(descriptor.clone()),
            ComponentSource::Manifest(manifest) => manifest.load().await,
        }
    }
}

impl<C> Clone for ComponentSource<C> {
    fn clone(&self) -> Self {
        match self {
            ComponentSource::Type(descriptor) => ComponentSource::Type(descriptor.clone()),
            ComponentSource::Manifest(manifest) => ComponentSource::Manifest(manifest.clone()),
        }
    }
}

impl<C> fmt::Debug for ComponentSource<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentSource::Type(descriptor) => f.debug_tuple("Type").field(descriptor).finish(),
            ComponentSource::Manifest(manifest) => {
                f.debug_tuple("Manifest").field(manifest).finish()
            }
        }
    }
}

impl<C> From<ComponentType<C>> for ComponentSource<C> {
    fn from(descriptor: ComponentType<C>) -> Self {
        ComponentSource::Type(descriptor)
    }
}

impl<C> From<ComponentManifest<C>> for ComponentSource<C> {
    fn from(manifest: ComponentManifest<C>) -> Self {
        ComponentSource::Manifest(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, PartialEq)]
    struct Banner(&'static str);

    struct BannerModule {
        banner: ComponentType<Banner>,
    }

    fn banner_type() -> ComponentType<Banner> {
        ComponentType::new("Banner", || Banner("hello"))
    }

    #[tokio::test]
    async fn test_plain_descriptor_resolves_to_itself() {
        let source = ComponentSource::from(banner_type());
        assert!(!source.is_manifest());

        let resolved = source.resolve().await.unwrap();
        assert_eq!(resolved.name(), "Banner");
        assert_eq!(resolved.instantiate(), Banner("hello"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manifest_invokes_loader_once_then_selector() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let manifest = ComponentManifest::named(
            "banner-chunk",
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(BannerModule {
                        banner: banner_type(),
                    })
                }
            },
            |module: BannerModule| module.banner,
        );

        let source = ComponentSource::from(manifest);
        assert!(source.is_manifest());
        assert_eq!(source.label(), "banner-chunk");

        let resolved = source.resolve().await.unwrap();
        assert_eq!(resolved.name(), "Banner");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_loader_failure_is_lazy_load_error() {
        let manifest: ComponentManifest<Banner> = create_component_manifest(
            || async { Err::<BannerModule, _>(anyhow::anyhow!("chunk 404")) },
            |module: BannerModule| module.banner,
        );

        let err = manifest.load().await.unwrap_err();
        match err {
            MountError::LazyLoad { manifest, source } => {
                assert!(manifest.contains("Banner"));
                assert_eq!(source.to_string(), "chunk 404");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_descriptor_clones_share_factory() {
        let descriptor = banner_type();
        let copy = descriptor.clone();
        assert_eq!(copy.name(), descriptor.name());
        assert_eq!(copy.instantiate(), descriptor.instantiate());
        assert_eq!(format!("{:?}", descriptor), "ComponentType { name: \"Banner\" }");
    }
}
