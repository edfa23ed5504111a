//! Dynamic component loading.
//!
//! [`ComponentLoader::load`] runs one pipeline per call:
//!
//! 1. resolve the [`ComponentSource`] (running a lazy loader if needed);
//! 2. subscribe to the target mount point and take the first present
//!    handle, waiting for one to be registered if necessary;
//! 3. create the instance at that handle through the [`Renderer`];
//! 4. run the data-init handshake;
//! 5. return the instance.
//!
//! Concurrent loads into the same mount point are not serialized: each one
//! pairs with whatever handle is active when its own resolution finishes.
//! Dropping the returned future stops the pipeline where it is; nothing
//! already created is torn down.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, warn};

use crate::config::MountConfig;
use crate::data_init::{begin_handshake, Component};
use crate::descriptor::{ComponentSource, ComponentType};
use crate::error::{MountError, Result};
use crate::registry::MountPointRegistry;
use crate::renderer::Renderer;

/// Loads components into the mount points of one registry.
pub struct ComponentLoader<R: Renderer> {
    registry: Arc<MountPointRegistry<R>>,
}

impl<R: Renderer> Clone for ComponentLoader<R> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<R: Renderer> ComponentLoader<R> {
    pub fn new(registry: Arc<MountPointRegistry<R>>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<MountPointRegistry<R>> {
        &self.registry
    }

    /// Load a component into `mount_name` and hand it `data`.
    ///
    /// Suspends until the mount point has a handle. Any stage failure aborts
    /// the load without undoing earlier stages: a component whose handshake
    /// fails stays mounted.
    pub async fn load<C: Component>(
        &self,
        source: impl Into<ComponentSource<C>>,
        data: Option<C::InitData>,
        mount_name: &str,
    ) -> Result<C> {
        let source = source.into();
        let kind = if source.is_manifest() { "lazy" } else { "eager" };
        debug!("Loading {} ({}) into mount point {}", source.label(), kind, mount_name);

        let descriptor = source.resolve().await.inspect_err(|e| {
            warn!("Failed to resolve {}: {}", source.label(), e);
        })?;

        let handle = self.wait_for_handle(mount_name).await?;
        let mut instance = self.create(&descriptor, &handle, mount_name)?;

        begin_handshake(&mut instance, data)
            .settle()
            .await
            .map_err(|source| {
                warn!("Data init failed for {}: {}", descriptor.name(), source);
                MountError::DataInit {
                    component: descriptor.name().to_string(),
                    source,
                }
            })?;

        debug!("Loaded {} into mount point {}", descriptor.name(), mount_name);
        Ok(instance)
    }

    /// [`load`](Self::load) into [`MountConfig::DEFAULT_MOUNT_NAME`].
    pub async fn load_default<C: Component>(
        &self,
        source: impl Into<ComponentSource<C>>,
        data: Option<C::InitData>,
    ) -> Result<C> {
        self.load(source, data, MountConfig::DEFAULT_MOUNT_NAME).await
    }

    /// First present handle observed from now on.
    async fn wait_for_handle(&self, mount_name: &str) -> Result<R::Handle> {
        let mut handles = self.registry.subscribe_to_handle(mount_name);
        if !self.registry.contains(mount_name) {
            debug!("Waiting for mount point {}", mount_name);
        }

        handles.next().await.ok_or_else(|| {
            warn!("Mount point {} was discarded before a handle arrived", mount_name);
            MountError::MountPointClosed {
                name: mount_name.to_string(),
            }
        })
    }

    fn create<C: Component>(
        &self,
        descriptor: &ComponentType<C>,
        handle: &R::Handle,
        mount_name: &str,
    ) -> Result<C> {
        self.registry
            .renderer()
            .create(descriptor, handle)
            .map_err(|source| {
                warn!(
                    "Failed to create {} at mount point {}: {}",
                    descriptor.name(),
                    mount_name,
                    source
                );
                MountError::Render {
                    component: descriptor.name().to_string(),
                    mount: mount_name.to_string(),
                    source,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::data_init::{DataInit, InitCompletion, InitData};
    use crate::descriptor::ComponentManifest;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::oneshot;

    /// Renderer that records every creation as `(component, handle)`.
    #[derive(Default)]
    struct TestRenderer {
        created: Mutex<Vec<(String, u32)>>,
        fail: AtomicBool,
    }

    impl TestRenderer {
        fn created(&self) -> Vec<(String, u32)> {
            self.created.lock().unwrap().clone()
        }
    }

    impl Renderer for TestRenderer {
        type Handle = u32;

        fn create<C: Component>(
            &self,
            descriptor: &ComponentType<C>,
            handle: &u32,
        ) -> anyhow::Result<C> {
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("mount point detached");
            }
            self.created
                .lock()
                .unwrap()
                .push((descriptor.name().to_string(), *handle));
            Ok(descriptor.instantiate())
        }

        fn clear(&self, _handle: &u32) {}
    }

    #[derive(Debug, Default)]
    struct Widget {
        init: InitData<u32>,
    }

    impl Component for Widget {
        type InitData = u32;

        fn as_data_init(&mut self) -> Option<&mut dyn DataInit<u32>> {
            Some(&mut self.init)
        }
    }

    struct Static;

    impl Component for Static {
        type InitData = ();
    }

    /// Handshake that settles when the test says so.
    struct Gated {
        gate: Option<oneshot::Receiver<()>>,
    }

    impl Component for Gated {
        type InitData = ();

        fn as_data_init(&mut self) -> Option<&mut dyn DataInit<()>> {
            Some(self)
        }
    }

    impl DataInit<()> for Gated {
        fn set_init_data(&mut self, _data: Option<()>) -> InitCompletion {
            let gate = self.gate.take();
            InitCompletion::pending(async move {
                if let Some(gate) = gate {
                    gate.await?;
                }
                Ok(())
            })
        }
    }

    #[derive(Debug)]
    struct Failing;

    impl Component for Failing {
        type InitData = ();

        fn as_data_init(&mut self) -> Option<&mut dyn DataInit<()>> {
            Some(self)
        }
    }

    impl DataInit<()> for Failing {
        fn set_init_data(&mut self, _data: Option<()>) -> InitCompletion {
            InitCompletion::acknowledge(futures::stream::iter(vec![Err(anyhow::anyhow!(
                "bad payload"
            ))]))
        }
    }

    /// Acknowledges once and keeps its stream open.
    #[derive(Debug)]
    struct Subscribed;

    impl Component for Subscribed {
        type InitData = ();

        fn as_data_init(&mut self) -> Option<&mut dyn DataInit<()>> {
            Some(self)
        }
    }

    impl DataInit<()> for Subscribed {
        fn set_init_data(&mut self, _data: Option<()>) -> InitCompletion {
            InitCompletion::acknowledge(
                futures::stream::iter(vec![Ok(())]).chain(futures::stream::pending()),
            )
        }
    }

    /// Rejects its handshake future.
    #[derive(Debug)]
    struct Rejecting;

    impl Component for Rejecting {
        type InitData = u32;

        fn as_data_init(&mut self) -> Option<&mut dyn DataInit<u32>> {
            Some(self)
        }
    }

    impl DataInit<u32> for Rejecting {
        fn set_init_data(&mut self, data: Option<u32>) -> InitCompletion {
            InitCompletion::pending(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                anyhow::bail!("cannot apply {:?}", data)
            })
        }
    }

    fn setup(config: RegistryConfig) -> (Arc<TestRenderer>, ComponentLoader<TestRenderer>) {
        let renderer = Arc::new(TestRenderer::default());
        let registry = Arc::new(MountPointRegistry::with_config(renderer.clone(), config));
        (renderer, ComponentLoader::new(registry))
    }

    fn widget_type() -> ComponentType<Widget> {
        ComponentType::new("Widget", Widget::default)
    }

    #[tokio::test]
    async fn test_load_into_registered_mount_point() {
        let (renderer, loader) = setup(RegistryConfig::default());
        loader.registry().register("main", 1, true).unwrap();

        let widget: Widget = loader.load(widget_type(), Some(42), "main").await.unwrap();
        assert_eq!(widget.init.get(), Some(&42));
        assert_eq!(renderer.created(), vec![("Widget".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_load_without_data_init_ignores_data() {
        let (renderer, loader) = setup(RegistryConfig::default());
        loader.registry().register("main", 3, true).unwrap();

        let _: Static = loader
            .load(ComponentType::new("Static", || Static), Some(()), "main")
            .await
            .unwrap();
        assert_eq!(renderer.created(), vec![("Static".to_string(), 3)]);
    }

    #[tokio::test]
    async fn test_load_default_mount_point() {
        let (renderer, loader) = setup(RegistryConfig::default());
        loader
            .registry()
            .register(MountConfig::DEFAULT_MOUNT_NAME, 9, false)
            .unwrap();

        let widget: Widget = loader.load_default(widget_type(), None).await.unwrap();
        assert!(widget.init.is_applied());
        assert_eq!(widget.init.get(), None);
        assert_eq!(renderer.created()[0].1, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_before_register_waits() {
        let (renderer, loader) = setup(RegistryConfig::default());
        let registry = loader.registry().clone();

        let pending = tokio::spawn(async move {
            let widget: Widget = loader.load(widget_type(), None, "main").await.unwrap();
            widget
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!pending.is_finished());
        assert!(renderer.created().is_empty());

        registry.register("main", 7, true).unwrap();
        pending.await.unwrap();
        assert_eq!(renderer.created(), vec![("Widget".to_string(), 7)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_is_paired_after_resolution() {
        let (renderer, loader) = setup(RegistryConfig {
            allow_override: true,
            throw_on_override_violation: true,
        });
        let registry = loader.registry().clone();
        registry.register("main", 1, true).unwrap();

        let manifest = ComponentManifest::named(
            "widget-chunk",
            || async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(widget_type())
            },
            |descriptor: ComponentType<Widget>| descriptor,
        );
        let pending = tokio::spawn(async move {
            let widget: Widget = loader.load(manifest, None, "main").await.unwrap();
            widget
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        registry.register("main", 2, true).unwrap();

        pending.await.unwrap();
        assert_eq!(renderer.created(), vec![("Widget".to_string(), 2)]);
    }

    fn gated_type(gate: oneshot::Receiver<()>) -> ComponentType<Gated> {
        let gate = Arc::new(Mutex::new(Some(gate)));
        ComponentType::new("Gated", move || Gated {
            gate: gate.lock().unwrap().take(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_captured_handle_survives_unregister() {
        let (renderer, loader) = setup(RegistryConfig::default());
        let registry = loader.registry().clone();
        registry.register("main", 5, true).unwrap();

        let (open, gate) = oneshot::channel();
        let pending = tokio::spawn(async move {
            let _: Gated = loader.load(gated_type(gate), None, "main").await.unwrap();
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(renderer.created(), vec![("Gated".to_string(), 5)]);
        assert!(registry.unregister("main"));

        open.send(()).unwrap();
        pending.await.unwrap();
        assert_eq!(renderer.created().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_waits_for_pending_handshake() {
        let (_renderer, loader) = setup(RegistryConfig::default());
        loader.registry().register("main", 1, true).unwrap();

        let (open, gate) = oneshot::channel();
        let descriptor = gated_type(gate);

        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        let pending = tokio::spawn(async move {
            let _: Gated = loader.load(descriptor, None, "main").await.unwrap();
            flag.store(true, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!finished.load(Ordering::SeqCst));

        open.send(()).unwrap();
        pending.await.unwrap();
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_lazy_load_failure_skips_creation() {
        let (renderer, loader) = setup(RegistryConfig::default());
        loader.registry().register("main", 1, true).unwrap();

        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let manifest = ComponentManifest::named(
            "broken",
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err::<ComponentType<Widget>, _>(anyhow::anyhow!("offline")) }
            },
            |descriptor: ComponentType<Widget>| descriptor,
        );

        let result: Result<Widget> = loader.load(manifest, None, "main").await;
        let err = result.unwrap_err();
        assert!(matches!(err, MountError::LazyLoad { .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(renderer.created().is_empty());
    }

    #[tokio::test]
    async fn test_render_failure() {
        let (renderer, loader) = setup(RegistryConfig::default());
        loader.registry().register("main", 1, true).unwrap();
        renderer.fail.store(true, Ordering::SeqCst);

        let result: Result<Widget> = loader.load(widget_type(), None, "main").await;
        match result.unwrap_err() {
            MountError::Render { component, mount, .. } => {
                assert_eq!(component, "Widget");
                assert_eq!(mount, "main");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_handshake_failure_keeps_instance_mounted() {
        let (renderer, loader) = setup(RegistryConfig::default());
        loader.registry().register("main", 4, true).unwrap();

        let result: Result<Failing> = loader
            .load(ComponentType::new("Failing", || Failing), None, "main")
            .await;
        let err = result.unwrap_err();
        assert!(matches!(err, MountError::DataInit { ref component, .. } if component == "Failing"));
        assert_eq!(renderer.created(), vec![("Failing".to_string(), 4)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_completes_on_first_ack_of_open_stream() {
        let (renderer, loader) = setup(RegistryConfig::default());
        loader.registry().register("main", 6, true).unwrap();

        let loaded = tokio::time::timeout(
            Duration::from_secs(3600),
            loader.load(ComponentType::new("Subscribed", || Subscribed), None, "main"),
        )
        .await
        .expect("load still waiting after the first acknowledgement");
        assert!(loaded.is_ok());
        assert_eq!(renderer.created(), vec![("Subscribed".to_string(), 6)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_rejection_fails_load_and_keeps_instance() {
        let (renderer, loader) = setup(RegistryConfig::default());
        loader.registry().register("main", 8, true).unwrap();

        let result: Result<Rejecting> = loader
            .load(ComponentType::new("Rejecting", || Rejecting), Some(3), "main")
            .await;
        match result.unwrap_err() {
            MountError::DataInit { component, source } => {
                assert_eq!(component, "Rejecting");
                assert_eq!(source.to_string(), "cannot apply Some(3)");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(renderer.created(), vec![("Rejecting".to_string(), 8)]);
    }

    #[tokio::test]
    async fn test_reset_while_waiting() {
        let (_renderer, loader) = setup(RegistryConfig::default());
        let registry = loader.registry().clone();

        let pending = tokio::spawn(async move {
            let loaded: Result<Widget> = loader.load(widget_type(), None, "main").await;
            loaded.map(|_| ())
        });
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        registry.reset();
        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, MountError::MountPointClosed { ref name } if name == "main"));
    }
}
