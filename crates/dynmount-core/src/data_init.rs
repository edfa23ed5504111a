//! Post-construction data handshake.
//!
//! Every mountable type implements [`Component`]. Components that accept
//! initialization data expose a [`DataInit`] through
//! [`Component::as_data_init`]; the loader hands the caller's data to it
//! right after the instance is created and waits for the returned
//! [`InitCompletion`] before yielding the instance.

use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, Stream, StreamExt};

/// A type the loader can mount.
pub trait Component: Send + 'static {
    /// Data accepted by [`DataInit::set_init_data`]. Use `()` when the
    /// component takes none.
    type InitData: Send + 'static;

    /// Optional-interface query for the data handshake.
    ///
    /// Returning `None` (the default) makes the loader drop any supplied
    /// data and treat the handshake as complete.
    fn as_data_init(&mut self) -> Option<&mut dyn DataInit<Self::InitData>> {
        None
    }
}

/// Accepts initialization data after construction.
pub trait DataInit<D>: Send {
    fn set_init_data(&mut self, data: Option<D>) -> InitCompletion;
}

/// How a [`DataInit`] reports that the data has been applied.
pub enum InitCompletion {
    /// Applied synchronously.
    Ready,
    /// Applied once the future settles.
    Pending(BoxFuture<'static, anyhow::Result<()>>),
    /// Applied on the stream's first notification: an `Ok` item or the
    /// stream ending completes the handshake, an `Err` item fails it. The
    /// stream is dropped afterwards.
    Acknowledge(BoxStream<'static, anyhow::Result<()>>),
}

impl InitCompletion {
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        InitCompletion::Pending(future.boxed())
    }

    pub fn acknowledge<S>(stream: S) -> Self
    where
        S: Stream<Item = anyhow::Result<()>> + Send + 'static,
    {
        InitCompletion::Acknowledge(stream.boxed())
    }

    /// Wait for the handshake to finish.
    pub async fn settle(self) -> anyhow::Result<()> {
        match self {
            InitCompletion::Ready => Ok(()),
            InitCompletion::Pending(future) => future.await,
            InitCompletion::Acknowledge(mut acks) => match acks.next().await {
                Some(Ok(())) | None => Ok(()),
                Some(Err(e)) => Err(e),
            },
        }
    }
}

impl fmt::Debug for InitCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            InitCompletion::Ready => "Ready",
            InitCompletion::Pending(_) => "Pending",
            InitCompletion::Acknowledge(_) => "Acknowledge",
        };
        f.write_str(kind)
    }
}

/// Hand `data` to the instance if it takes part in the handshake.
pub(crate) fn begin_handshake<C: Component>(
    instance: &mut C,
    data: Option<C::InitData>,
) -> InitCompletion {
    match instance.as_data_init() {
        Some(target) => target.set_init_data(data),
        None => InitCompletion::Ready,
    }
}

/// Stores the data handed over by the loader.
///
/// Embed it in a component and return it from
/// [`Component::as_data_init`] to accept data without writing a handshake.
#[derive(Debug, Clone)]
pub struct InitData<D> {
    data: Option<D>,
    applied: bool,
}

impl<D> Default for InitData<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> InitData<D> {
    pub fn new() -> Self {
        Self {
            data: None,
            applied: false,
        }
    }

    /// Data injected at initialization.
    pub fn get(&self) -> Option<&D> {
        self.data.as_ref()
    }

    pub fn take(&mut self) -> Option<D> {
        self.data.take()
    }

    /// True once the loader ran the handshake, even with no data.
    pub fn is_applied(&self) -> bool {
        self.applied
    }
}

impl<D: Send> DataInit<D> for InitData<D> {
    fn set_init_data(&mut self, data: Option<D>) -> InitCompletion {
        self.data = data;
        self.applied = true;
        InitCompletion::Ready
    }
}
