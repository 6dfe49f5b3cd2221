use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by a persistence call.
pub type SaveFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// Durable storage for snapshots of type `S`.
///
/// Any `Err` counts as a failed attempt; the engine never inspects it beyond
/// its message. Saving the same snapshot twice must be harmless.
pub trait Persist<S>: Send + Sync + 'static {
    fn save(&self, snapshot: S) -> SaveFuture;
}

impl<S, P: Persist<S>> Persist<S> for Arc<P> {
    fn save(&self, snapshot: S) -> SaveFuture {
        (**self).save(snapshot)
    }
}

/// Adapter turning an async closure into a [`Persist`] implementation.
pub struct PersistFn<F>(F);

pub fn persist_fn<F>(f: F) -> PersistFn<F> {
    PersistFn(f)
}

impl<S, F, Fut> Persist<S> for PersistFn<F>
where
    F: Fn(S) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn save(&self, snapshot: S) -> SaveFuture {
        Box::pin((self.0)(snapshot))
    }
}
