use async_trait::async_trait;
use std::future::Future;

/// Handles one kind of error.
///
/// Implemented for every `Fn(E) -> impl Future<Output = anyhow::Result<()>>`,
/// so async closures can be registered directly:
///
/// ```
/// # use controlkit::ErrorDispatcher;
/// #[derive(Debug)]
/// struct Offline;
///
/// let dispatcher = ErrorDispatcher::default();
/// dispatcher.set_error_handler::<Offline, _>(|_: Offline| async move {
///     // show the offline banner
///     anyhow::Ok(())
/// });
/// assert!(dispatcher.has_error_handler::<Offline>());
/// ```
#[async_trait]
pub trait ErrorHandler<E: Send + 'static>: Send + Sync {
    async fn handle(&self, error: E) -> anyhow::Result<()>;
}

#[async_trait]
impl<E, F, Fut> ErrorHandler<E> for F
where
    E: Send + 'static,
    F: Fn(E) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, error: E) -> anyhow::Result<()> {
        (self)(error).await
    }
}

/// Adapts a plain synchronous closure into an [`ErrorHandler`].
pub(crate) struct SyncHandler<F>(pub(crate) F);

#[async_trait]
impl<E, F> ErrorHandler<E> for SyncHandler<F>
where
    E: Send + 'static,
    F: Fn(E) + Send + Sync + 'static,
{
    async fn handle(&self, error: E) -> anyhow::Result<()> {
        (self.0)(error);
        Ok(())
    }
}
