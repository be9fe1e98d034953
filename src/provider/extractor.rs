//! The external producer a provider supervises. Opaque to the rest of the
//! core beyond its output type and its ability to fail or run long.

use async_trait::async_trait;

#[async_trait]
pub trait Extractor<T>: Send + Sync {
    /// Produces the model for a single target. Long-running extractions are
    /// expected to be cancellation-safe: the provider wraps every call in a
    /// timeout and drops the future on expiry.
    async fn extract(&self, target: &str) -> anyhow::Result<T>;
}

/// Adapts a plain async closure into an [`Extractor`], for targets simple
/// enough not to need their own named type.
pub struct FnExtractor<F>(pub F);

#[async_trait]
impl<T, F, Fut> Extractor<T> for FnExtractor<F>
where
    T: Send + 'static,
    F: Fn(&str) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = anyhow::Result<T>> + Send,
{
    async fn extract(&self, target: &str) -> anyhow::Result<T> {
        (self.0)(target).await
    }
}
