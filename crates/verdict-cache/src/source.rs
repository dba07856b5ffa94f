use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::DecisionError;
use crate::model::AuthzRequest;

/// The policy engine behind the cache. Must be deterministic for a fixed
/// policy version; may be slow.
#[async_trait]
pub trait DecisionSource: Send + Sync {
    async fn evaluate(&self, request: &AuthzRequest) -> Result<bool, DecisionError>;
}

#[async_trait]
impl<T: DecisionSource + ?Sized> DecisionSource for Arc<T> {
    async fn evaluate(&self, request: &AuthzRequest) -> Result<bool, DecisionError> {
        (**self).evaluate(request).await
    }
}

/// Adapts a plain closure into a [`DecisionSource`].
pub struct FnSource<F>(pub F);

#[async_trait]
impl<F> DecisionSource for FnSource<F>
where
    F: Fn(&AuthzRequest) -> Result<bool, DecisionError> + Send + Sync,
{
    async fn evaluate(&self, request: &AuthzRequest) -> Result<bool, DecisionError> {
        (self.0)(request)
    }
}
