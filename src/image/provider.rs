//! Image provider trait.

use crate::error::Result;
use crate::image::request::GenerationRequest;
use crate::image::response::GenerationResponse;
use async_trait::async_trait;

/// Trait for services that turn a [`GenerationRequest`] into a response.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Fails with `Auth` when no usable credential is configured.
    ///
    /// Must not touch the network.
    fn ensure_credentials(&self) -> Result<()> {
        Ok(())
    }

    /// Performs exactly one generation call and returns the raw response.
    async fn generate_content(&self, request: &GenerationRequest) -> Result<GenerationResponse>;

    /// Returns the model identifier used for generation.
    fn model(&self) -> &str;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str;

    /// Checks if the provider is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}
