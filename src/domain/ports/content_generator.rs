//! Content generator port.

use async_trait::async_trait;

use crate::domain::errors::GeneratorError;
use crate::domain::models::GenerationRequest;

/// Produces free-form text for a generation request.
///
/// Implementations make exactly one attempt per call. Retries and output
/// decoding belong to the caller.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate raw text for `request`.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GeneratorError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
