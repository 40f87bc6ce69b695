use super::context::BuildContext;
use super::error::ExtractionError;
use async_trait::async_trait;

#[async_trait]
pub trait ExtractionPhase: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs the phase and returns how many items it extracted
    async fn execute(&self, context: &mut BuildContext) -> Result<usize, ExtractionError>;
}
