use crate::error::Result;

/// Port for free-text project commentary
///
/// Implementations wrap an external text-generation service. Callers treat
/// the result as best effort: see [`crate::insights::project_insights`].
pub trait CommentaryService: Send + Sync {
    /// Generate text based on a prompt and optional context
    ///
    /// # Arguments
    /// * `prompt` - The instruction for the service
    /// * `context` - Data the commentary should be grounded on
    ///
    /// # Returns
    /// Generated text string
    fn generate(&self, prompt: &str, context: &[&str]) -> Result<String>;
}
