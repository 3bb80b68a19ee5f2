/// Generator trait and shared types for model-backed translation.
///
/// The crate never talks to a model directly; a `Generator` receives the
/// rendered chat for one source file and returns the text to store as its
/// C++ translation.
pub mod mock;

use thiserror::Error;

use crate::prompt::ChatMessage;

/// Errors that can occur during generation.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("no generator backend configured: {0}")]
    Unavailable(String),

    #[error("generation failed: {0}")]
    GenerationFailed(String),

    #[error("empty chat")]
    EmptyChat,
}

/// Trait for chat-completion backends.
///
/// All implementations must be `Send + Sync` to allow shared use
/// behind `Arc`.
pub trait Generator: Send + Sync {
    /// Produce the assistant reply for `chat`.
    fn generate(&self, chat: &[ChatMessage]) -> Result<String, GeneratorError>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

/// Pick the backend for a translation run.
///
/// Only the echo generator ships with the crate, so anything but a dry run
/// reports that no backend is configured.
pub fn select_generator(dry_run: bool) -> Result<Box<dyn Generator>, GeneratorError> {
    if dry_run {
        Ok(Box::new(mock::EchoGenerator::default()))
    } else {
        Err(GeneratorError::Unavailable(
            "only the echo generator is built in; rerun with --dry-run".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_generator() {
        let generator = select_generator(true).unwrap();
        assert_eq!(generator.name(), "echo");

        let err = select_generator(false).err().unwrap();
        assert!(matches!(err, GeneratorError::Unavailable(_)));
        assert!(err.to_string().contains("--dry-run"));
    }
}
