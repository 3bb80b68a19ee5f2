/// Echo generator for tests and dry runs.
///
/// Returns the `<source>` block of the last chat message wrapped in a C++
/// comment, so a translation run can be exercised end to end without a model.
use super::{Generator, GeneratorError};
use crate::prompt::ChatMessage;

const SOURCE_OPEN: &str = "<source>\n";
const SOURCE_CLOSE: &str = "</source>";

/// A generator that echoes the source it was asked to translate.
pub struct EchoGenerator {
    pub banner: String,
}

impl EchoGenerator {
    #[must_use]
    pub fn new(banner: impl Into<String>) -> Self {
        Self {
            banner: banner.into(),
        }
    }
}

impl Default for EchoGenerator {
    fn default() -> Self {
        Self::new("code-scribe dry run")
    }
}

/// Text between `<source>` and `</source>` in `content`, if present.
fn source_block(content: &str) -> Option<&str> {
    let start = content.find(SOURCE_OPEN)? + SOURCE_OPEN.len();
    let end = content[start..].find(SOURCE_CLOSE)? + start;
    Some(&content[start..end])
}

impl Generator for EchoGenerator {
    fn generate(&self, chat: &[ChatMessage]) -> Result<String, GeneratorError> {
        let last = chat.last().ok_or(GeneratorError::EmptyChat)?;
        let body = source_block(&last.content).ok_or_else(|| {
            GeneratorError::GenerationFailed("last message has no <source> block".to_string())
        })?;

        let mut out = format!("// {}\n/*\n", self.banner);
        out.push_str(body);
        if !body.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("*/\n");
        Ok(out)
    }

    fn name(&self) -> &str {
        "echo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(content: &str) -> ChatMessage {
        ChatMessage {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_echo_wraps_source() {
        let generator = EchoGenerator::new("test");
        let chat = vec![user("Translate:\n<source>\nx = 1\n</source>")];
        let out = generator.generate(&chat).unwrap();
        assert_eq!(out, "// test\n/*\nx = 1\n*/\n");
    }

    #[test]
    fn test_echo_deterministic() {
        let generator = EchoGenerator::default();
        let chat = vec![user("<source>\ny = 2\n</source>\n\n<draft>\ny = 2\n</draft>")];
        let a = generator.generate(&chat).unwrap();
        let b = generator.generate(&chat).unwrap();
        assert_eq!(a, b, "same input should produce same output");
        assert!(!a.contains("<draft>"));
    }

    #[test]
    fn test_echo_empty_chat() {
        let generator = EchoGenerator::default();
        assert!(matches!(
            generator.generate(&[]),
            Err(GeneratorError::EmptyChat)
        ));
    }

    #[test]
    fn test_echo_requires_source_block() {
        let generator = EchoGenerator::default();
        let result = generator.generate(&[user("no block here")]);
        assert!(matches!(result, Err(GeneratorError::GenerationFailed(_))));
    }

    #[test]
    fn test_echo_name() {
        assert_eq!(EchoGenerator::default().name(), "echo");
    }
}
