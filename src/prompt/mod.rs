//! Prompt assembly and model-backed translation over a [`SourceMapping`].
//!
//! Everything here sits on top of the annotator output: the stripped source
//! and the optional `.scribe` draft are spliced into a chat template, which is
//! either saved as a JSON prompt record or handed to a [`Generator`].
pub mod mapping;
pub mod template;

use std::fs;
use std::path::Path;

use tracing::{debug, info};

pub use mapping::{MappingEntry, SourceMapping, create_src_mapping};
pub use template::{ChatMessage, ChatTemplate};

use crate::annotator::rules::is_comment;
use crate::batch::{BatchReport, BatchRunner, FileStatus};
use crate::error::{Result, ScribeError};
use crate::fsutil;
use crate::generator::Generator;

/// Source text without comment lines, line endings preserved.
pub fn strip_comments(source: &str) -> String {
    source
        .split_inclusive('\n')
        .filter(|line| !is_comment(line))
        .collect()
}

/// Draft text if the draft file exists.
fn read_draft(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|e| ScribeError::io(path, e))
}

fn render_entry(entry: &MappingEntry<'_>, template: &ChatTemplate) -> Result<Vec<ChatMessage>> {
    let source = strip_comments(&fsutil::read_source(entry.source)?);
    let draft = read_draft(entry.draft)?;
    Ok(template.render(&source, draft.as_deref()))
}

/// Write the rendered chat for one file as a JSON prompt record.
pub fn save_prompt(entry: &MappingEntry<'_>, template: &ChatTemplate) -> Result<FileStatus> {
    let chat = render_entry(entry, template)?;
    let record = ChatTemplate { chat };
    let data = serde_json::to_string_pretty(&record).map_err(|e| ScribeError::Serialize {
        path: entry.prompt.to_path_buf(),
        reason: e.to_string(),
    })?;

    fsutil::write_atomic(entry.prompt, &data)?;
    debug!("Saved prompt {}", entry.prompt.display());
    Ok(FileStatus::Done(format!(
        "Saved prompt {}",
        entry.prompt.display()
    )))
}

/// Save one prompt record per mapped source.
pub fn save_prompts(
    mapping: &SourceMapping,
    template: &ChatTemplate,
    runner: &BatchRunner,
) -> BatchReport {
    info!("Saving custom prompts for {} files", mapping.len());
    runner.run(mapping.entries(), |entry| save_prompt(entry, template))
}

/// Translate one source unless its C++ target already exists.
pub fn translate_file(
    entry: &MappingEntry<'_>,
    template: &ChatTemplate,
    generator: &dyn Generator,
) -> Result<FileStatus> {
    if entry.target.is_file() {
        return Ok(FileStatus::Skipped(format!(
            "Skipping! File exists {}...",
            entry.target.display()
        )));
    }

    let chat = render_entry(entry, template)?;
    let text = generator
        .generate(&chat)
        .map_err(|source| ScribeError::Generator {
            path: entry.source.to_path_buf(),
            source,
        })?;

    fsutil::write_atomic(entry.target, &text)?;
    info!(
        "Translated {} with {}",
        entry.source.display(),
        generator.name()
    );
    Ok(FileStatus::Done(format!(
        "Generated translation {}",
        entry.target.display()
    )))
}

/// Translate every mapped source through `generator`.
pub fn translate(
    mapping: &SourceMapping,
    template: &ChatTemplate,
    generator: &dyn Generator,
    runner: &BatchRunner,
) -> BatchReport {
    info!(
        "Starting neural conversion of {} files with {}",
        mapping.len(),
        generator.name()
    );
    runner.run(mapping.entries(), |entry| {
        translate_file(entry, template, generator)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::mock::EchoGenerator;
    use tempfile::tempdir;

    fn template() -> ChatTemplate {
        ChatTemplate {
            chat: vec![ChatMessage {
                role: "user".to_string(),
                content: "Translate:".to_string(),
            }],
        }
    }

    #[test]
    fn test_strip_comments() {
        let src = "c comment\n      x = 1\n! note\n      complex z\n";
        assert_eq!(strip_comments(src), "      x = 1\n      complex z\n");
    }

    #[test]
    fn test_save_prompt_includes_draft() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("a.f90");
        fs::write(&src, "! header\nx = 1\n").unwrap();
        fs::write(temp.path().join("a.scribe"), "x = 1\n").unwrap();

        let mapping = create_src_mapping([&src]);
        let report = save_prompts(&mapping, &template(), &BatchRunner::new(false));
        assert_eq!(report.done(), 1);

        let data = fs::read_to_string(&mapping.prompts[0]).unwrap();
        let record: ChatTemplate = serde_json::from_str(&data).unwrap();
        assert_eq!(
            record.chat[0].content,
            "Translate:\n<source>\nx = 1\n</source>\n\n<draft>\nx = 1\n</draft>"
        );
    }

    #[test]
    fn test_translate_writes_and_skips() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("b.f90");
        fs::write(&src, "y = 2\n").unwrap();

        let mapping = create_src_mapping([&src]);
        let generator = EchoGenerator::new("test");
        let runner = BatchRunner::new(false);

        let first = translate(&mapping, &template(), &generator, &runner);
        assert_eq!(first.done(), 1);
        let written = fs::read_to_string(&mapping.targets[0]).unwrap();
        assert_eq!(written, "// test\n/*\ny = 2\n*/\n");

        let second = translate(&mapping, &template(), &generator, &runner);
        assert_eq!(second.skipped(), 1);
        assert_eq!(fs::read_to_string(&mapping.targets[0]).unwrap(), written);
    }

    #[test]
    fn test_translate_missing_source_continues() {
        let temp = tempdir().unwrap();
        let good = temp.path().join("good.f90");
        fs::write(&good, "z = 3\n").unwrap();
        let missing = temp.path().join("missing.f90");

        let mapping = create_src_mapping([&missing, &good]);
        let report = translate(
            &mapping,
            &template(),
            &EchoGenerator::default(),
            &BatchRunner::new(false),
        );
        assert_eq!(report.failed(), 1);
        assert_eq!(report.done(), 1);
        assert!(mapping.targets[1].exists());
        assert!(!mapping.targets[0].exists());
    }
}
