use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScribeError};

/// One role/content pair of a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat template read from a TOML file with `[[chat]]` tables.
///
/// ```toml
/// [[chat]]
/// role = "system"
/// content = "You translate Fortran to C++."
///
/// [[chat]]
/// role = "user"
/// content = "Translate the following file."
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTemplate {
    pub chat: Vec<ChatMessage>,
}

impl ChatTemplate {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| ScribeError::io(path, e))?;
        Self::parse(&data).map_err(|reason| ScribeError::MalformedTemplate {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn parse(data: &str) -> std::result::Result<Self, String> {
        let template: ChatTemplate = toml::from_str(data).map_err(|e| e.to_string())?;
        if template.chat.is_empty() {
            return Err("no [[chat]] entries".to_string());
        }
        Ok(template)
    }

    /// Chat for one file: the last message gains a `<source>` block and, for
    /// a non-empty draft, a `<draft>` block. The template is left as is.
    pub fn render(&self, source: &str, draft: Option<&str>) -> Vec<ChatMessage> {
        let mut chat = self.chat.clone();
        if let Some(last) = chat.last_mut() {
            last.content.push_str(&format!("\n<source>\n{source}</source>"));
            if let Some(draft) = draft.filter(|d| !d.is_empty()) {
                last.content.push_str(&format!("\n\n<draft>\n{draft}</draft>"));
            }
        }
        chat
    }
}
