//! Notification content: contact derivation and message templating.
//!
//! The contact a file is announced to comes from its location: the name
//! of the subfolder it was dropped into, falling back to a `name_` prefix
//! on the file stem, falling back to the configured default. The message
//! is a placeholder template; the rendered result and the file context
//! are handed to the dispatcher as environment variables.

use std::path::{Path, PathBuf};

use crate::error::{DropwatchError, Result};

/// Built-in template used when no template file is configured.
pub const DEFAULT_TEMPLATE: &str = "New file is ready: {file_name}";

/// Everything the dispatcher needs to announce one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub path: PathBuf,
    pub file_name: String,
    pub folder_name: String,
    pub contact: String,
    pub message: String,
}

impl Notification {
    /// Assemble the notification for `path` under the watched `root`.
    pub fn build(path: &Path, root: &Path, template: &str, default_contact: &str) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let folder_name = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let contact = derive_contact(path, root, default_contact);

        let message = render(
            template,
            &[
                ("{file_name}", file_name.as_str()),
                ("{folder_name}", folder_name.as_str()),
                ("{contact}", contact.as_str()),
                ("{path}", &path.to_string_lossy()),
                ("{date}", &current_date()),
            ],
        );

        Self {
            path: path.to_path_buf(),
            file_name,
            folder_name,
            contact,
            message,
        }
    }

    /// Environment passed to the notification command.
    pub fn env(&self) -> Vec<(&'static str, String)> {
        vec![
            ("DROPWATCH_FILE", self.path.to_string_lossy().into_owned()),
            ("DROPWATCH_FILE_NAME", self.file_name.clone()),
            ("DROPWATCH_FOLDER", self.folder_name.clone()),
            ("DROPWATCH_CONTACT", self.contact.clone()),
            ("DROPWATCH_MESSAGE", self.message.clone()),
        ]
    }
}

/// Load the message template, or the built-in default when unset.
pub fn load_template(path: Option<&Path>) -> Result<String> {
    match path {
        None => Ok(DEFAULT_TEMPLATE.to_string()),
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|e| {
                DropwatchError::Template(format!(
                    "cannot read template {}: {e}",
                    path.display()
                ))
            })?;
            let trimmed = content.trim();
            if trimmed.is_empty() {
                return Err(DropwatchError::Template(format!(
                    "template {} is empty",
                    path.display()
                )));
            }
            Ok(trimmed.to_string())
        }
    }
}

/// Contact resolution order: subfolder name, `name_` file-stem prefix,
/// configured default.
fn derive_contact(path: &Path, root: &Path, default_contact: &str) -> String {
    if let Some(parent) = path.parent() {
        if parent != root {
            if let Some(name) = parent.file_name() {
                return name.to_string_lossy().into_owned();
            }
        }
    }

    if let Some(stem) = path.file_stem().map(|s| s.to_string_lossy()) {
        if let Some((prefix, _)) = stem.split_once('_') {
            if !prefix.is_empty() {
                return prefix.to_string();
            }
        }
    }

    default_contact.to_string()
}

/// Replace known placeholders; unknown ones are left intact so a typo in
/// a template shows up in the delivered message instead of vanishing.
fn render(template: &str, replacements: &[(&str, &str)]) -> String {
    let mut message = template.to_string();
    for (placeholder, value) in replacements {
        message = message.replace(placeholder, value);
    }
    message
}

fn current_date() -> String {
    jiff::Zoned::now().strftime("%Y-%m-%d %H:%M").to_string()
}
