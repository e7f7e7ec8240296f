//! Access policy gate for mutating operations

use crate::checklist::Note;
use crate::config::Settings;
use crate::error::{KeepError, KeepResult};

/// Decides whether a note may be modified
///
/// A note is writable when it carries the protective label, or when the
/// process runs in unsafe mode. Reads are never gated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    unsafe_mode: bool,
    label: String,
}

impl AccessPolicy {
    pub fn new(label: impl Into<String>, unsafe_mode: bool) -> Self {
        Self {
            unsafe_mode,
            label: label.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.label.clone(), settings.unsafe_mode)
    }

    /// The label attached to notes this server creates
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_unsafe(&self) -> bool {
        self.unsafe_mode
    }

    pub fn can_modify(&self, note: &Note) -> bool {
        self.unsafe_mode || note.has_label(&self.label)
    }

    /// `Forbidden` unless `can_modify`
    pub fn check(&self, note: &Note) -> KeepResult<()> {
        if self.can_modify(note) {
            Ok(())
        } else {
            Err(KeepError::Forbidden(note.id.clone()))
        }
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}
