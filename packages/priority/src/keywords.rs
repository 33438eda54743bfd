//! Keyword and image-label tables consulted by the classifier.
//!
//! The default tables are compiled into the binary from `keywords.toml`.
//! Alternative tables with the same schema can be loaded from a string or
//! a file, which is how tests substitute their own vocabulary.

use std::path::Path;

use serde::Deserialize;

use crate::PriorityError;

/// Embedded default keyword tables (compiled into the binary).
const DEFAULT_KEYWORDS_TOML: &str = include_str!("../keywords.toml");

/// An image label that only counts as hazard evidence when the text
/// context also contains `requires`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VisualGate {
    /// Substring of the predicted label.
    pub label: String,
    /// Substring the text context must contain.
    pub requires: String,
}

/// Immutable lookup tables for text and visual scoring.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeywordTables {
    /// Strong textual indicators.
    pub emergency: Vec<String>,
    /// Weaker textual indicators.
    pub secondary: Vec<String>,
    /// Image labels that count on their own.
    pub visual_classes: Vec<String>,
    /// Image labels that need a textual cue.
    #[serde(default)]
    pub visual_gates: Vec<VisualGate>,
}

impl KeywordTables {
    /// Parses tables from a TOML document.
    ///
    /// Entries are lowercased so that matching against the lowercase text
    /// context and labels is case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityError::Config`] if the document is not valid TOML
    /// or does not match the table schema.
    pub fn from_toml_str(s: &str) -> Result<Self, PriorityError> {
        let tables: Self = toml::from_str(s).map_err(|e| PriorityError::Config {
            message: format!("Failed to parse keyword tables: {e}"),
        })?;
        Ok(tables.normalized())
    }

    /// Reads and parses tables from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityError::Config`] if the file cannot be read or
    /// parsed.
    pub fn from_path(path: &Path) -> Result<Self, PriorityError> {
        let contents = std::fs::read_to_string(path).map_err(|e| PriorityError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&contents)
    }

    fn normalized(self) -> Self {
        let lower = |v: Vec<String>| v.into_iter().map(|s| s.to_lowercase()).collect();
        Self {
            emergency: lower(self.emergency),
            secondary: lower(self.secondary),
            visual_classes: lower(self.visual_classes),
            visual_gates: self
                .visual_gates
                .into_iter()
                .map(|g| VisualGate {
                    label: g.label.to_lowercase(),
                    requires: g.requires.to_lowercase(),
                })
                .collect(),
        }
    }
}

impl Default for KeywordTables {
    fn default() -> Self {
        // The embedded document is covered by `embedded_tables_parse`; an
        // empty table set only ever scores `Low`.
        Self::from_toml_str(DEFAULT_KEYWORDS_TOML).unwrap_or_else(|e| {
            log::error!("Embedded keyword tables are invalid: {e}");
            Self {
                emergency: Vec::new(),
                secondary: Vec::new(),
                visual_classes: Vec::new(),
                visual_gates: Vec::new(),
            }
        })
    }
}
