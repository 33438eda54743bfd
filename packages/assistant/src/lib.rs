#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Help assistant for portal users.
//!
//! Answers free-text questions from a fixed set of topics, each with a
//! keyword list. Every keyword found in the lowercased question adds its
//! length to the topic's score, so longer phrases outweigh short ones.
//! Questions that match nothing get a fallback answer.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Embedded default knowledge base.
const DEFAULT_KNOWLEDGE_TOML: &str = include_str!("../knowledge.toml");

/// Errors raised while loading a knowledge base.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The knowledge base could not be read or parsed.
    #[error("Knowledge base error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

/// One help topic.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Topic {
    /// Lowercase phrases that point at this topic.
    pub keywords: Vec<String>,
    /// Reply text.
    pub answer: String,
}

impl Topic {
    /// Sum of the lengths of the keywords contained in `query`.
    ///
    /// `query` must already be lowercase.
    #[must_use]
    pub fn score(&self, query: &str) -> usize {
        self.keywords
            .iter()
            .filter(|k| query.contains(k.as_str()))
            .map(String::len)
            .sum()
    }
}

/// Topics plus the reply for unmatched questions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KnowledgeBase {
    /// Reply when no topic matches.
    pub fallback: String,
    /// Topics in priority order for ties.
    pub topics: Vec<Topic>,
}

impl KnowledgeBase {
    /// Parses a knowledge base from TOML, lowercasing keywords.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] if the document is invalid.
    pub fn from_toml_str(s: &str) -> Result<Self, AssistantError> {
        let mut kb: Self = toml::from_str(s).map_err(|e| AssistantError::Config {
            message: format!("Failed to parse knowledge base: {e}"),
        })?;
        for topic in &mut kb.topics {
            for keyword in &mut topic.keywords {
                *keyword = keyword.to_lowercase();
            }
        }
        Ok(kb)
    }

    /// Reads a knowledge base from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] if the file cannot be read or
    /// parsed.
    pub fn from_path(path: &Path) -> Result<Self, AssistantError> {
        let contents = std::fs::read_to_string(path).map_err(|e| AssistantError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&contents)
    }

    /// The highest scoring topic, or `None` if nothing matches. The earlier
    /// topic wins a tie.
    #[must_use]
    pub fn best_match(&self, question: &str) -> Option<&Topic> {
        let query = question.to_lowercase();

        let mut best: Option<(&Topic, usize)> = None;
        for topic in &self.topics {
            let score = topic.score(&query);
            if score > best.map_or(0, |(_, s)| s) {
                best = Some((topic, score));
            }
        }

        log::debug!(
            "Assistant match for {question:?}: score {}",
            best.map_or(0, |(_, s)| s)
        );
        best.map(|(topic, _)| topic)
    }

    /// Reply to `question`.
    #[must_use]
    pub fn answer(&self, question: &str) -> &str {
        self.best_match(question)
            .map_or(self.fallback.as_str(), |topic| topic.answer.as_str())
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::from_toml_str(DEFAULT_KNOWLEDGE_TOML).unwrap_or_else(|e| {
            log::error!("Embedded knowledge base is invalid: {e}");
            Self {
                fallback: String::new(),
                topics: Vec::new(),
            }
        })
    }
}
