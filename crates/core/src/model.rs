//! Shared record types for the retrieval pipeline.
//!
//! `QuestionData` is produced by both the cache path and the live crawl, and is
//! consumed unchanged by the renderers and the link persister.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One certification row from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationRecord {
    pub platform: String,
    pub title: String,
    /// Short code, used for output file names.
    pub code: String,
    /// Provider-specific identifier of the certification's content stream.
    pub slug: String,
    #[serde(default)]
    pub link: Option<String>,
}

/// A labelled answer choice, e.g. `A` / `Deploy a new VNet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub text: String,
}

impl Choice {
    /// Split a provider choice line such as `"B. Use Azure Policy"` into label and text.
    ///
    /// Lines without a recognisable `X.` prefix get the label derived from their position.
    pub fn parse(raw: &str, position: usize) -> Self {
        let trimmed = raw.trim();
        let mut chars = trimmed.chars();
        if let (Some(first), Some('.')) = (chars.next(), chars.next())
            && first.is_ascii_uppercase()
        {
            return Self { label: first.to_string(), text: chars.as_str().trim().to_string() };
        }

        Self { label: position_label(position), text: trimmed.to_string() }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.label, self.text)
    }
}

fn position_label(position: usize) -> String {
    u8::try_from(position)
        .ok()
        .filter(|p| *p < 26)
        .map(|p| char::from(b'A' + p).to_string())
        .unwrap_or_else(|| (position + 1).to_string())
}

/// A community discussion entry attached to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discussion {
    pub text: String,
    #[serde(default)]
    pub votes: u32,
}

/// One retrieved question unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionData {
    /// Question number within the exam as shown by the provider.
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub body: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Marked correct answer, as choice labels (`"AD"`) or free text.
    #[serde(default)]
    pub answer: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discussion: Vec<Discussion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub source_url: String,
}

impl QuestionData {
    /// Choices whose label appears in the marked answer, in choice order.
    pub fn correct_choices(&self) -> Vec<&Choice> {
        let labels: Vec<char> = self.answer.chars().filter(|c| c.is_ascii_uppercase()).collect();
        self.choices
            .iter()
            .filter(|choice| {
                let mut label = choice.label.chars();
                matches!((label.next(), label.next()), (Some(c), None) if labels.contains(&c))
            })
            .collect()
    }
}

/// Check the invariants every sequence handed to a renderer must satisfy.
///
/// Returns the index of the first entry without a source URL.
pub fn first_missing_source(questions: &[QuestionData]) -> Option<usize> {
    questions.iter().position(|q| q.source_url.trim().is_empty())
}

/// Output file format understood by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Md,
    Txt,
    Json,
    Html,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Md => "md",
            FileFormat::Txt => "txt",
            FileFormat::Json => "json",
            FileFormat::Html => "html",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(FileFormat::Md),
            "txt" | "text" => Ok(FileFormat::Txt),
            "json" => Ok(FileFormat::Json),
            "html" | "htm" => Ok(FileFormat::Html),
            other => Err(format!("unsupported file format: {other}")),
        }
    }
}
