//! Output writers: rendered question files and plain link lists.
//!
//! Both writers take an ordered question sequence and keep its order. The
//! orchestrator only calls them with non-empty sequences; an empty sequence is
//! rejected here as well.

pub mod markdown;
pub mod text;

use std::fs;
use std::path::{Path, PathBuf};

use crate::Error;
use crate::model::{CertificationRecord, FileFormat, QuestionData};

pub use markdown::{to_html, to_markdown};
pub use text::to_text;

/// Serialize `questions` in `format` and write them to `path`.
///
/// # Errors
///
/// Returns `Error::RenderFailure` if the sequence is empty or the file cannot be written.
pub fn render(questions: &[QuestionData], path: &Path, include_discussion: bool, format: FileFormat) -> Result<(), Error> {
    let render_err = |reason: String| Error::RenderFailure { path: path.display().to_string(), reason };

    if questions.is_empty() {
        return Err(render_err("refusing to render an empty question sequence".into()));
    }

    let title = path.file_stem().and_then(|s| s.to_str()).unwrap_or("questions");

    let content = match format {
        FileFormat::Md => to_markdown(title, questions, include_discussion),
        FileFormat::Html => to_html(title, questions, include_discussion),
        FileFormat::Txt => to_text(title, questions, include_discussion),
        FileFormat::Json => to_json(questions, include_discussion).map_err(|e| render_err(e.to_string()))?,
    };

    ensure_parent(path).map_err(|e| render_err(e.to_string()))?;
    fs::write(path, content).map_err(|e| render_err(e.to_string()))?;

    tracing::debug!("rendered {} questions to {} ({})", questions.len(), path.display(), format);
    Ok(())
}

/// Pretty JSON array of the sequence. Discussion is dropped unless requested.
pub fn to_json(questions: &[QuestionData], include_discussion: bool) -> Result<String, serde_json::Error> {
    if include_discussion {
        return serde_json::to_string_pretty(questions);
    }

    let stripped: Vec<QuestionData> =
        questions.iter().map(|q| QuestionData { discussion: Vec::new(), ..q.clone() }).collect();
    serde_json::to_string_pretty(&stripped)
}

/// Write one source URL per line, in sequence order.
///
/// # Errors
///
/// Returns `Error::PersistFailure` if the file cannot be written.
pub fn save_links(path: &Path, questions: &[QuestionData]) -> Result<(), Error> {
    let persist_err = |e: std::io::Error| Error::PersistFailure { path: path.display().to_string(), reason: e.to_string() };

    let mut content = String::with_capacity(questions.len() * 80);
    for question in questions {
        content.push_str(question.source_url.trim());
        content.push('\n');
    }

    ensure_parent(path).map_err(persist_err)?;
    fs::write(path, content).map_err(persist_err)?;

    tracing::debug!("saved {} links to {}", questions.len(), path.display());
    Ok(())
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Destination for a certification's retrieved questions.
///
/// The orchestrator hands every non-empty sequence to a sink exactly once.
pub trait ResultSink {
    /// Persist `questions` for `record`, returning the rendered output path.
    fn write(&self, record: &CertificationRecord, questions: &[QuestionData]) -> Result<PathBuf, Error>;
}

/// Writes `{output_dir}/{code}.{ext}` and `{links_dir}/{code}-link.txt`.
#[derive(Debug, Clone)]
pub struct FileSink {
    pub output_dir: PathBuf,
    pub links_dir: PathBuf,
    pub include_discussion: bool,
    pub format: FileFormat,
}

impl FileSink {
    pub fn output_path(&self, record: &CertificationRecord) -> PathBuf {
        self.output_dir.join(format!("{}.{}", record.code, self.format.extension()))
    }

    pub fn links_path(&self, record: &CertificationRecord) -> PathBuf {
        self.links_dir.join(format!("{}-link.txt", record.code))
    }
}

impl ResultSink for FileSink {
    fn write(&self, record: &CertificationRecord, questions: &[QuestionData]) -> Result<PathBuf, Error> {
        save_links(&self.links_path(record), questions)?;

        let output_path = self.output_path(record);
        render(questions, &output_path, self.include_discussion, self.format)?;
        Ok(output_path)
    }
}
