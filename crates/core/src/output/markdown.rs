//! Markdown and HTML rendering of question sequences.
//!
//! Markdown layout per question:
//!
//! ```text
//! ## <provider title or "question N">
//!
//! <body>
//!
//! A. <choice>
//! B. <choice>
//!
//! **Answer: <labels>**
//!
//! **Timestamp: <provider timestamp>**
//!
//! [View on ExamTopics](<source url>)
//! ```
//!
//! The document starts with a YAML frontmatter block carrying the title and
//! question count.

use pulldown_cmark::{Options, Parser, html};

use crate::model::QuestionData;

/// Separator written between questions.
const QUESTION_RULE: &str = "----------------------------------------";

/// Render a question sequence as Markdown.
pub fn to_markdown(title: &str, questions: &[QuestionData], include_discussion: bool) -> String {
    let mut out = format!("---\ntitle: {}\nquestions: {}\n---\n\n", escape_yaml(title), questions.len());

    for question in questions {
        write_question(&mut out, question, include_discussion);
    }

    out
}

fn write_question(out: &mut String, question: &QuestionData, include_discussion: bool) {
    let heading = question.title.clone().unwrap_or_else(|| format!("question {}", question.number));
    out.push_str(&format!("## {heading}\n\n"));

    if let Some(topic) = question.topic {
        out.push_str(&format!("Topic #: {topic}\n\n"));
    }

    out.push_str(&format!("{}\n\n", question.body.trim()));

    if !question.choices.is_empty() {
        for choice in &question.choices {
            out.push_str(&format!("{choice}  \n"));
        }
        out.push('\n');
    }

    if !question.answer.trim().is_empty() {
        out.push_str(&format!("**Answer: {}**\n\n", question.answer.trim()));
    }

    if let Some(timestamp) = &question.timestamp {
        out.push_str(&format!("**Timestamp: {}**\n\n", timestamp.trim()));
    }

    out.push_str(&format!("[View on ExamTopics]({})\n\n", question.source_url));

    if include_discussion && !question.discussion.is_empty() {
        out.push_str("### Discussion\n\n");
        for entry in &question.discussion {
            let text = entry.text.split_whitespace().collect::<Vec<_>>().join(" ");
            out.push_str(&format!("- ({} votes) {}\n", entry.votes, text));
        }
        out.push('\n');
    }

    out.push_str(&format!("{QUESTION_RULE}\n\n"));
}

/// Render a question sequence as a standalone HTML page.
pub fn to_html(title: &str, questions: &[QuestionData], include_discussion: bool) -> String {
    let markdown = to_markdown(title, questions, include_discussion);
    let body = markdown_body(&markdown);

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut html_body = String::new();
    html::push_html(&mut html_body, Parser::new_ext(body, options));

    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"utf-8\">\n  \
         <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\n  \
         <title>{title}</title>\n  \
         <style>body{{padding:24px}} .markdown-body{{box-sizing:border-box;max-width:980px;margin:0 auto}}</style>\n\
         </head>\n<body>\n<article class=\"markdown-body\">\n{html_body}</article>\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

/// Strip the frontmatter block from a rendered Markdown document.
fn markdown_body(markdown: &str) -> &str {
    markdown
        .strip_prefix("---\n")
        .and_then(|rest| rest.split_once("\n---\n"))
        .map(|(_, body)| body)
        .unwrap_or(markdown)
}

/// Escape special YAML characters in a string.
fn escape_yaml(s: &str) -> String {
    if s.contains('\n') || s.contains(':') && s.len() > 1 {
        format!("\"{}\"", s.replace('"', "\\\""))
    } else if s.is_empty() {
        "\"\"".to_string()
    } else {
        s.to_string()
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Choice, Discussion};

    fn question(number: u32) -> QuestionData {
        QuestionData {
            number,
            topic: Some(1),
            title: None,
            body: format!("What does service {number} do?"),
            choices: vec![Choice::parse("A. Store blobs", 0), Choice::parse("B. Queue messages", 1)],
            answer: "B".into(),
            discussion: vec![Discussion { text: "B is right,\n  see docs".into(), votes: 12 }],
            timestamp: Some("Jan. 5, 2024, 10:01 a.m.".into()),
            source_url: format!("https://www.examtopics.com/discussions/microsoft/view/{number}-exam-az-900/"),
        }
    }

    #[test]
    fn test_markdown_layout() {
        let md = to_markdown("az-900", &[question(1)], false);
        assert!(md.starts_with("---\ntitle: az-900\nquestions: 1\n---\n"));
        assert!(md.contains("## question 1\n"));
        assert!(md.contains("Topic #: 1"));
        assert!(md.contains("A. Store blobs"));
        assert!(md.contains("**Answer: B**"));
        assert!(md.contains("**Timestamp: Jan. 5, 2024, 10:01 a.m.**"));
        assert!(md.contains("[View on ExamTopics](https://www.examtopics.com/discussions/microsoft/view/1-exam-az-900/)"));
        assert!(!md.contains("### Discussion"));
    }

    #[test]
    fn test_markdown_with_discussion() {
        let md = to_markdown("az-900", &[question(1)], true);
        assert!(md.contains("### Discussion"));
        assert!(md.contains("- (12 votes) B is right, see docs"));
    }

    #[test]
    fn test_markdown_uses_provider_title() {
        let mut q = question(4);
        q.title = Some("Exam AZ-900 topic 1 question 4 discussion".into());
        let md = to_markdown("az-900", &[q], false);
        assert!(md.contains("## Exam AZ-900 topic 1 question 4 discussion"));
    }

    #[test]
    fn test_markdown_preserves_order() {
        let questions = vec![question(3), question(1), question(2)];
        let md = to_markdown("az-900", &questions, false);

        let urls: Vec<&str> = md
            .lines()
            .filter_map(|line| line.strip_prefix("[View on ExamTopics]("))
            .map(|rest| rest.trim_end_matches(')'))
            .collect();
        let expected: Vec<&str> = questions.iter().map(|q| q.source_url.as_str()).collect();
        assert_eq!(urls, expected);
    }

    #[test]
    fn test_html_wraps_rendered_markdown() {
        let html = to_html("az-900 <draft>", &[question(1)], false);
        assert!(html.starts_with("<!doctype html>"));
        assert!(html.contains("<title>az-900 &lt;draft&gt;</title>"));
        assert!(html.contains("<h2>question 1</h2>"));
        assert!(html.contains("<strong>Answer: B</strong>"));
        assert!(!html.contains("questions: 1"));
    }

    #[test]
    fn test_escape_yaml_with_colon() {
        assert_eq!(escape_yaml("AZ-900: Fundamentals"), "\"AZ-900: Fundamentals\"");
        assert_eq!(escape_yaml(""), "\"\"");
        assert_eq!(escape_yaml("az-900"), "az-900");
    }
}
