//! Plain-text rendering.

use crate::model::QuestionData;

/// Render a question sequence as plain text, one block per question.
pub fn to_text(title: &str, questions: &[QuestionData], include_discussion: bool) -> String {
    let mut out = format!("{title}\n{}\n\n", "=".repeat(title.chars().count().max(3)));

    for question in questions {
        out.push_str(&format!("Question {}\n", question.number));
        out.push_str(&format!("{}\n\n", question.body.trim()));

        for choice in &question.choices {
            out.push_str(&format!("  {choice}\n"));
        }
        if !question.choices.is_empty() {
            out.push('\n');
        }

        let correct = question.correct_choices();
        if correct.is_empty() {
            out.push_str(&format!("Answer: {}\n", question.answer.trim()));
        } else {
            let texts: Vec<String> = correct.iter().map(|c| c.to_string()).collect();
            out.push_str(&format!("Answer: {}\n", texts.join(" | ")));
        }

        out.push_str(&format!("Source: {}\n", question.source_url));

        if include_discussion {
            for entry in &question.discussion {
                let text = entry.text.split_whitespace().collect::<Vec<_>>().join(" ");
                out.push_str(&format!("  > [{}] {}\n", entry.votes, text));
            }
        }

        out.push('\n');
    }

    out
}
