//! Prompt templates and output cleanup.

pub fn summary_prompt(text: &str) -> String {
    format!("Summarize the following document in 30 to 150 words.\n\n{text}")
}

pub fn answer_prompt(context: &str, question: &str) -> String {
    format!("Context: {context}\n\nQuestion: {question}\nAnswer (in 2-3 sentences, concise and to the point):")
}

pub fn question_prompt(content: &str) -> String {
    format!(
        "Generate 1 unique, logic-based question that requires reasoning and cannot be answered by simple lookup. \
         The question must be about a non-trivial aspect of the content below.\nContent:\n{content}"
    )
}

/// Drop list numbering such as `1. ` the model may put in front of the question.
pub fn clean_question(raw: &str) -> String {
    raw.trim()
        .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ' ')
        .trim()
        .to_string()
}
