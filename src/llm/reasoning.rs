use std::sync::OnceLock;

use regex::Regex;

/// Result of splitting a batched reply into its trace and answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub content: String,
    pub reasoning: Option<String>,
}

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)推理过程：(?P<reasoning>.*?)\n\n最终回答：(?P<answer>.*)")
            .unwrap_or_else(|e| panic!("reasoning pattern is a valid regex: {e}"))
    })
}

/// Looks for a `推理过程：… \n\n最终回答：…` layout in `raw`. Text without both
/// labelled sections is returned untouched.
pub fn extract_reasoning(raw: &str) -> Extracted {
    match pattern().captures(raw) {
        Some(caps) => Extracted {
            content: caps["answer"].trim().to_string(),
            reasoning: Some(caps["reasoning"].trim().to_string()),
        },
        None => Extracted {
            content: raw.to_string(),
            reasoning: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_labelled_sections() {
        let out = extract_reasoning("推理过程：think\n\n最终回答：answer");
        assert_eq!(out.reasoning.as_deref(), Some("think"));
        assert_eq!(out.content, "answer");
    }

    #[test]
    fn multiline_sections_are_trimmed() {
        let out = extract_reasoning("推理过程：\n step one\n step two \n\n最终回答：\n done\n");
        assert_eq!(out.reasoning.as_deref(), Some("step one\n step two"));
        assert_eq!(out.content, "done");
    }

    #[test]
    fn reasoning_stops_at_first_answer_label() {
        let out = extract_reasoning("推理过程：a\n\n最终回答：b\n\n最终回答：c");
        assert_eq!(out.reasoning.as_deref(), Some("a"));
        assert_eq!(out.content, "b\n\n最终回答：c");
    }

    #[test]
    fn plain_text_is_left_alone() {
        for text in [
            "",
            "just an answer",
            "推理过程：only the trace",
            "最终回答：only the answer",
            "推理过程：x\n最终回答：single newline",
        ] {
            let out = extract_reasoning(text);
            assert_eq!(out.content, text);
            assert_eq!(out.reasoning, None);
        }
    }
}
