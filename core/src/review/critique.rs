use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A scored evaluation of a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Critique {
    pub score: u8,
    pub feedback: Vec<String>,
}

impl Critique {
    pub fn new(score: i64, feedback: Vec<String>) -> Self {
        Self {
            score: score.clamp(0, 100) as u8,
            feedback,
        }
    }

    /// Stand-in used when an evaluation cannot be obtained.
    pub fn neutral(score: u8, reason: &str) -> Self {
        Self {
            score: score.min(100),
            feedback: vec![format!("Evaluation unavailable ({reason}); review manually.")],
        }
    }

    pub fn top_feedback(&self, n: usize) -> &[String] {
        &self.feedback[..self.feedback.len().min(n)]
    }
}

fn score_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)score[^\w-]{0,5}(-?\d{1,4})").expect("valid score regex")
    })
}

fn bullet_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:[-*•]|\d+[.)])\s+(.+?)\s*$").expect("valid bullet regex")
    })
}

/// Read a critique out of model text: JSON first, then `score: N` plus bullet
/// lines. `None` when no score can be found.
pub fn parse_critique(text: &str) -> Option<Critique> {
    if let Some(critique) = parse_json_critique(text) {
        return Some(critique);
    }

    let score = score_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())?;
    let feedback = bullet_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect();
    Some(Critique::new(score, feedback))
}

fn parse_json_critique(text: &str) -> Option<Critique> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start >= end {
        return None;
    }
    let value: Value = serde_json::from_str(&text[start..=end]).ok()?;
    let score = match value.get("score")? {
        Value::Number(n) => n.as_f64()?.round() as i64,
        Value::String(s) => s.trim().parse::<f64>().ok()?.round() as i64,
        _ => return None,
    };
    let feedback = match value.get("feedback") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    };
    Some(Critique::new(score, feedback))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_critique() {
        let c = parse_critique(r#"{"score": 72, "feedback": ["add tests", "split task 3"]}"#)
            .unwrap();
        assert_eq!(c.score, 72);
        assert_eq!(c.feedback, vec!["add tests", "split task 3"]);
    }

    #[test]
    fn test_json_inside_prose_and_clamped() {
        let c = parse_critique("Verdict:\n{\"score\": 140.4, \"feedback\": \"fine\"}\nThanks").unwrap();
        assert_eq!(c.score, 100);
        assert_eq!(c.feedback, vec!["fine"]);
    }

    #[test]
    fn test_text_fallback() {
        let text = "Score: 64/100\n- tighten the timeline\n- name an owner\n";
        let c = parse_critique(text).unwrap();
        assert_eq!(c.score, 64);
        assert_eq!(c.feedback, vec!["tighten the timeline", "name an owner"]);
    }

    #[test]
    fn test_negative_score_clamped() {
        assert_eq!(parse_critique("score = -5").unwrap().score, 0);
    }

    #[test]
    fn test_unparseable() {
        assert!(parse_critique("looks great to me").is_none());
    }

    #[test]
    fn test_top_feedback() {
        let c = Critique::new(10, vec!["a".into(), "b".into()]);
        assert_eq!(c.top_feedback(3).len(), 2);
        assert_eq!(c.top_feedback(1), &["a".to_string()]);
    }
}
