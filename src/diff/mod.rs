//! Char-level diffing between prompt versions with a normalized
//! change-rate metric.

use serde::Serialize;
use similar::{ChangeTag, TextDiff};

mod cleanup;

use cleanup::char_len;

/// Classification of one contiguous run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffOp {
    Equal,
    Insert,
    Delete,
}

/// One span of the diff partition. Concatenating `equal` + `delete` spans
/// in order reconstructs the old text; `equal` + `insert` spans the new.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffSpan {
    pub op: DiffOp,
    pub text: String,
}

/// Computes the span partition between two texts. Char-level edit script
/// with a semantic cleanup pass, so the result favors large meaningful
/// spans over minimal fragmented ones. Never fails; two empty inputs yield
/// zero spans.
pub fn diff(old_text: &str, new_text: &str) -> Vec<DiffSpan> {
    if old_text.is_empty() && new_text.is_empty() {
        return Vec::new();
    }

    let text_diff = TextDiff::from_chars(old_text, new_text);
    let mut spans: Vec<DiffSpan> = Vec::new();
    for change in text_diff.iter_all_changes() {
        let op = match change.tag() {
            ChangeTag::Equal => DiffOp::Equal,
            ChangeTag::Delete => DiffOp::Delete,
            ChangeTag::Insert => DiffOp::Insert,
        };
        let value = change.value();
        match spans.last_mut() {
            Some(last) if last.op == op => last.text.push_str(value),
            _ => spans.push(DiffSpan {
                op,
                text: value.to_string(),
            }),
        }
    }

    cleanup::semantic(spans)
}

/// Normalized change percentage in `0..=100`: changed chars over the
/// combined length of both texts. An empty old text is 100 against any
/// non-empty new text and 0 against an empty one.
pub fn change_rate(old_text: &str, new_text: &str) -> u8 {
    if old_text.is_empty() {
        return if new_text.is_empty() { 0 } else { 100 };
    }

    let spans = diff(old_text, new_text);
    let changed: usize = spans
        .iter()
        .filter(|span| span.op != DiffOp::Equal)
        .map(|span| char_len(&span.text))
        .sum();
    let total = char_len(old_text) + char_len(new_text);

    ((changed as f64 / total as f64) * 100.0).round() as u8
}

/// Diff summary in the shape the version-compare endpoint serves.
#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    pub additions: usize,
    pub deletions: usize,
    pub change_rate: u8,
    pub spans: Vec<DiffSpan>,
}

impl DiffReport {
    pub fn compare(old_text: &str, new_text: &str) -> Self {
        let spans = diff(old_text, new_text);
        let additions = spans
            .iter()
            .filter(|span| span.op == DiffOp::Insert)
            .map(|span| char_len(&span.text))
            .sum();
        let deletions = spans
            .iter()
            .filter(|span| span.op == DiffOp::Delete)
            .map(|span| char_len(&span.text))
            .sum();
        Self {
            additions,
            deletions,
            change_rate: change_rate(old_text, new_text),
            spans,
        }
    }

    /// Renders the spans as styled HTML runs, matching the classes the
    /// version-compare view expects. Span text is HTML-escaped.
    pub fn render_html(&self) -> String {
        let mut out = String::new();
        for span in &self.spans {
            let escaped = escape_html(&span.text);
            match span.op {
                DiffOp::Insert => {
                    out.push_str("<span class=\"diff-added\">");
                    out.push_str(&escaped);
                    out.push_str("</span>");
                }
                DiffOp::Delete => {
                    out.push_str("<span class=\"diff-deleted\">");
                    out.push_str(&escaped);
                    out.push_str("</span>");
                }
                DiffOp::Equal => out.push_str(&escaped),
            }
        }
        out
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn old_side(spans: &[DiffSpan]) -> String {
        spans
            .iter()
            .filter(|s| s.op != DiffOp::Insert)
            .map(|s| s.text.as_str())
            .collect()
    }

    fn new_side(spans: &[DiffSpan]) -> String {
        spans
            .iter()
            .filter(|s| s.op != DiffOp::Delete)
            .map(|s| s.text.as_str())
            .collect()
    }

    #[test]
    fn identical_texts_yield_single_equal_span() {
        let spans = diff("same text", "same text");
        assert_eq!(
            spans,
            vec![DiffSpan {
                op: DiffOp::Equal,
                text: "same text".to_string(),
            }]
        );
        assert_eq!(change_rate("same text", "same text"), 0);
    }

    #[test]
    fn empty_vs_empty_yields_no_spans() {
        assert!(diff("", "").is_empty());
        assert_eq!(change_rate("", ""), 0);
    }

    #[test]
    fn empty_old_yields_one_insert_span() {
        let spans = diff("", "brand new");
        assert_eq!(
            spans,
            vec![DiffSpan {
                op: DiffOp::Insert,
                text: "brand new".to_string(),
            }]
        );
        assert_eq!(change_rate("", "brand new"), 100);
    }

    #[test]
    fn empty_new_yields_one_delete_span() {
        let spans = diff("gone", "");
        assert_eq!(
            spans,
            vec![DiffSpan {
                op: DiffOp::Delete,
                text: "gone".to_string(),
            }]
        );
        assert_eq!(change_rate("gone", ""), 100);
    }

    #[test]
    fn round_trip_law_holds_for_mixed_edits() {
        let cases = [
            ("You are a helpful assistant.", "You are a rigorous assistant."),
            ("abcdef", "abqqef"),
            ("short", "a much longer replacement"),
            ("línea uno\nlínea dos", "línea uno\nlínea tres"),
            ("", "x"),
            ("x", ""),
        ];
        for (old_text, new_text) in cases {
            let spans = diff(old_text, new_text);
            assert_eq!(old_side(&spans), old_text, "old side for {old_text:?}");
            assert_eq!(new_side(&spans), new_text, "new side for {new_text:?}");
        }
    }

    #[test]
    fn spans_alternate_without_empty_runs() {
        let spans = diff("the quick brown fox", "the slow brown cat");
        for pair in spans.windows(2) {
            assert_ne!(pair[0].op, pair[1].op);
        }
        assert!(spans.iter().all(|s| !s.text.is_empty()));
    }

    #[test]
    fn change_rate_is_deterministic_and_bounded() {
        let old_text = "alpha beta gamma";
        let new_text = "alpha delta gamma";
        let first = change_rate(old_text, new_text);
        let second = change_rate(old_text, new_text);
        assert_eq!(first, second);
        assert!(first <= 100);
        assert!(first > 0);
    }

    #[test]
    fn report_counts_match_span_contents() {
        let report = DiffReport::compare("abc", "abXc");
        assert_eq!(report.additions, 1);
        assert_eq!(report.deletions, 0);
        assert_eq!(report.change_rate, change_rate("abc", "abXc"));
    }

    #[test]
    fn render_html_wraps_and_escapes() {
        let report = DiffReport::compare("a<b", "a>b");
        let html = report.render_html();
        assert!(html.contains("diff-added"));
        assert!(html.contains("diff-deleted"));
        assert!(html.contains("&lt;"));
        assert!(html.contains("&gt;"));
        assert!(!html.contains("a<b"));
    }

    #[test]
    fn unicode_counts_use_scalars_not_bytes() {
        // "é" is two bytes but one scalar on each side.
        let report = DiffReport::compare("é", "ü");
        assert_eq!(report.additions, 1);
        assert_eq!(report.deletions, 1);
        assert_eq!(report.change_rate, 100);
    }
}
