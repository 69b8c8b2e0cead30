use super::{DiffOp, DiffSpan};

/// Semantic cleanup over a raw char-level edit script: fold equalities that
/// are no longer than the larger side of both flanking edit runs into the
/// surrounding delete/insert pair, then re-merge runs. Iterates until no
/// equality qualifies. The partition invariants are preserved because a
/// folded equality contributes its text to both sides.
pub(super) fn semantic(spans: Vec<DiffSpan>) -> Vec<DiffSpan> {
    let mut spans = merge_runs(spans);

    'fold: loop {
        for i in 0..spans.len() {
            if spans[i].op != DiffOp::Equal {
                continue;
            }
            let (ins_before, del_before) = edit_run(&spans[..i], Direction::Backward);
            let (ins_after, del_after) = edit_run(&spans[i + 1..], Direction::Forward);
            if ins_before + del_before == 0 || ins_after + del_after == 0 {
                continue;
            }
            let eq_len = char_len(&spans[i].text);
            if eq_len <= ins_before.max(del_before) && eq_len <= ins_after.max(del_after) {
                let text = spans[i].text.clone();
                spans[i] = DiffSpan {
                    op: DiffOp::Delete,
                    text: text.clone(),
                };
                spans.insert(
                    i + 1,
                    DiffSpan {
                        op: DiffOp::Insert,
                        text,
                    },
                );
                spans = merge_runs(spans);
                continue 'fold;
            }
        }
        break;
    }

    spans
}

enum Direction {
    Forward,
    Backward,
}

/// Char counts (insertions, deletions) of the maximal edit run adjacent to
/// an equality, scanning away from it.
fn edit_run(spans: &[DiffSpan], direction: Direction) -> (usize, usize) {
    let mut insertions = 0;
    let mut deletions = 0;
    let iter: Box<dyn Iterator<Item = &DiffSpan>> = match direction {
        Direction::Forward => Box::new(spans.iter()),
        Direction::Backward => Box::new(spans.iter().rev()),
    };
    for span in iter {
        match span.op {
            DiffOp::Insert => insertions += char_len(&span.text),
            DiffOp::Delete => deletions += char_len(&span.text),
            DiffOp::Equal => break,
        }
    }
    (insertions, deletions)
}

/// Normalizes a span sequence: within each run of edits between equalities,
/// deletions are emitted before insertions and each side is concatenated;
/// adjacent equalities merge; empty spans drop out. Relative order within
/// each side is preserved, so reassembly of either side is unchanged.
pub(super) fn merge_runs(spans: Vec<DiffSpan>) -> Vec<DiffSpan> {
    let mut out: Vec<DiffSpan> = Vec::with_capacity(spans.len());
    let mut deletions = String::new();
    let mut insertions = String::new();

    for span in spans {
        if span.text.is_empty() {
            continue;
        }
        match span.op {
            DiffOp::Delete => deletions.push_str(&span.text),
            DiffOp::Insert => insertions.push_str(&span.text),
            DiffOp::Equal => {
                flush_edits(&mut out, &mut deletions, &mut insertions);
                match out.last_mut() {
                    Some(last) if last.op == DiffOp::Equal => last.text.push_str(&span.text),
                    _ => out.push(span),
                }
            }
        }
    }
    flush_edits(&mut out, &mut deletions, &mut insertions);
    out
}

fn flush_edits(out: &mut Vec<DiffSpan>, deletions: &mut String, insertions: &mut String) {
    if !deletions.is_empty() {
        out.push(DiffSpan {
            op: DiffOp::Delete,
            text: std::mem::take(deletions),
        });
    }
    if !insertions.is_empty() {
        out.push(DiffSpan {
            op: DiffOp::Insert,
            text: std::mem::take(insertions),
        });
    }
}

pub(super) fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(op: DiffOp, text: &str) -> DiffSpan {
        DiffSpan {
            op,
            text: text.to_string(),
        }
    }

    #[test]
    fn merges_adjacent_runs_and_orders_delete_before_insert() {
        let merged = merge_runs(vec![
            span(DiffOp::Insert, "a"),
            span(DiffOp::Delete, "b"),
            span(DiffOp::Insert, "c"),
            span(DiffOp::Equal, "x"),
            span(DiffOp::Equal, "y"),
        ]);
        assert_eq!(
            merged,
            vec![
                span(DiffOp::Delete, "b"),
                span(DiffOp::Insert, "ac"),
                span(DiffOp::Equal, "xy"),
            ]
        );
    }

    #[test]
    fn folds_short_equality_between_edits() {
        let cleaned = semantic(vec![
            span(DiffOp::Delete, "abcd"),
            span(DiffOp::Equal, "x"),
            span(DiffOp::Insert, "wxyz"),
        ]);
        assert_eq!(
            cleaned,
            vec![span(DiffOp::Delete, "abcdx"), span(DiffOp::Insert, "xwxyz")]
        );
    }

    #[test]
    fn keeps_equality_longer_than_both_flanks() {
        let spans = vec![
            span(DiffOp::Delete, "ab"),
            span(DiffOp::Equal, "stable middle"),
            span(DiffOp::Insert, "cd"),
        ];
        assert_eq!(semantic(spans.clone()), spans);
    }

    #[test]
    fn leading_and_trailing_equalities_are_never_folded() {
        let spans = vec![
            span(DiffOp::Equal, "a"),
            span(DiffOp::Delete, "bbbb"),
            span(DiffOp::Insert, "cccc"),
            span(DiffOp::Equal, "d"),
        ];
        assert_eq!(semantic(spans.clone()), spans);
    }
}
