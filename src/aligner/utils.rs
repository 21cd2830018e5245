use crate::aligner::{AlignmentResult, Operation};

/// Render an alignment as three lines: the pattern, a match line (`|` for matches, `*` for
/// mismatches) and the text. Gaps are shown as `-`.
///
/// The result must have been produced for this pattern and text.
pub fn format_alignment(pattern: &[u8], text: &[u8], aln: &AlignmentResult) -> String {
    let mut pattern_chars = Vec::with_capacity(aln.len());
    let mut aln_chars = Vec::with_capacity(aln.len());
    let mut text_chars = Vec::with_capacity(aln.len());

    let mut pattern_iter = pattern.iter();
    let mut text_iter = text.iter();

    for op in aln.operations() {
        let p = if op.consumes_pattern() { pattern_iter.next().copied() } else { None };
        let t = if op.consumes_text() { text_iter.next().copied() } else { None };

        pattern_chars.push(p.unwrap_or(b'-'));
        text_chars.push(t.unwrap_or(b'-'));
        aln_chars.push(match op {
            Operation::Match => b'|',
            Operation::Mismatch => b'*',
            Operation::Insert | Operation::Delete => b' ',
        });
    }

    format!(
        "{}\n{}\n{}",
        String::from_utf8_lossy(&pattern_chars),
        String::from_utf8_lossy(&aln_chars),
        String::from_utf8_lossy(&text_chars),
    )
}

/// Replay the operations against the inputs, and check that matches and mismatches are labeled
/// correctly and that both sequences are consumed exactly.
pub fn verify(pattern: &[u8], text: &[u8], aln: &AlignmentResult) -> bool {
    let (mut i, mut j) = (0, 0);

    for op in aln.operations() {
        match op {
            Operation::Match | Operation::Mismatch => {
                let (Some(p), Some(t)) = (pattern.get(i), text.get(j)) else {
                    return false;
                };

                if (p == t) != (*op == Operation::Match) {
                    return false;
                }

                i += 1;
                j += 1;
            },
            Operation::Insert => {
                if i >= pattern.len() {
                    return false;
                }

                i += 1;
            },
            Operation::Delete => {
                if j >= text.len() {
                    return false;
                }

                j += 1;
            },
        }
    }

    i == pattern.len() && j == text.len()
}
