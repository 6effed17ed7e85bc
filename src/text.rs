//! Text Normalization
//!
//! Default post-processing applied to captured selection content before it is
//! re-served: newline bytes are removed first, then ASCII whitespace is
//! trimmed from both ends. Skipped entirely in verbatim mode.

/// Remove newlines, then trim surrounding ASCII whitespace.
///
/// Only ASCII bytes are touched, so valid UTF-8 stays valid.
pub fn normalize(input: &[u8]) -> Vec<u8> {
    let without_newlines: Vec<u8> = input.iter().copied().filter(|&b| b != b'\n').collect();

    let start = without_newlines
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(without_newlines.len());
    let end = without_newlines
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);

    without_newlines[start..end].to_vec()
}
