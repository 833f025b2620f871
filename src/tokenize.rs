//! Splitting raw input into command segments and words.
//!
//! Two splitters cover everything the interpreter needs: a line is cut into
//! segments on the operator chosen by [`crate::classify`], and each segment
//! is cut into words on whitespace. Both produce owned, trimmed strings with
//! no capacity limit.

/// Split `line` on every occurrence of the literal `delim`, trimming each
/// fragment.
///
/// Empty fragments are kept: `"ls |"` split on `"|"` yields `["ls", ""]`.
/// A trailing operator is something the executors want to notice, so the
/// check happens at their boundary rather than silently in here.
pub fn split_segments(line: &str, delim: &str) -> Vec<String> {
    line.split(delim).map(|s| s.trim().to_string()).collect()
}

/// Split a command segment into words on runs of whitespace.
///
/// The first word is the program name, the rest are its arguments. Never
/// produces empty words; an all-whitespace segment yields an empty vector.
pub fn split_words(segment: &str) -> Vec<String> {
    segment.split_whitespace().map(str::to_string).collect()
}
