//! Opaque byte-string helpers used to rewrite Stratum JSON lines in place,
//! without pulling a JSON parser onto the relay hot path. All three
//! operations work on UTF-8 text, which every Stratum line is in practice.

/// Returns a new string equal to `src` with every non-overlapping,
/// left-to-right occurrence of `pattern` replaced by `replacement`.
///
/// `pattern` must be non-empty; an empty pattern would match at every byte
/// offset and never advance, so this returns `src` unchanged rather than
/// looping forever.
pub fn substitute(src: &str, pattern: &str, replacement: &str) -> String {
    if pattern.is_empty() {
        return src.to_string();
    }
    src.replace(pattern, replacement)
}

/// Returns the bytes strictly between the first occurrence of `left` and
/// the first occurrence of `right` that begins at or after the end of that
/// `left`. `None` if either delimiter is absent.
pub fn slice_between<'a>(src: &'a str, left: &str, right: &str) -> Option<&'a str> {
    let left_start = src.find(left)?;
    let left_end = left_start + left.len();
    let right_start = src[left_end..].find(right)? + left_end;
    Some(&src[left_end..right_start])
}

/// As [`slice_between`], but returns the span from the start of `left`
/// through the end of `right`, inclusive of both delimiters.
pub fn slice_inclusive<'a>(src: &'a str, left: &str, right: &str) -> Option<&'a str> {
    let left_start = src.find(left)?;
    let left_end = left_start + left.len();
    let right_start = src[left_end..].find(right)? + left_end;
    let right_end = right_start + right.len();
    Some(&src[left_start..right_end])
}
