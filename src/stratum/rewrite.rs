//! Field-level rewrites used by the MITM relay: pulling a request's `id` out
//! to stamp onto a cached reply, and swapping the worker name inside a
//! `params` array. All three operate on whole lines and never touch bytes
//! outside the span they're rewriting.

use crate::util::bytes::{slice_between, slice_inclusive};

/// Extracts the raw (untrimmed-of-quotes) text of a message's `"id":` field,
/// assuming it is followed by a comma as in every template and real Stratum
/// frame this relay handles.
pub fn extract_id(line: &str) -> Option<&str> {
    slice_between(line, "\"id\":", ",").map(|s| s.trim())
}

/// Returns `line` with its `"id":<value>,` field replaced by `new_id`,
/// used to stamp a client's own request id onto a cached reply before
/// sending it back. Returns `line` unchanged if it has no `id` field.
pub fn replace_id(line: &str, new_id: &str) -> String {
    match slice_inclusive(line, "\"id\":", ",") {
        Some(span) => {
            let replacement = format!("\"id\": {new_id},");
            line.replacen(span, &replacement, 1)
        }
        None => line.to_string(),
    }
}

/// Replaces the first quoted element of a `"params":[...]` array with
/// `new_value`, used to swap a client's worker name before a frame is
/// forwarded to the venus pool. Returns `line` unchanged if there is no
/// params array or its first element isn't a quoted string.
pub fn rewrite_first_param(line: &str, new_value: &str) -> String {
    let Some(params) = slice_between(line, "\"params\":[", "]") else {
        return line.to_string();
    };
    let Some(first) = slice_between(params, "\"", "\"") else {
        return line.to_string();
    };
    let rewritten_params = params.replacen(first, new_value, 1);
    line.replacen(params, &rewritten_params, 1)
}
