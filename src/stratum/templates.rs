use crate::util::bytes::substitute;

/// Placeholder token substituted into the templates below at send time.
pub const REPLACE_PATTERN: &str = "REPLACE_PATTERN";

const RESULT_TRUE_TEMPLATE: &str = "{\"id\": REPLACE_PATTERN,\"result\": true,\"error\": null}";
const SET_DIFFICULTY_TEMPLATE: &str =
    "{\"id\": null,\"method\": \"mining.set_difficulty\",\"params\": [REPLACE_PATTERN]}";

/// Builds a synthetic `{"id": <id>, "result": true, "error": null}` line,
/// used to fake an authorize/submit acknowledgement when replaying cached
/// handshake state instead of forwarding to the real upstream.
pub fn result_true(id: &str) -> String {
    substitute(RESULT_TRUE_TEMPLATE, REPLACE_PATTERN, id)
}

/// Builds a synthetic `mining.set_difficulty` notification carrying the
/// cached difficulty params for the current phase.
pub fn set_difficulty(params: &str) -> String {
    substitute(SET_DIFFICULTY_TEMPLATE, REPLACE_PATTERN, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_true_substitutes_id() {
        assert_eq!(
            result_true("42"),
            "{\"id\": 42,\"result\": true,\"error\": null}"
        );
    }

    #[test]
    fn set_difficulty_substitutes_params() {
        assert_eq!(
            set_difficulty("16384"),
            "{\"id\": null,\"method\": \"mining.set_difficulty\",\"params\": [16384]}"
        );
    }
}
