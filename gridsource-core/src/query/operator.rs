//! # Operator Mapping
//!
//! Translates the grid's filter operator names into the remote API's operator tokens.
//!
//! Unrecognized operators are not an error: they fall back to the `contains` token, so a
//! grid release that ships new operators keeps working against the same remote API.

/// The grid operator used when the requested one is unknown.
pub const FALLBACK_OPERATOR: &str = "contains";

/// Looks up the remote token of a grid operator, if the operator is known.
pub fn lookup(ui_operator: &str) -> Option<&'static str> {
    let remote = match ui_operator {
        "contains" => "contains",
        "equals" | "is" => "eq",
        "startsWith" => "starts_with",
        "endsWith" => "ends_with",
        "not" => "ne",
        "in" => "in",
        "notIn" => "not_in",
        "greaterThan" => "gt",
        "greaterThanOrEqual" => "gte",
        "lessThan" => "lt",
        "lessThanOrEqual" => "lte",
        _ => return None,
    };

    Some(remote)
}

/// Maps a grid operator to its remote token, falling back to the `contains` token.
pub fn map_operator(ui_operator: &str) -> &'static str {
    match lookup(ui_operator) {
        Some(remote) => remote,
        None => {
            tracing::debug!(
                operator = ui_operator,
                fallback = FALLBACK_OPERATOR,
                "unrecognized filter operator"
            );
            fallback()
        }
    }
}

fn fallback() -> &'static str {
    lookup(FALLBACK_OPERATOR).unwrap_or(FALLBACK_OPERATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognized_operators() {
        let table = [
            ("contains", "contains"),
            ("equals", "eq"),
            ("is", "eq"),
            ("startsWith", "starts_with"),
            ("endsWith", "ends_with"),
            ("not", "ne"),
            ("in", "in"),
            ("notIn", "not_in"),
            ("greaterThan", "gt"),
            ("greaterThanOrEqual", "gte"),
            ("lessThan", "lt"),
            ("lessThanOrEqual", "lte"),
        ];

        for (ui, remote) in table {
            assert_eq!(map_operator(ui), remote, "operator '{ui}'");
        }
    }

    #[test]
    fn test_unrecognized_operators_fall_back_to_contains() {
        for ui in ["isAnyOf", "", "EQUALS", "doesNotContain", "after"] {
            assert_eq!(lookup(ui), None);
            assert_eq!(map_operator(ui), "contains", "operator '{ui}'");
        }
    }
}
