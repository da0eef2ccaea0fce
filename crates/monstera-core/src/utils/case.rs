//! snake_case / camelCase conversion for JSON payloads.
//!
//! The backend speaks snake_case; callers work with camelCase. Conversion is
//! applied to object keys recursively and never touches values.

use serde_json::{Map, Value};

/// `user_id` -> `userId`. Leading underscores are preserved.
pub fn snake_to_camel(input: &str) -> String {
    let trimmed = input.trim_start_matches('_');
    let mut out = String::with_capacity(input.len());
    out.push_str(&input[..input.len() - trimmed.len()]);

    let mut upper_next = false;
    for c in trimmed.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }

    // A trailing underscore has nothing to capitalize; keep it
    if upper_next {
        out.push('_');
    }
    out
}

/// `userId` -> `user_id`, `HTTPStatus` -> `http_status`.
pub fn camel_to_snake(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.map_or(false, |n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Rewrite every object key in `value` to camelCase
pub fn keys_to_camel(value: Value) -> Value {
    convert_keys(value, &snake_to_camel)
}

/// Rewrite every object key in `value` to snake_case
pub fn keys_to_snake(value: Value) -> Value {
    convert_keys(value, &camel_to_snake)
}

fn convert_keys(value: Value, convert: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => {
            let converted: Map<String, Value> = map
                .into_iter()
                .map(|(key, inner)| (convert(&key), convert_keys(inner, convert)))
                .collect();
            Value::Object(converted)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| convert_keys(item, convert))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_snake_to_camel() {
        assert_eq!(snake_to_camel("user_id"), "userId");
        assert_eq!(snake_to_camel("weekly_report_status"), "weeklyReportStatus");
        assert_eq!(snake_to_camel("name"), "name");
        assert_eq!(snake_to_camel("_internal_flag"), "_internalFlag");
        assert_eq!(snake_to_camel("double__gap"), "doubleGap");
    }

    #[test]
    fn test_camel_to_snake() {
        assert_eq!(camel_to_snake("userId"), "user_id");
        assert_eq!(camel_to_snake("weeklyReportStatus"), "weekly_report_status");
        assert_eq!(camel_to_snake("HTTPStatus"), "http_status");
        assert_eq!(camel_to_snake("address2Line"), "address2_line");
        assert_eq!(camel_to_snake("already_snake"), "already_snake");
    }

    #[test]
    fn test_nested_key_conversion() {
        let body = json!({
            "expense_items": [
                {"item_id": 1, "receipt_url": "https://files/receipt_1.png"}
            ],
            "approval_status": {"approved_by": null}
        });

        let converted = keys_to_camel(body);
        assert_eq!(
            converted,
            json!({
                "expenseItems": [
                    {"itemId": 1, "receiptUrl": "https://files/receipt_1.png"}
                ],
                "approvalStatus": {"approvedBy": null}
            })
        );
    }

    #[test]
    fn test_values_are_untouched() {
        let converted = keys_to_snake(json!({"leaveType": "paid_leave"}));
        assert_eq!(converted, json!({"leave_type": "paid_leave"}));
    }

    proptest! {
        #[test]
        fn snake_camel_snake_is_identity(s in "[a-z]{1,8}(_[a-z]{1,8}){0,4}") {
            prop_assert_eq!(camel_to_snake(&snake_to_camel(&s)), s);
        }

        #[test]
        fn camel_output_has_no_underscores(s in "[a-z]{1,8}(_[a-z]{1,8}){0,4}") {
            prop_assert!(!snake_to_camel(&s).contains('_'));
        }
    }
}
