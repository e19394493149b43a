//! カテゴリごとのメッセージ抽出

use crate::error::{Cause, Error};
use super::kind::ErrorKind;

/// 400系でメッセージが無い場合のデフォルト
pub const DEFAULT_BAD_REQUEST_MESSAGE: &str = "Bad Request";

/// 失敗とカテゴリからユーザー向けメッセージを生成する
///
/// 期待する構造（原因、違反リスト）が無い場合は失敗自身のメッセージにフォールバックする。
pub fn extract_message(error: &Error, kind: ErrorKind) -> String {
    let message = match (kind, error) {
        (
            ErrorKind::MissingRequiredField,
            Error::MessageNotReadable { cause: Some(Cause::MissingField { field, .. }), .. },
        ) => Some(format!("'{}' must not be null", field)),

        (
            ErrorKind::MalformedBody,
            Error::MessageNotReadable { cause: Some(cause @ Cause::Syntax(_)), .. },
        ) => Some(format!("JSON parse error: {}", cause)),

        (ErrorKind::MethodArgumentNotValid, Error::MethodArgumentNotValid { rejections, .. })
        | (ErrorKind::BindFailure, Error::Bind { rejections, .. })
            if !rejections.is_empty() =>
        {
            Some(join(rejections.iter().map(|r| r.to_string())))
        }

        (ErrorKind::ConstraintViolation, Error::ConstraintViolation(violations))
            if !violations.is_empty() =>
        {
            Some(join(violations.iter().map(|v| v.message.clone())))
        }

        (
            ErrorKind::TypeMismatch,
            Error::TypeMismatch { name, required_type, cause: Some(cause), .. },
        ) => {
            let type_name = required_type
                .as_ref()
                .map(|t| t.display_name())
                .unwrap_or_else(|| "<unknown>".to_string());
            Some(format!("'{}' value of type must be '{}'. {}", name, type_name, cause))
        }

        _ => None,
    };

    message
        .or_else(|| error.message())
        .unwrap_or_else(|| default_message(kind))
}

fn default_message(kind: ErrorKind) -> String {
    if kind.status().as_u16() == 400 {
        DEFAULT_BAD_REQUEST_MESSAGE.to_string()
    } else {
        String::new()
    }
}

fn join(parts: impl Iterator<Item = String>) -> String {
    parts.collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::classify;
    use crate::common::TypeDescriptor;
    use crate::validation::{ConstraintViolation, FieldRejection};
    use serde_json::{json, Value};

    fn message_of(error: &Error) -> String {
        let (kind, _) = classify(error);
        extract_message(error, kind)
    }

    #[test]
    fn test_missing_required_field() {
        let error = Error::not_readable(
            "JSON parse error: missing field `title` at line 1 column 50",
            Some(Cause::MissingField {
                field: "title".to_string(),
                message: "missing field `title` at line 1 column 50".to_string(),
            }),
        );
        assert_eq!(message_of(&error), "'title' must not be null");
    }

    #[test]
    fn test_malformed_body_uses_cause_message() {
        let error = Error::not_readable(
            "JSON parse error: key must be a string at line 1 column 2",
            Some(Cause::Syntax("key must be a string at line 1 column 2".to_string())),
        );
        assert_eq!(
            message_of(&error),
            "JSON parse error: key must be a string at line 1 column 2"
        );
    }

    #[test]
    fn test_body_not_readable_uses_own_message() {
        let error = Error::not_readable("Required request body is missing", None);
        assert_eq!(message_of(&error), "Required request body is missing");
    }

    #[test]
    fn test_field_rejections_are_joined() {
        let error = Error::MethodArgumentNotValid {
            target: "book".to_string(),
            rejections: vec![
                FieldRejection::new("title", json!(""), "size must be between 1 and 50"),
                FieldRejection::new("priority", json!(6), "must be between 1 and 5"),
            ],
        };
        assert_eq!(
            message_of(&error),
            "'title' value as '' rejected. size must be between 1 and 50, \
'priority' value as '6' rejected. must be between 1 and 5"
        );
    }

    #[test]
    fn test_bind_failure_uses_same_format() {
        let error = Error::Bind {
            target: "tag".to_string(),
            rejections: vec![FieldRejection::new("tag", Value::Null, "must not be null")],
        };
        assert_eq!(message_of(&error), "'tag' value as 'null' rejected. must not be null");
    }

    #[test]
    fn test_empty_rejections_fall_back_to_raw_message() {
        let error = Error::Bind { target: "tag".to_string(), rejections: vec![] };
        assert_eq!(message_of(&error), "0 errors binding 'tag'");
    }

    #[test]
    fn test_constraint_violations_have_no_prefix() {
        let error = Error::ConstraintViolation(vec![
            ConstraintViolation {
                property_path: "get.id".to_string(),
                invalid_value: json!("hoge"),
                message: "This ID is invalid.".to_string(),
            },
            ConstraintViolation {
                property_path: "get.count".to_string(),
                invalid_value: json!(0),
                message: "must be greater than or equal to 1".to_string(),
            },
        ]);
        assert_eq!(
            message_of(&error),
            "This ID is invalid., must be greater than or equal to 1"
        );
    }

    #[test]
    fn test_type_mismatch_lowercases_type_name() {
        let error = Error::TypeMismatch {
            name: "id".to_string(),
            value: "foo".to_string(),
            required_type: Some(TypeDescriptor::primitive("int")),
            cause: Some(Cause::NumberFormat("For input string: \"foo\"".to_string())),
        };
        assert_eq!(
            message_of(&error),
            "'id' value of type must be 'int'. For input string: \"foo\""
        );

        let error = Error::TypeMismatch {
            name: "since".to_string(),
            value: "x".to_string(),
            required_type: Some(TypeDescriptor::reference("chrono::NaiveDate")),
            cause: Some(Cause::Other("input contains invalid characters".to_string())),
        };
        assert_eq!(
            message_of(&error),
            "'since' value of type must be 'naivedate'. input contains invalid characters"
        );
    }

    #[test]
    fn test_type_mismatch_without_type_or_cause() {
        let error = Error::TypeMismatch {
            name: "id".to_string(),
            value: "foo".to_string(),
            required_type: None,
            cause: Some(Cause::Other("bad".to_string())),
        };
        assert_eq!(message_of(&error), "'id' value of type must be '<unknown>'. bad");

        let error = Error::TypeMismatch {
            name: "id".to_string(),
            value: "foo".to_string(),
            required_type: Some(TypeDescriptor::primitive("int")),
            cause: None,
        };
        assert_eq!(
            message_of(&error),
            "Failed to convert value of type 'String' to required type 'int'; "
        );
    }

    #[test]
    fn test_defaults_for_absent_messages() {
        assert_eq!(message_of(&Error::IllegalArgument(String::new())), "Bad Request");
        assert_eq!(message_of(&Error::NotFound(None)), "");
        assert_eq!(message_of(&Error::Internal(None)), "");
        assert_eq!(
            message_of(&Error::NotFound(Some("No value present".to_string()))),
            "No value present"
        );
    }

    #[test]
    fn test_internal_message_is_surfaced_as_is() {
        let error = Error::Other(Box::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            "connection reset",
        )));
        assert_eq!(message_of(&error), "connection reset");
    }
}
