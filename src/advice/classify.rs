//! 失敗の分類（優先順位付きのルールリスト）
//!
//! ルールは上から順に評価し、最初にマッチしたものを採用する。
//! ボディ読み取り失敗は原因によって細分されるため、汎用の
//! `BodyNotReadable` より前に原因別のルールを置く。

use crate::common::StatusCode;
use crate::error::{Cause, Error};
use super::kind::ErrorKind;

/// 述語とカテゴリの組
pub struct Rule {
    pub kind: ErrorKind,
    pub matches: fn(&Error) -> bool,
}

/// 分類ルール（評価順）
pub static RULES: [Rule; 15] = [
    Rule {
        kind: ErrorKind::MissingRequiredField,
        matches: |e| {
            matches!(
                e,
                Error::MessageNotReadable { cause: Some(Cause::MissingField { .. }), .. }
            )
        },
    },
    Rule {
        kind: ErrorKind::MalformedBody,
        matches: |e| {
            matches!(e, Error::MessageNotReadable { cause: Some(Cause::Syntax(_)), .. })
        },
    },
    Rule {
        kind: ErrorKind::BodyNotReadable,
        matches: |e| matches!(e, Error::MessageNotReadable { .. }),
    },
    Rule {
        kind: ErrorKind::ConstraintViolation,
        matches: |e| matches!(e, Error::ConstraintViolation(_)),
    },
    Rule {
        kind: ErrorKind::MethodArgumentNotValid,
        matches: |e| matches!(e, Error::MethodArgumentNotValid { .. }),
    },
    Rule {
        kind: ErrorKind::BindFailure,
        matches: |e| matches!(e, Error::Bind { .. }),
    },
    Rule {
        kind: ErrorKind::BindingError,
        matches: |e| matches!(e, Error::Binding(_)),
    },
    Rule {
        kind: ErrorKind::TypeMismatch,
        matches: |e| matches!(e, Error::TypeMismatch { .. }),
    },
    Rule {
        kind: ErrorKind::MissingParameter,
        matches: |e| matches!(e, Error::MissingParameter { .. }),
    },
    Rule {
        kind: ErrorKind::MissingPart,
        matches: |e| matches!(e, Error::MissingPart(_)),
    },
    Rule {
        kind: ErrorKind::ConversionFailure,
        matches: |e| matches!(e, Error::Conversion(_)),
    },
    Rule {
        kind: ErrorKind::UnsupportedMediaType,
        matches: |e| matches!(e, Error::UnsupportedMediaType { .. }),
    },
    Rule {
        kind: ErrorKind::IllegalArgument,
        matches: |e| matches!(e, Error::IllegalArgument(_)),
    },
    Rule {
        kind: ErrorKind::NotFound,
        matches: |e| matches!(e, Error::NotFound(_)),
    },
    Rule {
        kind: ErrorKind::InternalError,
        matches: |_| true,
    },
];

/// 失敗を分類し、カテゴリとステータスを返す
pub fn classify(error: &Error) -> (ErrorKind, StatusCode) {
    let kind = RULES
        .iter()
        .find(|rule| (rule.matches)(error))
        .map(|rule| rule.kind)
        .unwrap_or(ErrorKind::InternalError);
    (kind, kind.status())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TypeDescriptor;
    use crate::validation::{ConstraintViolation, FieldRejection};
    use serde_json::Value;

    fn samples() -> Vec<(Error, ErrorKind)> {
        vec![
            (
                Error::not_readable(
                    "JSON parse error: missing field `title`",
                    Some(Cause::MissingField {
                        field: "title".to_string(),
                        message: "missing field `title`".to_string(),
                    }),
                ),
                ErrorKind::MissingRequiredField,
            ),
            (
                Error::not_readable("JSON parse error", Some(Cause::Syntax("eof".to_string()))),
                ErrorKind::MalformedBody,
            ),
            (
                Error::not_readable("JSON parse error", Some(Cause::Other("invalid type".to_string()))),
                ErrorKind::BodyNotReadable,
            ),
            (
                Error::not_readable("Required request body is missing", None),
                ErrorKind::BodyNotReadable,
            ),
            (
                Error::ConstraintViolation(vec![ConstraintViolation {
                    property_path: "get.id".to_string(),
                    invalid_value: Value::from("hoge"),
                    message: "This ID is invalid.".to_string(),
                }]),
                ErrorKind::ConstraintViolation,
            ),
            (
                Error::MethodArgumentNotValid {
                    target: "book".to_string(),
                    rejections: vec![FieldRejection::new("title", Value::from(""), "size must be between 1 and 50")],
                },
                ErrorKind::MethodArgumentNotValid,
            ),
            (
                Error::Bind { target: "tag".to_string(), rejections: vec![] },
                ErrorKind::BindFailure,
            ),
            (Error::Binding("Required request header".to_string()), ErrorKind::BindingError),
            (
                Error::TypeMismatch {
                    name: "id".to_string(),
                    value: "foo".to_string(),
                    required_type: Some(TypeDescriptor::primitive("int")),
                    cause: Some(Cause::NumberFormat("For input string: \"foo\"".to_string())),
                },
                ErrorKind::TypeMismatch,
            ),
            (
                Error::MissingParameter { name: "m".to_string(), type_name: "String".to_string() },
                ErrorKind::MissingParameter,
            ),
            (Error::MissingPart("file".to_string()), ErrorKind::MissingPart),
            (Error::Conversion("Could not write JSON".to_string()), ErrorKind::ConversionFailure),
            (
                Error::UnsupportedMediaType { content_type: Some("text/plain".to_string()), supported: vec![] },
                ErrorKind::UnsupportedMediaType,
            ),
            (
                Error::IllegalArgument("Request ID must be specified".to_string()),
                ErrorKind::IllegalArgument,
            ),
            (Error::NotFound(None), ErrorKind::NotFound),
            (Error::Internal(Some("boom".to_string())), ErrorKind::InternalError),
            (Error::Configuration("bad pattern".to_string()), ErrorKind::InternalError),
            (
                Error::Other(Box::new(std::io::Error::new(std::io::ErrorKind::Other, "disk"))),
                ErrorKind::InternalError,
            ),
        ]
    }

    #[test]
    fn test_every_kind_is_reachable() {
        for (error, expected) in samples() {
            let (kind, status) = classify(&error);
            assert_eq!(kind, expected, "{:?}", error);
            assert_eq!(status, expected.status());
        }
    }

    #[test]
    fn test_classification_is_deterministic() {
        for (error, _) in samples() {
            let first = classify(&error);
            for _ in 0..3 {
                assert_eq!(classify(&error), first);
            }
        }
    }

    #[test]
    fn test_missing_field_takes_precedence_over_body_not_readable() {
        let error = Error::not_readable(
            "JSON parse error",
            Some(Cause::MissingField {
                field: "title".to_string(),
                message: "missing field `title`".to_string(),
            }),
        );
        assert!((RULES[2].matches)(&error));
        assert_eq!(classify(&error).0, ErrorKind::MissingRequiredField);
    }

    #[test]
    fn test_rule_order_follows_kind_order() {
        let kinds: Vec<_> = RULES.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, ErrorKind::ALL.to_vec());
    }
}
