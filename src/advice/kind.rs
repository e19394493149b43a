//! 失敗カテゴリとステータスコードの対応

use std::fmt;

use crate::common::StatusCode;

/// 失敗カテゴリ（閉じた集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingRequiredField,
    MalformedBody,
    BodyNotReadable,
    ConstraintViolation,
    MethodArgumentNotValid,
    BindFailure,
    BindingError,
    TypeMismatch,
    MissingParameter,
    MissingPart,
    ConversionFailure,
    UnsupportedMediaType,
    IllegalArgument,
    NotFound,
    InternalError,
}

impl ErrorKind {
    /// 全カテゴリ（分類の優先順）
    pub const ALL: [ErrorKind; 15] = [
        ErrorKind::MissingRequiredField,
        ErrorKind::MalformedBody,
        ErrorKind::BodyNotReadable,
        ErrorKind::ConstraintViolation,
        ErrorKind::MethodArgumentNotValid,
        ErrorKind::BindFailure,
        ErrorKind::BindingError,
        ErrorKind::TypeMismatch,
        ErrorKind::MissingParameter,
        ErrorKind::MissingPart,
        ErrorKind::ConversionFailure,
        ErrorKind::UnsupportedMediaType,
        ErrorKind::IllegalArgument,
        ErrorKind::NotFound,
        ErrorKind::InternalError,
    ];

    /// レスポンスの `error_type` に使うラベル
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingRequiredField => "MissingRequiredField",
            ErrorKind::MalformedBody => "MalformedBody",
            ErrorKind::BodyNotReadable => "BodyNotReadable",
            ErrorKind::ConstraintViolation => "ConstraintViolation",
            ErrorKind::MethodArgumentNotValid => "MethodArgumentNotValid",
            ErrorKind::BindFailure => "BindFailure",
            ErrorKind::BindingError => "BindingError",
            ErrorKind::TypeMismatch => "TypeMismatch",
            ErrorKind::MissingParameter => "MissingParameter",
            ErrorKind::MissingPart => "MissingPart",
            ErrorKind::ConversionFailure => "ConversionFailure",
            ErrorKind::UnsupportedMediaType => "UnsupportedMediaType",
            ErrorKind::IllegalArgument => "IllegalArgument",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::InternalError => "InternalError",
        }
    }

    /// カテゴリに対応するHTTPステータス
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NotFound,
            ErrorKind::InternalError => StatusCode::InternalServerError,
            _ => StatusCode::BadRequest,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
