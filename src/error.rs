//! エラー型の定義
//!
//! リクエストのバインド・バリデーション中に発生する失敗をカテゴリごとに表現する。
//! 分類とメッセージ抽出は [`crate::advice`] が担当する。

use thiserror::Error;

use crate::common::params::TypeDescriptor;
use crate::validation::{ConstraintViolation, FieldRejection};

/// 失敗の直接原因（ネストされたcause）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Cause {
    /// デシリアライズ時に必須フィールドが存在しない
    #[error("{message}")]
    MissingField { field: String, message: String },

    /// JSONの構文エラー
    #[error("{0}")]
    Syntax(String),

    /// 数値への変換失敗
    #[error("{0}")]
    NumberFormat(String),

    /// 上記以外の原因
    #[error("{0}")]
    Other(String),
}

/// アプリケーションのエラー型
#[derive(Error, Debug)]
pub enum Error {
    /// リクエストボディを読み取れない（パース・変換失敗）
    #[error("{message}")]
    MessageNotReadable {
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    /// パス・クエリパラメータの制約違反
    #[error("{}", describe_violations(.0))]
    ConstraintViolation(Vec<ConstraintViolation>),

    /// リクエストボディのバリデーション失敗
    #[error("Validation failed for argument '{target}' with {} errors", .rejections.len())]
    MethodArgumentNotValid {
        target: String,
        rejections: Vec<FieldRejection>,
    },

    /// クエリからモデルへのバインド失敗
    #[error("{} errors binding '{target}'", .rejections.len())]
    Bind {
        target: String,
        rejections: Vec<FieldRejection>,
    },

    /// バインドに必要なメタデータ（パス変数、ヘッダー）の欠落
    #[error("{0}")]
    Binding(String),

    /// パラメータの型不一致
    #[error(
        "Failed to convert value of type 'String' to required type '{}'; {}",
        .required_type.as_ref().map(|t| t.name()).unwrap_or("<unknown>"),
        .cause.as_ref().map(|c| c.to_string()).unwrap_or_default()
    )]
    TypeMismatch {
        name: String,
        value: String,
        required_type: Option<TypeDescriptor>,
        #[source]
        cause: Option<Cause>,
    },

    /// 必須パラメータの欠落
    #[error("Required request parameter '{name}' for method parameter type {type_name} is not present")]
    MissingParameter { name: String, type_name: String },

    /// 必須マルチパートパートの欠落
    #[error("Required request part '{0}' is not present")]
    MissingPart(String),

    /// メッセージ変換（シリアライズ）の失敗
    #[error("{0}")]
    Conversion(String),

    /// サポートされていないContent-Type
    #[error("Content type '{}' not supported", .content_type.as_deref().unwrap_or("application/octet-stream"))]
    UnsupportedMediaType {
        content_type: Option<String>,
        supported: Vec<String>,
    },

    /// 呼び出し側が渡した不正な引数
    #[error("{0}")]
    IllegalArgument(String),

    /// 対象が見つからない
    #[error("{}", .0.as_deref().unwrap_or(""))]
    NotFound(Option<String>),

    /// 設定エラー（ルートパターン不正など）
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 内部サーバーエラー
    #[error("{}", .0.as_deref().unwrap_or(""))]
    Internal(Option<String>),

    /// その他の任意のエラー
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// ボディ読み取り失敗を作成
    pub fn not_readable(message: impl Into<String>, cause: Option<Cause>) -> Self {
        Error::MessageNotReadable {
            message: message.into(),
            cause,
        }
    }

    /// ネストされた原因を取得
    pub fn cause(&self) -> Option<&Cause> {
        match self {
            Error::MessageNotReadable { cause, .. } | Error::TypeMismatch { cause, .. } => {
                cause.as_ref()
            }
            _ => None,
        }
    }

    /// トップレベルのメッセージ（空の場合はNone）
    pub fn message(&self) -> Option<String> {
        let message = self.to_string();
        if message.is_empty() {
            None
        } else {
            Some(message)
        }
    }

    /// 原因チェーンを一行にまとめる（ログ用）
    pub fn cause_chain(&self) -> String {
        let mut parts = vec![format!("{:?}", self)];
        let mut source = std::error::Error::source(self);
        while let Some(s) = source {
            parts.push(s.to_string());
            source = s.source();
        }
        parts.join(" <- ")
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Conversion(e.to_string())
    }
}

fn describe_violations(violations: &[ConstraintViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.property_path, v.message))
        .collect::<Vec<_>>()
        .join(", ")
}
