//! 失敗からエラーレスポンスへの変換
//!
//! [`classify`] でカテゴリとステータスを決め、[`extract_message`] でメッセージを作り、
//! [`ErrorAdvice`] がログを1回出力してJSONレスポンスを組み立てる。

pub mod classify;
pub mod kind;
pub mod log;
pub mod message;

use std::fmt;
use std::sync::Arc;

use ::log::error;
use serde::{Deserialize, Serialize};

use crate::common::utils::error_log_multiline;
use crate::common::Response;
use crate::error::Error;

pub use self::classify::{classify, Rule, RULES};
pub use self::kind::ErrorKind;
pub use self::log::{ErrorLog, RequestInfo, WarnLog};
pub use self::message::extract_message;

/// クライアントに返すエラーボディ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    #[serde(rename = "error_message")]
    pub message: String,
    #[serde(rename = "error_type")]
    pub kind: String,
}

/// 失敗をエラーレスポンスに変換する
#[derive(Clone)]
pub struct ErrorAdvice {
    log: Arc<dyn ErrorLog>,
    multiline: bool,
}

impl fmt::Debug for ErrorAdvice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorAdvice")
            .field("multiline", &self.multiline)
            .finish_non_exhaustive()
    }
}

impl Default for ErrorAdvice {
    fn default() -> Self {
        Self::new(Arc::new(WarnLog))
    }
}

impl ErrorAdvice {
    /// 出力先を指定して作成（単一行ログ）
    pub fn new(log: Arc<dyn ErrorLog>) -> Self {
        Self { log, multiline: false }
    }

    /// 環境変数 `FAULTBRIDGE_ERROR_LOG_MULTILINE` を反映して作成
    pub fn from_env(log: Arc<dyn ErrorLog>) -> Self {
        Self::new(log).with_multiline(error_log_multiline())
    }

    /// リクエストをヘッダーごとに改行してログに出すかどうか
    pub fn with_multiline(mut self, multiline: bool) -> Self {
        self.multiline = multiline;
        self
    }

    /// 分類・メッセージ抽出・ログ出力を行い、エラーボディを返す
    pub fn error_response(&self, err: &Error, request: &RequestInfo) -> ErrorResponse {
        let (kind, status) = classify(err);
        let message = extract_message(err, kind);

        self.log.warn(&format!(
            "[handle errors] {} : status:{}, message:{}, cause:{}",
            request.stringify(self.multiline),
            status.as_u16(),
            message,
            err.cause_chain()
        ));

        ErrorResponse {
            status: status.as_u16(),
            message,
            kind: kind.as_str().to_string(),
        }
    }

    /// 失敗をJSONレスポンスに変換
    pub fn handle(&self, err: &Error, request: &RequestInfo) -> Response {
        let body = self.error_response(err, request);
        match Response::new(body.status).json(&body) {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to serialize error response: {}", e);
                Response::new(body.status)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::log::MockErrorLog;
    use crate::common::{Method, Request};
    use crate::error::Cause;

    fn info() -> RequestInfo {
        let req = Request::new(Method::GET, "/api/books".to_string())
            .with_query_param("price", "evil")
            .with_header("User-Agent", "curl/8.0");
        RequestInfo::from_request(&req)
    }

    fn type_mismatch() -> Error {
        Error::TypeMismatch {
            name: "price".to_string(),
            value: "evil".to_string(),
            required_type: Some(crate::common::TypeDescriptor::primitive("int")),
            cause: Some(Cause::NumberFormat("For input string: \"evil\"".to_string())),
        }
    }

    #[test]
    fn test_error_response_logs_exactly_once() {
        let mut mock = MockErrorLog::new();
        mock.expect_warn()
            .withf(|entry: &str| {
                entry.starts_with("[handle errors] GET /api/books?price=evil  user-agent:curl/8.0 : status:400, message:'price' value of type must be 'int'.")
                    && entry.contains("cause:TypeMismatch")
            })
            .times(1)
            .return_const(());

        let advice = ErrorAdvice::new(Arc::new(mock));
        let body = advice.error_response(&type_mismatch(), &info());

        assert_eq!(
            body,
            ErrorResponse {
                status: 400,
                message: "'price' value of type must be 'int'. For input string: \"evil\"".to_string(),
                kind: "TypeMismatch".to_string(),
            }
        );
    }

    #[test]
    fn test_multiline_request_rendering() {
        let mut mock = MockErrorLog::new();
        mock.expect_warn()
            .withf(|entry: &str| entry.contains("price=evil \nuser-agent:curl/8.0 : status:404"))
            .times(1)
            .return_const(());

        let advice = ErrorAdvice::new(Arc::new(mock)).with_multiline(true);
        let body = advice.error_response(&Error::NotFound(None), &info());
        assert_eq!(body.status, 404);
        assert_eq!(body.message, "");
        assert_eq!(body.kind, "NotFound");
    }

    #[test]
    fn test_handle_renders_json_body() {
        let mut mock = MockErrorLog::new();
        mock.expect_warn().times(1).return_const(());

        let advice = ErrorAdvice::new(Arc::new(mock));
        let response = advice.handle(&Error::Internal(Some("boom".to_string())), &info());

        assert_eq!(response.status, 500);
        assert_eq!(
            response.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        let body: serde_json::Value =
            serde_json::from_slice(response.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "status": 500,
                "error_message": "boom",
                "error_type": "InternalError"
            })
        );
    }

    #[test]
    fn test_bad_request_never_has_empty_message() {
        let mut mock = MockErrorLog::new();
        mock.expect_warn().times(1).return_const(());

        let advice = ErrorAdvice::new(Arc::new(mock));
        let body = advice.error_response(&Error::IllegalArgument(String::new()), &info());
        assert_eq!(body.message, "Bad Request");
        assert_eq!(body.kind, "IllegalArgument");
    }
}
