//! HTTP関連の基本型とユーティリティ

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use log::warn;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::error::Category;
use serde_json::{Map, Value};

use crate::error::{Cause, Error};
use super::utils::is_header_value_valid;

/// HTTPステータスコード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    // 2xx Success
    Ok = 200,
    Created = 201,
    NoContent = 204,

    // 4xx Client Error
    BadRequest = 400,
    NotFound = 404,
    MethodNotAllowed = 405,
    PayloadTooLarge = 413,
    UnsupportedMediaType = 415,

    // 5xx Server Error
    InternalServerError = 500,
}

impl StatusCode {
    /// u16の値を取得
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// 理由句を取得
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::NoContent => "No Content",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::UnsupportedMediaType => "Unsupported Media Type",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// 成功ステータスかどうか判定
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.as_u16())
    }

    /// クライアントエラーかどうか判定
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    /// サーバーエラーかどうか判定
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

impl From<StatusCode> for u16 {
    fn from(status: StatusCode) -> u16 {
        status.as_u16()
    }
}

/// HTTPメソッド
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Method {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::GET => write!(f, "GET"),
            Method::POST => write!(f, "POST"),
            Method::PUT => write!(f, "PUT"),
            Method::DELETE => write!(f, "DELETE"),
            Method::PATCH => write!(f, "PATCH"),
            Method::HEAD => write!(f, "HEAD"),
            Method::OPTIONS => write!(f, "OPTIONS"),
        }
    }
}

impl Method {
    /// 文字列からMethodに変換
    pub fn from_str(method: &str) -> Option<Self> {
        match method.to_uppercase().as_str() {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "PATCH" => Some(Method::PATCH),
            "HEAD" => Some(Method::HEAD),
            "OPTIONS" => Some(Method::OPTIONS),
            _ => None,
        }
    }
}

/// HTTPリクエスト
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTPメソッド
    pub method: Method,
    /// リクエストパス
    pub path: String,
    /// クエリパラメータ
    pub query_params: HashMap<String, String>,
    /// HTTPヘッダー（キーは小文字）
    pub headers: HashMap<String, String>,
    /// リクエストボディ
    pub body: Option<Vec<u8>>,
    /// 接続元アドレス
    pub remote_addr: Option<String>,
    /// パスパターンの名前付きキャプチャから得たパス変数
    pub path_params: HashMap<String, String>,
}

impl Request {
    /// 新しいリクエストを作成
    pub fn new(method: Method, path: String) -> Self {
        Self {
            method,
            path,
            query_params: HashMap::new(),
            headers: HashMap::new(),
            body: None,
            remote_addr: None,
            path_params: HashMap::new(),
        }
    }

    /// クエリパラメータを追加
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    /// ヘッダーを追加（キーは小文字化、不正な値は破棄）
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into().to_ascii_lowercase();
        let value = value.into();
        if is_header_value_valid(&value) {
            self.headers.insert(key, value);
        } else {
            warn!("Rejected header '{}' with invalid characters", key);
        }
        self
    }

    /// ボディを追加
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// 接続元アドレスを設定
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// ヘッダー値を取得（大文字小文字を区別しない）
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// クエリ文字列を再構築（キー順に整列）
    pub fn query_string(&self) -> String {
        let mut pairs: Vec<_> = self.query_params.iter().collect();
        pairs.sort();
        pairs
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// ボディをJSONとしてパース
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        match &self.body {
            Some(body) if !body.is_empty() => {
                serde_json::from_slice(body).map_err(|e| match null_required_field::<T>(body, &e) {
                    Some(field) => Error::not_readable(
                        format!("JSON parse error: {}", e),
                        Some(Cause::MissingField {
                            field,
                            message: e.to_string(),
                        }),
                    ),
                    None => body_parse_error(&e),
                })
            }
            _ => Err(Error::not_readable("Required request body is missing", None)),
        }
    }
}

/// serde_jsonのエラーを原因付きのボディ読み取りエラーに変換
pub(crate) fn body_parse_error(e: &serde_json::Error) -> Error {
    let message = e.to_string();
    let cause = match e.classify() {
        Category::Syntax | Category::Eof => Cause::Syntax(message.clone()),
        Category::Data => match missing_field_name(&message) {
            Some(field) => Cause::MissingField {
                field,
                message: message.clone(),
            },
            None => Cause::Other(message.clone()),
        },
        Category::Io => Cause::Other(message.clone()),
    };
    Error::not_readable(format!("JSON parse error: {}", message), Some(cause))
}

/// 必須フィールドに明示的な `null` が渡されていれば、そのフィールド名を返す
///
/// `null` のキーを取り除いて再度デシリアライズし、欠落として報告されたキーを対象とする。
fn null_required_field<T: DeserializeOwned>(body: &[u8], e: &serde_json::Error) -> Option<String> {
    if e.classify() != Category::Data || !e.to_string().starts_with("invalid type: null") {
        return None;
    }
    let object = match serde_json::from_slice::<Value>(body).ok()? {
        Value::Object(object) => object,
        _ => return None,
    };
    let null_keys: Vec<String> = object
        .iter()
        .filter(|(_, v)| v.is_null())
        .map(|(k, _)| k.clone())
        .collect();
    let without_nulls: Map<String, Value> = object.into_iter().filter(|(_, v)| !v.is_null()).collect();

    let retry = serde_json::from_value::<T>(Value::Object(without_nulls)).err()?;
    missing_field_name(&retry.to_string()).filter(|field| null_keys.contains(field))
}

fn missing_field_name(message: &str) -> Option<String> {
    static MISSING_FIELD: OnceLock<Option<Regex>> = OnceLock::new();
    MISSING_FIELD
        .get_or_init(|| Regex::new(r"^missing field `([^`]+)`").ok())
        .as_ref()
        .and_then(|re| re.captures(message))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// HTTPレスポンス
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTPステータスコード
    pub status: u16,
    /// HTTPヘッダー
    pub headers: HashMap<String, String>,
    /// レスポンスボディ
    pub body: Option<Vec<u8>>,
}

impl Response {
    /// 新しいレスポンスを作成
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// StatusCodeから新しいレスポンスを作成
    pub fn with_status(status: StatusCode) -> Self {
        Self::new(status.as_u16())
    }

    /// ヘッダーを追加
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// ボディを追加
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// JSONをボディとして設定
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(value)
            .map_err(|e| Error::Conversion(format!("Could not write JSON: {}", e)))?;

        self.headers.insert("Content-Type".to_string(), "application/json".to_string());
        self.body = Some(json);
        Ok(self)
    }

    /// 200 OKレスポンスを作成
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// 201 Createdレスポンスを作成
    pub fn created() -> Self {
        Self::new(201)
    }

    /// 204 No Contentレスポンスを作成
    pub fn no_content() -> Self {
        Self::new(204)
    }
}
