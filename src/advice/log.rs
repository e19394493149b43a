//! 失敗ログの出力先とリクエストの文字列化

use log::warn;

use crate::common::Request;

/// 失敗ログの出力先
#[cfg_attr(test, mockall::automock)]
pub trait ErrorLog: Send + Sync {
    /// 警告レベルで1行（または複数行）を出力する
    fn warn(&self, entry: &str);
}

/// `log` クレートの `warn!` に流すデフォルト実装
#[derive(Debug, Default, Clone, Copy)]
pub struct WarnLog;

impl ErrorLog for WarnLog {
    fn warn(&self, entry: &str) {
        warn!("{}", entry);
    }
}

const REDACTED: &str = "***redacted***";

/// ログ出力用のリクエスト情報
///
/// ハンドラはリクエストを消費するため、ディスパッチ前に取得しておく。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: String,
    pub path: String,
    pub query_string: String,
    /// ヘッダー名でソート済み
    pub headers: Vec<(String, Vec<String>)>,
}

impl RequestInfo {
    pub fn from_request(req: &Request) -> Self {
        let mut headers: Vec<(String, Vec<String>)> = req
            .headers
            .iter()
            .map(|(name, value)| {
                let values = value.split(", ").map(|v| v.to_string()).collect();
                (name.clone(), values)
            })
            .collect();
        headers.sort_by(|a, b| a.0.cmp(&b.0));

        Self {
            method: req.method.to_string(),
            path: req.path.clone(),
            query_string: req.query_string(),
            headers,
        }
    }

    /// `"METHOD path?query  name:values ..."` 形式に変換する
    ///
    /// クエリが空なら `?` は付けない。`multiline` の場合はヘッダーごとに改行する。
    /// 認証情報を含むヘッダーの値はマスクする。
    pub fn stringify(&self, multiline: bool) -> String {
        let separator = if multiline { "\n" } else { " " };
        let mut parts = Vec::with_capacity(self.headers.len() + 1);
        if self.query_string.trim().is_empty() {
            parts.push(format!("{} {} ", self.method, self.path));
        } else {
            parts.push(format!("{} {}?{} ", self.method, self.path, self.query_string));
        }
        for (name, values) in &self.headers {
            let rendered = if is_sensitive_header(name) {
                REDACTED.to_string()
            } else {
                values.join(", ")
            };
            parts.push(format!("{}:{}", name, rendered));
        }
        parts.join(separator)
    }
}

impl From<&Request> for RequestInfo {
    fn from(req: &Request) -> Self {
        Self::from_request(req)
    }
}

fn is_sensitive_header(lower_name: &str) -> bool {
    ["authorization", "cookie", "token", "secret", "password", "api-key"]
        .iter()
        .any(|p| lower_name.contains(p))
}
