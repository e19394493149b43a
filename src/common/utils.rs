//! 共通ユーティリティ関数群（URLデコード、クエリ解析、環境設定 等）

use std::collections::HashMap;
use std::env;

/// URLエンコーディングのデコード関数
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (from_hex(bytes[i + 1]), from_hex(bytes[i + 2])) {
                result.push(h * 16 + l);
                i += 3;
                continue;
            }
        } else if bytes[i] == b'+' {
            result.push(b' ');
            i += 1;
            continue;
        }
        result.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&result).into_owned()
}

/// 16進数文字をバイト値に変換するヘルパー関数
fn from_hex(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// クエリ文字列をパースしてURLデコードを行う共通関数
pub fn parse_query_string(query_string: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    if query_string.is_empty() {
        return params;
    }

    for pair in query_string.split('&') {
        let mut parts = pair.splitn(2, '=');
        if let Some(key) = parts.next() {
            if key.is_empty() {
                continue;
            }
            let value = parts.next().unwrap_or("");
            params.insert(percent_decode(key), percent_decode(value));
        }
    }

    params
}

/// リクエストボディの最大サイズ（バイト）を取得する
/// 優先順位: 環境変数 `FAULTBRIDGE_MAX_BODY_SIZE` -> デフォルト 5MB
pub fn get_max_body_size() -> usize {
    const DEFAULT_MAX_SIZE: usize = 5 * 1024 * 1024; // 5MB
    env::var("FAULTBRIDGE_MAX_BODY_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_MAX_SIZE)
}

/// エラーログのリクエスト表記を複数行にするか
/// 環境変数 `FAULTBRIDGE_ERROR_LOG_MULTILINE` が `1` / `true` のとき有効
pub fn error_log_multiline() -> bool {
    env::var("FAULTBRIDGE_ERROR_LOG_MULTILINE")
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true"))
        .unwrap_or(false)
}

/// ヘッダー値に使用可能な文字かを判定（CRLF・制御文字を拒否）
pub fn is_header_value_valid(value: &str) -> bool {
    // 制御文字(0x00-0x1F, 0x7F)およびCR/LFを拒否する。HTABは許容
    value.chars().all(|c| {
        let code = c as u32;
        c == '\t' || (code >= 0x20 && code != 0x7F)
    })
}
