use std::collections::HashMap;

use log::warn;
use regex::Regex;

use crate::error::Error;

/// パターンの安全性を確保（アンカーの確認と追加）
pub fn ensure_safe_pattern(pattern: &str) -> Result<String, Error> {
    if pattern.is_empty() {
        return Err(Error::Configuration("Empty regex pattern is not allowed".to_string()));
    }

    let has_start_anchor = pattern.starts_with('^');
    let has_end_anchor = pattern.ends_with('$');

    if !has_start_anchor || !has_end_anchor {
        let safe_pattern = format!(
            "^{}$",
            pattern.trim_start_matches('^').trim_end_matches('$')
        );
        warn!(
            "Pattern '{}' lacks proper anchors, converted to '{}' for security",
            pattern,
            safe_pattern
        );
        Ok(safe_pattern)
    } else {
        Ok(pattern.to_string())
    }
}

/// アンカー付きのパターンをコンパイル
pub fn compile_pattern(pattern: &str) -> Result<Regex, Error> {
    let safe_pattern = ensure_safe_pattern(pattern)?;
    Regex::new(&safe_pattern)
        .map_err(|e| Error::Configuration(format!("invalid route pattern '{}': {}", pattern, e)))
}

/// 名前付きキャプチャをパス変数として取り出す
pub fn capture_path_params(regex: &Regex, path: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    if let Some(caps) = regex.captures(path) {
        for name in regex.capture_names().flatten() {
            if let Some(m) = caps.name(name) {
                params.insert(name.to_string(), m.as_str().to_string());
            }
        }
    }
    params
}
